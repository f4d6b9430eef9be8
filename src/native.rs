//! Native library bootstrap.
//!
//! The decoding library and its helper are loaded into the process once.
//! A library that fails to load is logged and skipped; native calls that
//! need it fail individually later.

use std::sync::OnceLock;

use libloading::Library;
use tracing::{info, warn};

use crate::error::Error;

static NATIVE: OnceLock<NativeLibraries> = OnceLock::new();

/// Libraries loaded (or not) by one bootstrap.
#[derive(Debug, Default)]
pub struct NativeLibraries {
    loaded: Vec<(String, Library)>,
    failures: Vec<Error>,
}

impl NativeLibraries {
    /// Load each library by base name, in order.
    ///
    /// Base names map to platform file names (`mpv` -> `libmpv.so`,
    /// `mpv.dll`, `libmpv.dylib`).
    pub fn load<S: AsRef<str>>(names: &[S]) -> Self {
        let mut libraries = Self::default();
        for name in names {
            let name = name.as_ref();
            let file_name = libloading::library_filename(name);
            // SAFETY: loading runs the library's initializers. The configured
            // libraries are the host's own bundled decoders.
            match unsafe { Library::new(&file_name) } {
                Ok(library) => {
                    info!(target: "media_bridge::native", library = name, "Loaded native library");
                    libraries.loaded.push((name.to_string(), library));
                }
                Err(e) => {
                    warn!(target: "media_bridge::native", library = name, error = %e, "Failed to load native library");
                    libraries.failures.push(Error::Library {
                        name: name.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
        libraries
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.iter().any(|(n, _)| n == name)
    }

    pub fn loaded_names(&self) -> impl Iterator<Item = &str> {
        self.loaded.iter().map(|(n, _)| n.as_str())
    }

    pub fn failures(&self) -> &[Error] {
        &self.failures
    }
}

/// Process-wide one-time load.
///
/// Only the first call loads anything; later calls return the same result
/// regardless of `names`.
pub fn bootstrap<S: AsRef<str>>(names: &[S]) -> &'static NativeLibraries {
    NATIVE.get_or_init(|| NativeLibraries::load(names))
}
