//! Host context and the file-descriptor bridge.
//!
//! The host owns the platform context needed to turn content-provider URIs
//! into readable descriptors. It injects a [`ContentResolver`] when it builds
//! the bridge; nothing here is global.

use std::fs::File;
use std::sync::Arc;

use tracing::warn;

use crate::error::{Error, Result};

/// Resolves content-provider URIs (`content://...`) into open files.
///
/// Implemented by the host platform layer. Tests substitute in-memory
/// resolvers backed by temp files.
pub trait ContentResolver: Send + Sync {
    /// Open `uri` for reading.
    fn open(&self, uri: &str) -> std::io::Result<File>;
}

/// Platform context handed to the bridge at construction.
#[derive(Clone, Default)]
pub struct HostContext {
    resolver: Option<Arc<dyn ContentResolver>>,
}

impl HostContext {
    /// A context with a content resolver.
    pub fn new(resolver: Arc<dyn ContentResolver>) -> Self {
        Self {
            resolver: Some(resolver),
        }
    }

    /// A context that cannot resolve content URIs (desktop hosts, CLI).
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    /// Resolve a content URI into an open file.
    pub fn resolve(&self, uri: &str) -> Result<File> {
        let resolver = self
            .resolver
            .as_ref()
            .ok_or_else(|| Error::NoContentResolver(uri.to_string()))?;
        Ok(resolver.open(uri)?)
    }

    /// Like [`resolve`](Self::resolve), but failures are logged and folded
    /// into `None`.
    pub fn open_file_descriptor(&self, uri: &str) -> Option<File> {
        match self.resolve(uri) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(target: "media_bridge::host", uri, error = %e, "Failed to open file descriptor");
                None
            }
        }
    }

    /// Open `uri` and detach the raw descriptor for native callers.
    ///
    /// Ownership moves to the caller, who must close it. Returns `-1` on
    /// failure.
    #[cfg(unix)]
    pub fn open_raw_fd(&self, uri: &str) -> i32 {
        use std::os::fd::IntoRawFd;

        self.open_file_descriptor(uri)
            .map(IntoRawFd::into_raw_fd)
            .unwrap_or(-1)
    }
}

impl std::fmt::Debug for HostContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostContext")
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}
