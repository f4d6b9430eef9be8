//! On-disk cover store.
//!
//! A flat directory of cover files keyed by derived file name. The directory
//! is only created once there is something to write.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{CoverArt, cover_file_name};
use crate::error::{Result, ResultExt};
use crate::locator::MediaLocator;
use crate::metadata::MetadataRecord;

/// Cover art directory.
pub struct CoverStore {
    directory: PathBuf,
}

impl CoverStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Path of the cover file for a track.
    pub fn path_for(&self, locator: &MediaLocator, record: &MetadataRecord) -> PathBuf {
        self.directory.join(cover_file_name(locator, record))
    }

    /// Write `cover` to `path`, replacing any previous content.
    ///
    /// The data is synced to storage before returning.
    pub fn save(&self, path: &Path, cover: &CoverArt) -> Result<()> {
        fs::create_dir_all(&self.directory)
            .with_context(format!("creating {}", self.directory.display()))?;
        let mut file = File::create(path).with_context(format!("creating {}", path.display()))?;
        file.write_all(&cover.data)
            .with_context(format!("writing {}", path.display()))?;
        file.sync_all()
            .with_context(format!("syncing {}", path.display()))?;
        Ok(())
    }
}

/// `<cache dir>/media-bridge/covers`
pub fn default_directory() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("media-bridge")
        .join("covers")
}
