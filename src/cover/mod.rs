//! Cover art derivation.
//!
//! Every track maps to one cover file named after its track, album and album
//! artist:
//!
//! ```text
//! <directory>/<sanitize(track + album + album_artist)>.PNG
//! ```
//!
//! Tracks sharing all three strings share a cover file. The name is derived
//! even when the resource has no embedded image; only the write is skipped.

mod cache;
mod embedded;

pub use cache::{CoverStore, default_directory};
pub use embedded::select_picture;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::locator::MediaLocator;
use crate::metadata::{MetadataRecord, TagSource};

/// Placeholder album name for cover file naming.
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
/// Placeholder album artist for cover file naming.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Characters stripped from cover file names.
pub const UNSAFE_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|', ' '];

/// Embedded image data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    /// Raw image data (JPEG, PNG, ...)
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Remove path-unsafe characters and spaces.
pub fn sanitize(name: &str) -> String {
    name.chars().filter(|c| !UNSAFE_CHARS.contains(c)).collect()
}

/// Track name used for naming, falling back to the locator's file name.
pub fn track_name(locator: &MediaLocator, record: &MetadataRecord) -> String {
    record
        .track_name
        .clone()
        .unwrap_or_else(|| locator.display_name())
}

/// Cover file name (with `.PNG` extension) for a track.
pub fn cover_file_name(locator: &MediaLocator, record: &MetadataRecord) -> String {
    let album = record.album_name.as_deref().unwrap_or(UNKNOWN_ALBUM);
    let album_artist = record.album_artist_name.as_deref().unwrap_or(UNKNOWN_ARTIST);
    format!(
        "{}.PNG",
        sanitize(&format!("{}{}{}", track_name(locator, record), album, album_artist))
    )
}

/// Write the resource's embedded image to its cover file.
///
/// Returns the written path, or `None` when the resource has no embedded
/// image.
pub fn derive_cover_art<S: TagSource + ?Sized>(
    locator: &MediaLocator,
    record: &MetadataRecord,
    directory: &Path,
    source: &S,
) -> Result<Option<PathBuf>> {
    let store = CoverStore::new(directory);
    let path = store.path_for(locator, record);
    debug!(target: "media_bridge::cover", path = %path.display(), "Cover path");

    let Some(cover) = source.embedded_picture() else {
        return Ok(None);
    };
    store.save(&path, &cover)?;
    debug!(target: "media_bridge::cover", mime = %cover.mime_type, len = cover.data.len(), "Wrote cover");
    Ok(Some(path))
}
