//! Media Bridge - native side of a media player's platform channel.
//!
//! The host application calls into the bridge over named asynchronous
//! channels. The bridge extracts descriptive metadata from local files,
//! content URIs and remote streams, writes embedded cover art to a cache
//! directory, inspects the technical format of local files and loads the
//! native decoding libraries once per process.
//!
//! Entry points:
//! - [`channel::MetadataRetriever`]: the `metadata` and `format` methods
//! - [`metadata::Extractor`]: metadata extraction without the channel
//! - [`native::bootstrap`]: one-time native library load

pub mod channel;
pub mod cli;
pub mod config;
pub mod cover;
pub mod error;
pub mod format;
pub mod host;
pub mod locator;
pub mod metadata;
pub mod native;
#[cfg(test)]
pub mod test_utils;

pub use error::{Error, Result};
