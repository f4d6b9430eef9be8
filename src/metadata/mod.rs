//! Audio/video metadata extraction.
//!
//! Extraction reads a fixed key [`SCHEMA`] from a [`TagSource`], one key at
//! a time. A failing key becomes an absent field and never aborts the rest of
//! the read. The raw values are then normalized into a [`MetadataRecord`]:
//!
//! - `"N/M"` track numbers are split into `trackNumber` and `albumLength`
//! - `year` falls back to the first segment of the date tag
//! - `"N/M"` disc numbers keep only `N`
//!
//! A resource that cannot be opened at all still produces a record holding
//! only its locator. See [`Extractor::extract`].

mod remote;
mod source;

pub use remote::{HttpFetcher, RemoteFetcher};
pub use source::{LoftySource, TagSource};

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::host::HostContext;
use crate::locator::{MediaLocator, Scheme};

/// Tag keys read from every resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetadataKey {
    Title,
    Artist,
    Album,
    AlbumArtist,
    TrackNumber,
    TrackTotal,
    DiscNumber,
    Year,
    Date,
    Genre,
    Author,
    Writer,
    MimeType,
    /// Milliseconds
    Duration,
    /// Bits per second
    Bitrate,
}

/// Every key, in read order.
pub const SCHEMA: &[MetadataKey] = &[
    MetadataKey::TrackNumber,
    MetadataKey::Album,
    MetadataKey::Artist,
    MetadataKey::Author,
    MetadataKey::Date,
    MetadataKey::Genre,
    MetadataKey::Title,
    MetadataKey::Year,
    MetadataKey::Duration,
    MetadataKey::TrackTotal,
    MetadataKey::Writer,
    MetadataKey::MimeType,
    MetadataKey::AlbumArtist,
    MetadataKey::DiscNumber,
    MetadataKey::Bitrate,
];

impl MetadataKey {
    pub fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Artist => "artist",
            Self::Album => "album",
            Self::AlbumArtist => "album_artist",
            Self::TrackNumber => "track_number",
            Self::TrackTotal => "track_total",
            Self::DiscNumber => "disc_number",
            Self::Year => "year",
            Self::Date => "date",
            Self::Genre => "genre",
            Self::Author => "author",
            Self::Writer => "writer",
            Self::MimeType => "mime_type",
            Self::Duration => "duration",
            Self::Bitrate => "bitrate",
        }
    }
}

/// Raw values as read from a source, before normalization.
pub type RawTags = BTreeMap<MetadataKey, String>;

/// Read one key, folding failures and blank values into `None`.
pub fn try_read<S: TagSource + ?Sized>(source: &S, key: MetadataKey) -> Option<String> {
    match source.read_key(key) {
        Ok(Some(value)) if !value.trim().is_empty() => Some(value),
        Ok(_) => None,
        Err(e) => {
            debug!(target: "media_bridge::metadata", key = key.name(), error = %e, "Key unreadable");
            None
        }
    }
}

/// Read every key in [`SCHEMA`].
pub fn read_raw<S: TagSource + ?Sized>(source: &S) -> RawTags {
    let raw: RawTags = SCHEMA
        .iter()
        .filter_map(|&key| try_read(source, key).map(|value| (key, value)))
        .collect();
    debug!(target: "media_bridge::metadata", ?raw, "Raw tags");
    raw
}

/// Descriptive metadata delivered across the channel.
///
/// Every field is optional. Absent fields are omitted from the serialized
/// mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_artist_names: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_artist_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disc_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_length: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Bits per second
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
}

impl MetadataRecord {
    /// A record carrying only the locator, for resources that could not be
    /// opened.
    pub fn degraded(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Default::default()
        }
    }

    /// True when no field other than `uri` is present.
    pub fn is_degraded(&self) -> bool {
        Self {
            uri: self.uri.clone(),
            ..Default::default()
        } == *self
    }

    /// Normalize raw tag values into a record.
    pub fn from_raw(uri: impl Into<String>, mut raw: RawTags) -> Self {
        let mut take = |key: MetadataKey| raw.remove(&key);

        let (track_number, album_length) = split_track_number(
            take(MetadataKey::TrackNumber).as_deref(),
            take(MetadataKey::TrackTotal),
        );
        let year = derive_year(
            take(MetadataKey::Year).as_deref(),
            take(MetadataKey::Date).as_deref(),
        );
        let disc_number = take(MetadataKey::DiscNumber)
            .as_deref()
            .and_then(first_slash_segment);

        Self {
            uri: Some(uri.into()),
            track_name: take(MetadataKey::Title),
            track_artist_names: take(MetadataKey::Artist),
            album_name: take(MetadataKey::Album),
            album_artist_name: take(MetadataKey::AlbumArtist),
            track_number,
            disc_number,
            album_length,
            year,
            genre: take(MetadataKey::Genre),
            author_name: take(MetadataKey::Author),
            writer_name: take(MetadataKey::Writer),
            mime_type: take(MetadataKey::MimeType),
            duration: take(MetadataKey::Duration).and_then(|v| v.trim().parse().ok()),
            bitrate: take(MetadataKey::Bitrate).and_then(|v| v.trim().parse().ok()),
        }
    }

    /// Read and normalize every key from an opened source.
    pub fn read_from<S: TagSource + ?Sized>(uri: impl Into<String>, source: &S) -> Self {
        Self::from_raw(uri, read_raw(source))
    }

    /// The outbound channel payload.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::Value::Object(Default::default()))
    }
}

/// Split an `"N/M"` track number.
///
/// Returns `(track_number, album_length)`. An album length that was read
/// separately always wins over the `M` segment.
pub fn split_track_number(
    track: Option<&str>,
    album_length: Option<String>,
) -> (Option<String>, Option<String>) {
    let Some(track) = track else {
        return (None, album_length);
    };
    let mut segments = track.split('/');
    let number = segments.next().and_then(non_empty_trimmed);
    let total = match album_length {
        Some(length) => Some(length),
        None => segments.next().and_then(non_empty_trimmed),
    };
    (number, total)
}

/// Prefer the year tag, else the first `.`/`-`/`/`-separated segment of the
/// date tag.
pub fn derive_year(year: Option<&str>, date: Option<&str>) -> Option<String> {
    year.and_then(non_empty_trimmed).or_else(|| {
        date.and_then(|d| d.split(['.', '-', '/']).next())
            .and_then(non_empty_trimmed)
    })
}

fn first_slash_segment(value: &str) -> Option<String> {
    value.split('/').next().and_then(non_empty_trimmed)
}

fn non_empty_trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Opens resources by scheme and reads their metadata.
///
/// Cheap to clone; every call opens its own source.
#[derive(Clone)]
pub struct Extractor {
    host: HostContext,
    remote: Arc<dyn RemoteFetcher>,
}

impl Extractor {
    pub fn new(host: HostContext, remote: Arc<dyn RemoteFetcher>) -> Self {
        Self { host, remote }
    }

    /// Open a resource using the strategy its scheme allows.
    pub async fn open(&self, locator: &MediaLocator) -> Result<LoftySource> {
        match locator.scheme() {
            Scheme::Local(path) => {
                let path = path.clone();
                blocking(move || LoftySource::open_path(&path)).await
            }
            Scheme::Content => {
                let host = self.host.clone();
                let origin = locator.as_str().to_string();
                blocking(move || {
                    let file = host.resolve(&origin)?;
                    LoftySource::from_file(file, &origin)
                })
                .await
            }
            Scheme::Remote | Scheme::Other => {
                let bytes = self.remote.fetch(locator.as_str()).await?;
                let origin = locator.as_str().to_string();
                blocking(move || LoftySource::from_bytes(bytes, &origin)).await
            }
        }
    }

    /// Extract metadata for `locator`.
    ///
    /// Never fails: an unopenable resource yields
    /// [`MetadataRecord::degraded`].
    pub async fn extract(&self, locator: &MediaLocator) -> MetadataRecord {
        match self.open(locator).await {
            Ok(source) => MetadataRecord::read_from(locator.as_str(), &source),
            Err(e) => {
                warn!(target: "media_bridge::metadata", uri = %locator, error = %e, "Failed to open resource");
                MetadataRecord::degraded(locator.as_str())
            }
        }
    }

    /// [`extract`](Self::extract) for a raw URI string.
    pub async fn extract_uri(&self, uri: &str) -> MetadataRecord {
        match MediaLocator::parse(uri) {
            Ok(locator) => self.extract(&locator).await,
            Err(e) => {
                warn!(target: "media_bridge::metadata", uri, error = %e, "Invalid locator");
                MetadataRecord::degraded(uri)
            }
        }
    }
}

/// Run blocking parse work off the async executor.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Io(std::io::Error::other(format!("worker task failed: {e}"))))?
}
