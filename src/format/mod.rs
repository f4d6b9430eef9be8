//! Technical format inspection for local files.
//!
//! Reads the first track's codec parameters with symphonia. Fields the
//! container does not expose fall back to other sources:
//!
//! - channel count, sample rate, bitrate: the generic metadata reader
//!   (lofty properties)
//! - extension: the locator's own path extension, upper-cased
//!
//! Non-`file://` locators are not inspected at all.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};
use symphonia::core::codecs::{
    CODEC_TYPE_AAC, CODEC_TYPE_ALAC, CODEC_TYPE_FLAC, CODEC_TYPE_MP1, CODEC_TYPE_MP2,
    CODEC_TYPE_MP3, CODEC_TYPE_OPUS, CODEC_TYPE_PCM_F32LE, CODEC_TYPE_PCM_F64LE,
    CODEC_TYPE_PCM_S16BE, CODEC_TYPE_PCM_S16LE, CODEC_TYPE_PCM_S24LE, CODEC_TYPE_PCM_S32LE,
    CODEC_TYPE_PCM_U8, CODEC_TYPE_VORBIS, CodecParameters, CodecType,
};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::locator::MediaLocator;
use crate::metadata::{LoftySource, MetadataKey, TagSource};

/// Technical properties of a file's first track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_count: Option<u32>,
    /// Bits per second
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

impl FormatRecord {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The outbound channel payload.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::Value::Object(Default::default()))
    }
}

/// Inspect a local file. Blocking.
///
/// Returns an empty record for non-local locators without touching the
/// filesystem.
pub fn inspect_format(locator: &MediaLocator) -> FormatRecord {
    let Some(path) = locator.local_path() else {
        return FormatRecord::default();
    };

    let mut record = match probe_first_track(path) {
        Ok(record) => record,
        Err(e) => {
            warn!(target: "media_bridge::format", path = %path.display(), error = %e, "Container probe failed");
            FormatRecord::default()
        }
    };

    fill_from_tag_reader(path, &mut record);
    if record.extension.is_none() {
        record.extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_uppercase);
    }
    record
}

fn probe_first_track(path: &Path) -> Result<FormatRecord> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(&ext.to_string_lossy());
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::metadata(path, e.to_string()))?;

    let track = probed
        .format
        .tracks()
        .first()
        .ok_or_else(|| Error::metadata(path, "no tracks"))?;
    let params = &track.codec_params;
    debug!(target: "media_bridge::format", path = %path.display(), codec = ?params.codec, "First track");

    let extension = codec_mime_type(params.codec).and_then(extension_for_mime);
    Ok(FormatRecord {
        channel_count: params.channels.map(|c| c.count() as u32),
        bitrate: pcm_bitrate(params),
        sample_rate: params.sample_rate,
        extension,
    })
}

const PCM_CODECS: &[CodecType] = &[
    CODEC_TYPE_PCM_U8,
    CODEC_TYPE_PCM_S16LE,
    CODEC_TYPE_PCM_S16BE,
    CODEC_TYPE_PCM_S24LE,
    CODEC_TYPE_PCM_S32LE,
    CODEC_TYPE_PCM_F32LE,
    CODEC_TYPE_PCM_F64LE,
];

fn is_pcm(codec: CodecType) -> bool {
    PCM_CODECS.contains(&codec)
}

/// Bitrate of uncompressed PCM, from its codec parameters.
fn pcm_bitrate(params: &CodecParameters) -> Option<u64> {
    if !is_pcm(params.codec) {
        return None;
    }
    let sample_rate = u64::from(params.sample_rate?);
    let channels = params.channels?.count() as u64;
    let bits = u64::from(params.bits_per_sample?);
    Some(sample_rate * channels * bits)
}

/// Fill fields the container probe left empty from lofty's properties.
fn fill_from_tag_reader(path: &Path, record: &mut FormatRecord) {
    if record.channel_count.is_some() && record.sample_rate.is_some() && record.bitrate.is_some() {
        return;
    }
    let Ok(source) = LoftySource::open_path(path) else {
        return;
    };
    let properties = source.properties();
    record.channel_count = record
        .channel_count
        .or_else(|| properties.channels().map(u32::from));
    record.sample_rate = record.sample_rate.or_else(|| properties.sample_rate());
    if record.bitrate.is_none() {
        record.bitrate = source
            .read_key(MetadataKey::Bitrate)
            .ok()
            .flatten()
            .and_then(|b| b.parse().ok());
    }
}

fn codec_mime_type(codec: CodecType) -> Option<&'static str> {
    let mime = match codec {
        CODEC_TYPE_MP3 | CODEC_TYPE_MP2 | CODEC_TYPE_MP1 => "audio/mpeg",
        CODEC_TYPE_FLAC => "audio/flac",
        CODEC_TYPE_VORBIS => "audio/ogg",
        CODEC_TYPE_OPUS => "audio/opus",
        CODEC_TYPE_AAC => "audio/aac",
        CODEC_TYPE_ALAC => "audio/mp4",
        c if is_pcm(c) => "audio/wav",
        _ => return None,
    };
    Some(mime)
}

/// File extension for a MIME type.
///
/// `mime_guess` lists several extensions for some types; prefer the one
/// named like the subtype, or the conventional one for MPEG audio.
pub fn extension_for_mime(mime: &str) -> Option<String> {
    let mime = mime.to_ascii_lowercase();
    match mime.as_str() {
        "audio/mpeg" => return Some("mp3".to_string()),
        "audio/mp4" => return Some("m4a".to_string()),
        _ => {}
    }
    let candidates = mime_guess::get_mime_extensions_str(&mime)?;
    let subtype = mime.split('/').nth(1).unwrap_or_default();
    candidates
        .iter()
        .find(|ext| **ext == subtype)
        .or_else(|| candidates.first())
        .map(|ext| ext.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::write_silent_wav;
    use tempfile::TempDir;

    #[test]
    fn test_non_file_locator_is_empty() {
        for raw in [
            "https://example.com/a.mp3",
            "content://media/external/audio/1",
            "rtsp://camera/stream",
        ] {
            let locator = MediaLocator::parse(raw).unwrap();
            assert!(inspect_format(&locator).is_empty(), "{raw}");
        }
    }

    #[test]
    fn test_inspect_wav() {
        let dir = TempDir::new().unwrap();
        let path = write_silent_wav(dir.path(), "tone.wav");
        let locator = MediaLocator::parse(format!("file://{}", path.display())).unwrap();

        let record = inspect_format(&locator);
        assert_eq!(record.channel_count, Some(1));
        assert_eq!(record.sample_rate, Some(8000));
        assert_eq!(record.bitrate, Some(128_000));
        assert!(
            record
                .extension
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
        );
    }

    #[test]
    fn test_unreadable_file_falls_back_to_path_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.flac");
        std::fs::write(&path, b"not really flac").unwrap();
        let locator = MediaLocator::parse(format!("file://{}", path.display())).unwrap();

        let record = inspect_format(&locator);
        assert_eq!(record.extension.as_deref(), Some("FLAC"));
        assert_eq!(record.channel_count, None);
        assert_eq!(record.bitrate, None);
    }

    #[test]
    fn test_tag_reader_fills_missing_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_silent_wav(dir.path(), "fallback.wav");

        let mut record = FormatRecord::default();
        fill_from_tag_reader(&path, &mut record);
        assert_eq!(record.channel_count, Some(1));
        assert_eq!(record.sample_rate, Some(8000));
        assert!(record.bitrate.is_some());
    }

    #[test]
    fn test_tag_reader_keeps_probed_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_silent_wav(dir.path(), "probed.wav");

        let mut record = FormatRecord {
            channel_count: Some(2),
            bitrate: Some(1),
            ..Default::default()
        };
        fill_from_tag_reader(&path, &mut record);
        assert_eq!(record.channel_count, Some(2));
        assert_eq!(record.bitrate, Some(1));
        assert_eq!(record.sample_rate, Some(8000));
    }

    #[test]
    fn test_missing_file_without_extension_is_empty() {
        let locator = MediaLocator::parse("file:///no/such/file").unwrap();
        assert!(inspect_format(&locator).is_empty());
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("audio/mpeg").as_deref(), Some("mp3"));
        assert_eq!(extension_for_mime("AUDIO/MP4").as_deref(), Some("m4a"));
        assert_eq!(extension_for_mime("application/x-not-a-type"), None);
    }

    #[test]
    fn test_serialized_keys() {
        let record = FormatRecord {
            channel_count: Some(2),
            sample_rate: Some(44_100),
            ..Default::default()
        };
        let value = record.to_value();
        assert_eq!(value["channelCount"], 2);
        assert_eq!(value["sampleRate"], 44_100);
        assert!(value.get("bitrate").is_none());
    }
}
