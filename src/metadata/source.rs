//! Tag sources.
//!
//! [`TagSource`] is the seam between extraction logic and the tag reader.
//! [`LoftySource`] is the production implementation; it owns the parsed file
//! and any handle used to read it, which are released when it is dropped.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use lofty::file::{AudioFile, FileType, TaggedFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::properties::FileProperties;
use lofty::tag::{Accessor, ItemKey, Tag};

use super::MetadataKey;
use crate::cover::{CoverArt, select_picture};
use crate::error::{Error, Result};

/// Something that can answer tag reads for one resource.
pub trait TagSource: Send + Sync {
    /// Read one key. `Ok(None)` means the key is simply not present.
    fn read_key(&self, key: MetadataKey) -> Result<Option<String>>;

    /// The embedded cover image, if any.
    fn embedded_picture(&self) -> Option<CoverArt>;
}

/// Tag source backed by a lofty-parsed file.
pub struct LoftySource {
    file: TaggedFile,
}

impl LoftySource {
    /// Open and parse a local file.
    pub fn open_path(path: &Path) -> Result<Self> {
        let probe = Probe::open(path)
            .map_err(|e| Error::metadata(path, e.to_string()))?
            .guess_file_type()?;
        let file = probe.read().map_err(|e| Error::metadata(path, e.to_string()))?;
        Ok(Self { file })
    }

    /// Parse an already-open file, e.g. one resolved from a content URI.
    pub fn from_file(file: File, origin: &str) -> Result<Self> {
        Self::from_reader(BufReader::new(file), origin)
    }

    /// Parse an in-memory stream.
    pub fn from_bytes(bytes: Vec<u8>, origin: &str) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes), origin)
    }

    fn from_reader<R: Read + Seek>(reader: R, origin: &str) -> Result<Self> {
        let file = Probe::new(reader)
            .guess_file_type()?
            .read()
            .map_err(|e| Error::metadata(PathBuf::from(origin), e.to_string()))?;
        Ok(Self { file })
    }

    /// Audio properties read from the container.
    pub fn properties(&self) -> &FileProperties {
        self.file.properties()
    }

    /// Primary tag, or the first available one.
    fn tag(&self) -> Option<&Tag> {
        self.file.primary_tag().or_else(|| self.file.first_tag())
    }

    fn text(&self, key: ItemKey) -> Option<String> {
        self.tag()
            .and_then(|t| t.get_string(&key))
            .map(str::to_string)
    }
}

impl TagSource for LoftySource {
    fn read_key(&self, key: MetadataKey) -> Result<Option<String>> {
        let properties = self.file.properties();
        let value = match key {
            MetadataKey::Title => self.text(ItemKey::TrackTitle),
            MetadataKey::Artist => self.text(ItemKey::TrackArtist),
            MetadataKey::Album => self.text(ItemKey::AlbumTitle),
            MetadataKey::AlbumArtist => self.text(ItemKey::AlbumArtist),
            MetadataKey::TrackNumber => self.text(ItemKey::TrackNumber),
            MetadataKey::TrackTotal => self.text(ItemKey::TrackTotal),
            MetadataKey::DiscNumber => self.text(ItemKey::DiscNumber),
            MetadataKey::Year => self.tag().and_then(|t| t.year()).map(|y| y.to_string()),
            MetadataKey::Date => self.text(ItemKey::RecordingDate),
            MetadataKey::Genre => self.text(ItemKey::Genre),
            MetadataKey::Author => self.text(ItemKey::Composer),
            MetadataKey::Writer => self
                .text(ItemKey::Writer)
                .or_else(|| self.text(ItemKey::Lyricist)),
            MetadataKey::MimeType => mime_type(self.file.file_type()).map(str::to_string),
            MetadataKey::Duration => {
                let ms = properties.duration().as_millis();
                (ms > 0).then(|| ms.to_string())
            }
            MetadataKey::Bitrate => properties
                .overall_bitrate()
                .or_else(|| properties.audio_bitrate())
                .map(|kbps| (u64::from(kbps) * 1000).to_string()),
        };
        Ok(value)
    }

    fn embedded_picture(&self) -> Option<CoverArt> {
        self.tag().and_then(select_picture)
    }
}

/// Container MIME type for a lofty file type.
fn mime_type(file_type: FileType) -> Option<&'static str> {
    let mime = match file_type {
        FileType::Aac => "audio/aac",
        FileType::Aiff => "audio/aiff",
        FileType::Ape => "audio/ape",
        FileType::Flac => "audio/flac",
        FileType::Mpeg => "audio/mpeg",
        FileType::Mp4 => "audio/mp4",
        FileType::Mpc => "audio/musepack",
        FileType::Opus => "audio/opus",
        FileType::Vorbis => "audio/ogg",
        FileType::Speex => "audio/speex",
        FileType::Wav => "audio/wav",
        FileType::WavPack => "audio/wavpack",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{tagged_wav, write_silent_wav};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_open_non_audio_file_returns_error() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "This is just some text, not music.").expect("Failed to write");
        assert!(LoftySource::open_path(file.path()).is_err());
    }

    #[test]
    fn test_open_non_existent_file_returns_error() {
        assert!(LoftySource::open_path(Path::new("non_existent_file.mp3")).is_err());
    }

    #[test]
    fn test_untagged_wav_reads_properties_only() {
        let dir = TempDir::new().unwrap();
        let path = write_silent_wav(dir.path(), "plain.wav");
        let source = LoftySource::open_path(&path).unwrap();

        assert_eq!(source.read_key(MetadataKey::Title).unwrap(), None);
        assert_eq!(
            source.read_key(MetadataKey::MimeType).unwrap().as_deref(),
            Some("audio/wav")
        );
        assert!(source.read_key(MetadataKey::Duration).unwrap().is_some());
        assert!(source.embedded_picture().is_none());
    }

    #[test]
    fn test_wav_without_extension_is_sniffed() {
        let dir = TempDir::new().unwrap();
        let path = write_silent_wav(dir.path(), "no_extension");
        assert!(LoftySource::open_path(&path).is_ok());
    }

    #[test]
    fn test_writer_falls_back_to_lyricist() {
        let dir = TempDir::new().unwrap();
        let path = tagged_wav(dir.path(), "lyrics.wav", |tag| {
            tag.insert_text(ItemKey::Lyricist, "Penned By".to_string());
        });
        let source = LoftySource::open_path(&path).unwrap();
        assert_eq!(
            source.read_key(MetadataKey::Writer).unwrap().as_deref(),
            Some("Penned By")
        );
    }

    #[test]
    fn test_from_file_reads_resolved_handle() {
        let dir = TempDir::new().unwrap();
        let path = tagged_wav(dir.path(), "resolved.wav", |tag| {
            tag.set_album("Handles".to_string());
        });
        let file = File::open(&path).unwrap();
        let source = LoftySource::from_file(file, "content://media/1").unwrap();
        assert_eq!(
            source.read_key(MetadataKey::Album).unwrap().as_deref(),
            Some("Handles")
        );
    }
}
