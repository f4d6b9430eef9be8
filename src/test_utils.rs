//! Test fixtures shared across modules.
//!
//! - [`FakeSource`]: a scripted [`TagSource`] for exercising record assembly
//! - [`MockFetcher`]: a [`RemoteFetcher`] that never touches the network
//! - [`write_silent_wav`] / [`tagged_wav`]: real audio files on disk

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lofty::config::WriteOptions;
use lofty::tag::{Tag, TagExt, TagType};

use crate::cover::CoverArt;
use crate::error::{Error, Result};
use crate::metadata::{MetadataKey, RemoteFetcher, TagSource};

/// Sample rate of generated WAV fixtures.
pub const WAV_SAMPLE_RATE: u32 = 8000;

/// A tag source with fixed answers.
///
/// ```ignore
/// let source = FakeSource::default()
///     .with(MetadataKey::Title, "Song")
///     .failing(MetadataKey::Album);
/// ```
#[derive(Debug, Default)]
pub struct FakeSource {
    values: HashMap<MetadataKey, String>,
    failing: HashSet<MetadataKey>,
    picture: Option<CoverArt>,
}

impl FakeSource {
    pub fn with(mut self, key: MetadataKey, value: &str) -> Self {
        self.values.insert(key, value.to_string());
        self
    }

    /// Make reading `key` fail.
    pub fn failing(mut self, key: MetadataKey) -> Self {
        self.failing.insert(key);
        self
    }

    pub fn with_picture(mut self, data: &[u8]) -> Self {
        self.picture = Some(CoverArt {
            data: data.to_vec(),
            mime_type: "image/png".to_string(),
        });
        self
    }
}

impl TagSource for FakeSource {
    fn read_key(&self, key: MetadataKey) -> Result<Option<String>> {
        if self.failing.contains(&key) {
            return Err(Error::metadata("fake", format!("{} unreadable", key.name())));
        }
        Ok(self.values.get(&key).cloned())
    }

    fn embedded_picture(&self) -> Option<CoverArt> {
        self.picture.clone()
    }
}

/// A remote fetcher serving canned bytes (or nothing).
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    body: Option<Vec<u8>>,
}

impl MockFetcher {
    /// Every fetch fails.
    pub fn unreachable() -> Self {
        Self { body: None }
    }

    /// Every fetch returns `body`.
    pub fn serving(body: Vec<u8>) -> Self {
        Self { body: Some(body) }
    }
}

#[async_trait]
impl RemoteFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.body
            .clone()
            .ok_or_else(|| Error::remote(url, "unreachable in tests"))
    }
}

/// Write one second of 16-bit mono silence as a WAV file.
pub fn write_silent_wav(dir: &Path, name: &str) -> PathBuf {
    let channels: u16 = 1;
    let bits: u16 = 16;
    let block_align = channels * bits / 8;
    let byte_rate = WAV_SAMPLE_RATE * u32::from(block_align);
    let data_len = byte_rate;

    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&WAV_SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);

    let path = dir.join(name);
    std::fs::write(&path, wav).expect("Failed to write WAV fixture");
    path
}

/// Write a silent WAV and tag it with an ID3v2 tag built by `build`.
pub fn tagged_wav(dir: &Path, name: &str, build: impl FnOnce(&mut Tag)) -> PathBuf {
    let path = write_silent_wav(dir, name);
    let mut tag = Tag::new(TagType::Id3v2);
    build(&mut tag);
    tag.save_to_path(&path, WriteOptions::default())
        .expect("Failed to tag WAV fixture");
    path
}
