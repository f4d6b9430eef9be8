//! Media locators.
//!
//! A locator is the URI string the host hands across the channel. Its scheme
//! decides how the resource may be opened:
//!
//! | Scheme              | Strategy                                  |
//! |---------------------|-------------------------------------------|
//! | `file://`           | open the local path directly              |
//! | `content://`        | resolve through the host's content resolver |
//! | `http://`/`https://`| best-effort remote stream                 |
//! | anything else       | remote attempt, expected to fail          |

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const FILE_PREFIX: &str = "file://";

/// How a locator may be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scheme {
    /// Local file, with its percent-decoded path
    Local(PathBuf),
    /// Content-provider URI, resolved by the host
    Content,
    /// Network stream
    Remote,
    /// Unknown scheme (or none)
    Other,
}

/// A scheme-tagged resource locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLocator {
    raw: String,
    scheme: Scheme,
}

impl MediaLocator {
    /// Parse a locator.
    ///
    /// Fails only for `file://` locators whose path cannot be recovered.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let scheme = if is_file_uri(&raw) {
            Scheme::Local(local_path(&raw)?)
        } else {
            match raw.split_once(':').map(|(s, _)| s.to_ascii_lowercase()) {
                Some(s) if s == "content" => Scheme::Content,
                Some(s) if s == "http" || s == "https" => Scheme::Remote,
                _ => Scheme::Other,
            }
        };
        Ok(Self { raw, scheme })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn is_local(&self) -> bool {
        matches!(self.scheme, Scheme::Local(_))
    }

    /// The decoded local path, for `file://` locators only.
    pub fn local_path(&self) -> Option<&Path> {
        match &self.scheme {
            Scheme::Local(path) => Some(path),
            _ => None,
        }
    }

    /// Final path segment of the raw locator (after one trailing `/` is
    /// stripped), percent-decoded for `file://` locators.
    ///
    /// Invalid percent-encoding leaves the segment as-is.
    pub fn display_name(&self) -> String {
        let trimmed = self.raw.strip_suffix('/').unwrap_or(&self.raw);
        let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
        if self.is_local() {
            match urlencoding::decode(segment) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => segment.to_string(),
            }
        } else {
            segment.to_string()
        }
    }
}

impl fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Case-insensitive `file://` check.
pub fn is_file_uri(raw: &str) -> bool {
    raw.get(..FILE_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(FILE_PREFIX))
}

fn local_path(raw: &str) -> Result<PathBuf> {
    // `url` handles the common `file:///abs/path` form, including hosts and
    // unescaped characters.
    if let Ok(url) = url::Url::parse(raw)
        && let Ok(path) = url.to_file_path()
    {
        return Ok(path);
    }

    let rest = &raw[FILE_PREFIX.len()..];
    let decoded: Cow<'_, str> = urlencoding::decode(rest).unwrap_or(Cow::Borrowed(rest));
    if decoded.is_empty() {
        return Err(Error::invalid_locator(raw, "empty file path"));
    }
    Ok(PathBuf::from(decoded.into_owned()))
}
