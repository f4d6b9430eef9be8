//! The metadata retrieval channel.
//!
//! Methods:
//!
//! | method     | arguments                                                  | reply            |
//! |------------|------------------------------------------------------------|------------------|
//! | `metadata` | `uri`, `albumArtDirectory`, `waitUntilAlbumArtIsSaved`     | metadata mapping |
//! | `format`   | `uri`                                                      | format mapping   |
//!
//! Both always answer with a mapping; failures degrade the mapping instead
//! of failing the call. Any other method answers not-implemented.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::{MethodCall, MethodCallHandler, PendingReply, Reply};
use crate::config::{Config, CoverConfig};
use crate::cover::derive_cover_art;
use crate::error::Result;
use crate::format::{FormatRecord, inspect_format};
use crate::host::HostContext;
use crate::locator::MediaLocator;
use crate::metadata::{Extractor, HttpFetcher, MetadataRecord, RemoteFetcher};

/// Channel name the retriever is registered under.
pub const METADATA_CHANNEL: &str = "media_bridge/metadata_retriever";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MetadataArgs {
    uri: Option<String>,
    #[serde(alias = "coverDirectory")]
    album_art_directory: Option<PathBuf>,
    wait_until_album_art_is_saved: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FormatArgs {
    uri: Option<String>,
}

/// Answers `metadata` and `format` calls on a runtime's worker pool.
#[derive(Clone)]
pub struct MetadataRetriever {
    extractor: Extractor,
    runtime: Handle,
    grace_delay: Duration,
}

impl MetadataRetriever {
    pub fn new(
        host: HostContext,
        remote: Arc<dyn RemoteFetcher>,
        runtime: Handle,
        cover: &CoverConfig,
    ) -> Self {
        Self {
            extractor: Extractor::new(host, remote),
            runtime,
            grace_delay: cover.grace_delay(),
        }
    }

    /// Build with the HTTP fetcher described by `config`.
    pub fn from_config(host: HostContext, runtime: Handle, config: &Config) -> Result<Self> {
        let remote = HttpFetcher::new(&config.remote)?;
        Ok(Self::new(host, Arc::new(remote), runtime, &config.cover))
    }

    /// Call a method directly, without a registry.
    pub fn call(&self, call: MethodCall) -> PendingReply {
        let (reply, pending) = Reply::channel();
        self.on_method_call(call, reply);
        pending
    }

    async fn metadata(self, args: MetadataArgs, reply: Reply) {
        let Some(uri) = args.uri else {
            warn!(target: "media_bridge::channel", "metadata call without uri");
            reply.success(MetadataRecord::default().to_value());
            return;
        };

        let locator = match MediaLocator::parse(uri.as_str()) {
            Ok(locator) => locator,
            Err(e) => {
                warn!(target: "media_bridge::channel", uri = %uri, error = %e, "Invalid locator");
                reply.success(MetadataRecord::degraded(uri).to_value());
                return;
            }
        };

        let source = match self.extractor.open(&locator).await {
            Ok(source) => source,
            Err(e) => {
                warn!(target: "media_bridge::channel", uri = %locator, error = %e, "Failed to open resource");
                reply.success(MetadataRecord::degraded(uri).to_value());
                return;
            }
        };

        let record = MetadataRecord::read_from(locator.as_str(), &source);
        let pending = if args.wait_until_album_art_is_saved {
            Some(reply)
        } else {
            reply.success(record.to_value());
            None
        };

        match args.album_art_directory {
            Some(directory) => {
                let (loc, rec) = (locator.clone(), record.clone());
                let result = tokio::task::spawn_blocking(move || {
                    derive_cover_art(&loc, &rec, &directory, &source)
                })
                .await;
                match result {
                    Ok(Ok(Some(path))) => {
                        info!(target: "media_bridge::channel", uri = %locator, path = %path.display(), "Saved cover art");
                    }
                    Ok(Ok(None)) => debug!(target: "media_bridge::channel", uri = %locator, "No embedded cover art"),
                    Ok(Err(e)) => {
                        warn!(target: "media_bridge::channel", uri = %locator, error = %e, "Failed to save cover art");
                    }
                    Err(e) => warn!(target: "media_bridge::channel", uri = %locator, error = %e, "Cover task failed"),
                }
            }
            None => {
                drop(source);
                debug!(target: "media_bridge::channel", uri = %locator, "No cover directory, skipping cover art");
            }
        }

        if let Some(reply) = pending {
            tokio::time::sleep(self.grace_delay).await;
            reply.success(record.to_value());
        }
    }

    async fn format(locator: MediaLocator, reply: Reply) {
        let record = tokio::task::spawn_blocking(move || inspect_format(&locator))
            .await
            .unwrap_or_else(|e| {
                warn!(target: "media_bridge::channel", error = %e, "Format task failed");
                FormatRecord::default()
            });
        reply.success(record.to_value());
    }
}

impl MethodCallHandler for MetadataRetriever {
    fn on_method_call(&self, call: MethodCall, reply: Reply) {
        debug!(target: "media_bridge::channel", method = %call.method, "Method call");
        match call.method.as_str() {
            "metadata" => {
                let args: MetadataArgs = call.arguments();
                self.runtime.spawn(self.clone().metadata(args, reply));
            }
            "format" => {
                let args: FormatArgs = call.arguments();
                match args.uri.as_deref().map(MediaLocator::parse) {
                    Some(Ok(locator)) if locator.is_local() => {
                        self.runtime.spawn(Self::format(locator, reply));
                    }
                    _ => reply.success(FormatRecord::default().to_value()),
                }
            }
            _ => reply.not_implemented(),
        }
    }
}
