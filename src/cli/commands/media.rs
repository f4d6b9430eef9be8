//! Metadata, format and raw method call commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use futures::future::join_all;
use serde_json::{Value, json};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use super::to_uri;
use crate::channel::{
    ChannelRegistry, METADATA_CHANNEL, MethodCall, MethodResponse, MetadataRetriever,
};
use crate::config::Config;
use crate::host::HostContext;
use crate::native;

/// Extract metadata for each URI, caching cover art into `cover_dir`.
///
/// Replies are awaited until the cover is saved; the runtime is dropped
/// as soon as this returns.
pub fn cmd_metadata(
    rt: &Runtime,
    config: &Config,
    uris: &[String],
    cover_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let retriever = retriever(rt, config)?;
    let calls = uris.iter().map(|uri| {
        let mut args = json!({ "uri": to_uri(uri) });
        if let Some(dir) = &cover_dir {
            args["albumArtDirectory"] = json!(dir);
            args["waitUntilAlbumArtIsSaved"] = json!(true);
        }
        retriever.call(MethodCall::new("metadata", args)).wait()
    });

    let responses = rt.block_on(join_all(calls));
    info!("Extracted metadata for {} URI(s)", responses.len());
    print_responses(responses)
}

/// Inspect the format of each URI.
pub fn cmd_format(rt: &Runtime, config: &Config, uris: &[String]) -> anyhow::Result<()> {
    let retriever = retriever(rt, config)?;
    let calls = uris.iter().map(|uri| {
        let args = json!({ "uri": to_uri(uri) });
        retriever.call(MethodCall::new("format", args)).wait()
    });

    let responses = rt.block_on(join_all(calls));
    print_responses(responses)
}

/// Send one raw method call through a channel registry.
pub fn cmd_call(
    rt: &Runtime,
    config: &Config,
    channel: &str,
    method: &str,
    args: &str,
) -> anyhow::Result<()> {
    let arguments: Value = serde_json::from_str(args).context("--args must be JSON")?;

    if config.native.load_on_startup {
        let libraries = native::bootstrap(&config.native.libraries);
        debug!(loaded = libraries.loaded_names().count(), "Native bootstrap");
    }

    let mut registry = ChannelRegistry::new();
    registry.register(METADATA_CHANNEL, Arc::new(retriever(rt, config)?));

    let response = rt.block_on(registry.invoke(channel, MethodCall::new(method, arguments)).wait());
    print_responses(vec![response])
}

fn retriever(rt: &Runtime, config: &Config) -> anyhow::Result<MetadataRetriever> {
    MetadataRetriever::from_config(HostContext::detached(), rt.handle().clone(), config)
        .context("Failed to build metadata retriever")
}

fn print_responses(responses: Vec<MethodResponse>) -> anyhow::Result<()> {
    let mut values: Vec<Value> = responses
        .into_iter()
        .map(|response| {
            response
                .into_value()
                .unwrap_or_else(|| json!({ "error": "not implemented" }))
        })
        .collect();

    let output = if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
