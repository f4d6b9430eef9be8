//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `media`: metadata extraction, format inspection and raw method calls
//! - `native`: native library bootstrap and configuration

mod media;
mod native;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::channel::METADATA_CHANNEL;
use crate::config::{self, Config};

pub use media::{cmd_call, cmd_format, cmd_metadata};
pub use native::{cmd_bootstrap, cmd_config};

/// Media Bridge CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to the OS config directory)
    #[arg(long, global = true, env = "MEDIA_BRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Extract metadata and cache cover art
    Metadata {
        /// Media URIs (file://, content://, http(s)://) or plain paths
        #[arg(required = true)]
        uris: Vec<String>,
        /// Cover art directory (default: from config)
        #[arg(long)]
        cover_dir: Option<PathBuf>,
        /// Skip cover art
        #[arg(long, conflicts_with = "cover_dir")]
        no_cover: bool,
    },
    /// Inspect the technical format of local files
    Format {
        /// Media URIs or plain paths
        #[arg(required = true)]
        uris: Vec<String>,
    },
    /// Send a raw method call to a channel
    Call {
        /// Method name
        method: String,
        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
        /// Channel name
        #[arg(long, default_value = METADATA_CHANNEL)]
        channel: String,
    },
    /// Load the configured native libraries
    Bootstrap {
        /// Library base names (default: from config)
        libraries: Vec<String>,
    },
    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli);

    match &cli.command {
        Commands::Metadata {
            uris,
            cover_dir,
            no_cover,
        } => {
            let rt = Runtime::new()?;
            let cover_dir = match (*no_cover, cover_dir) {
                (true, _) => None,
                (false, Some(dir)) => Some(dir.clone()),
                (false, None) => Some(config.cover.directory.clone()),
            };
            cmd_metadata(&rt, &config, uris, cover_dir)
        }
        Commands::Format { uris } => {
            let rt = Runtime::new()?;
            cmd_format(&rt, &config, uris)
        }
        Commands::Call {
            method,
            args,
            channel,
        } => {
            let rt = Runtime::new()?;
            cmd_call(&rt, &config, channel, method, args)
        }
        Commands::Bootstrap { libraries } => cmd_bootstrap(&config, libraries),
        Commands::Config { save } => cmd_config(&config, cli.config.as_deref(), *save),
    }
}

fn load_config(cli: &Cli) -> Config {
    match &cli.config {
        Some(path) => config::load_from(path),
        None => config::load(),
    }
}

/// Accept plain paths as well as URIs.
fn to_uri(arg: &str) -> String {
    if arg.contains("://") {
        return arg.to_string();
    }
    let path = std::path::Path::new(arg);
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    url::Url::from_file_path(&absolute)
        .map(String::from)
        .unwrap_or_else(|_| format!("file://{}", absolute.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_metadata() {
        let cli = Cli::parse_from([
            "media-bridge",
            "metadata",
            "a.mp3",
            "https://example.com/b.mp3",
            "--no-cover",
        ]);
        match cli.command {
            Commands::Metadata {
                uris,
                cover_dir,
                no_cover,
            } => {
                assert_eq!(uris.len(), 2);
                assert!(no_cover);
                assert!(cover_dir.is_none());
            }
            _ => panic!("expected metadata command"),
        }
    }

    #[test]
    fn test_cli_rejects_conflicting_cover_flags() {
        let result = Cli::try_parse_from([
            "media-bridge",
            "metadata",
            "a.mp3",
            "--no-cover",
            "--cover-dir",
            "/tmp/covers",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_call_defaults_to_metadata_channel() {
        let cli = Cli::parse_from(["media-bridge", "call", "format"]);
        match cli.command {
            Commands::Call { channel, args, .. } => {
                assert_eq!(channel, METADATA_CHANNEL);
                assert_eq!(args, "{}");
            }
            _ => panic!("expected call command"),
        }
    }

    #[test]
    fn test_to_uri_keeps_uris() {
        assert_eq!(to_uri("https://host/a.mp3"), "https://host/a.mp3");
        assert_eq!(to_uri("content://media/1"), "content://media/1");
    }

    #[cfg(unix)]
    #[test]
    fn test_to_uri_encodes_paths() {
        assert_eq!(to_uri("/music/My Song.mp3"), "file:///music/My%20Song.mp3");
    }
}
