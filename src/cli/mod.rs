//! Command-line interface for media-bridge.
//!
//! This module provides CLI commands that call the bridge's channel
//! handlers directly, printing each reply as JSON.

mod commands;

pub use commands::{Cli, Commands, run_command};
