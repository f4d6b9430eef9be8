//! Native bootstrap and configuration commands.

use std::path::Path;

use crate::config::{self, Config};
use crate::native;

/// Load native libraries and report which ones loaded.
pub fn cmd_bootstrap(config: &Config, libraries: &[String]) -> anyhow::Result<()> {
    let names = if libraries.is_empty() {
        config.native.libraries.as_slice()
    } else {
        libraries
    };

    let result = native::bootstrap(names);
    for name in result.loaded_names() {
        println!("loaded  {name}");
    }
    for failure in result.failures() {
        println!("failed  {failure}");
    }
    Ok(())
}

/// Print the effective configuration, optionally saving it.
pub fn cmd_config(config: &Config, path: Option<&Path>, save: bool) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);

    if save {
        match path {
            Some(path) => config::save_to(config, path)?,
            None => config::save(config)?,
        }
        if let Some(path) = path.map(Path::to_path_buf).or_else(config::config_path) {
            eprintln!("Saved configuration to {}", path.display());
        }
    }
    Ok(())
}
