//! Config command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::output::{print_error, print_info, print_success, print_warning};
use tb_core::config::{self, ClientConfig};

fn config_file(config_path: Option<&PathBuf>) -> PathBuf {
    config_path
        .cloned()
        .unwrap_or_else(config::default_config_path)
}

/// Load the client config.
///
/// An explicit `config_path` must exist; the default path is optional and
/// falls back to built-in defaults.
pub fn resolve_config(config_path: Option<&PathBuf>) -> Result<ClientConfig> {
    match config_path {
        Some(path) => config::load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path)),
        None => {
            let path = config::default_config_path();
            if !path.exists() {
                return Ok(ClientConfig::default());
            }
            Ok(config::load_config(&path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {:?}: {}", path, e);
                ClientConfig::default()
            }))
        }
    }
}

/// Show the configuration file and the settings in effect
pub fn config_show(config_path: Option<&PathBuf>, effective: &ClientConfig) -> Result<()> {
    let path = config_file(config_path);
    if path.exists() {
        print_info(&format!("Configuration file: {:?}", path));
    } else {
        print_warning(&format!("No configuration file found at {:?}", path));
        print_info("Run 'toxicblend config init' to create one");
    }
    println!();
    println!("{}", toml::to_string_pretty(effective)?);
    Ok(())
}

/// Print the configuration file path
pub fn config_path(config_path: Option<&PathBuf>) {
    println!("{}", config_file(config_path).display());
}

/// Write a default configuration file
pub fn config_init(config_path: Option<&PathBuf>, force: bool) -> Result<()> {
    let path = config_file(config_path);
    if path.exists() && !force {
        print_error(&format!("Config file already exists: {:?}", path));
        print_info("Use --force to overwrite");
        return Ok(());
    }

    write_default(&path)?;
    print_success(&format!("Created configuration file: {:?}", path));
    Ok(())
}

fn write_default(path: &Path) -> Result<()> {
    config::save_config(path, &ClientConfig::default())
        .with_context(|| format!("Failed to write config file: {:?}", path))
}
