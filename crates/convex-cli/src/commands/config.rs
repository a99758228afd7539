use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use convex_config::{Config, ConfigError, KNOWN_KEYS};
use convex_logger as logger;
use std::path::Path;

use crate::common::GlobalOpts;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show every key set in Convex.toml
    Show,
    /// Print the value of one key
    Get { key: String },
    /// Set a key and save Convex.toml
    Set { key: String, value: String },
    /// Print the resolved Convex.toml path
    Path,
}

pub fn handle_config(action: Option<ConfigAction>, crate_dir: &Path, opts: &GlobalOpts) -> Result<()> {
    let path = Config::path_in(crate_dir);
    logger::debug(&format!("Reading config from: {}", path.display()));

    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let config = Config::load_from_path(&path)?;
            println!("{}", "Configuration:".bold().green());
            if config.is_empty() {
                if opts.verbosity_level() > 0 {
                    println!("  {}", "(empty)".yellow());
                }
            } else {
                for (key, value) in config.values_iter() {
                    println!("  {}: {}", key.cyan(), value);
                }
            }
        }
        ConfigAction::Get { key } => {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                bail!(ConfigError::UnknownKey(key));
            }
            match Config::load_from_path(&path)?.get(&key) {
                Some(value) => println!("{}", value),
                None => logger::warn(&format!("{} is not set in {}", key, path.display())),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from_path(&path)?;
            config.set(&key, &value)?;
            config.save_to_path(&path)?;
            logger::success(&format!("Set {} = {}", key, value));
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
    }
    Ok(())
}
