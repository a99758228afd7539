use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use convex_logger as logger;
use convex_manifest::{assemble, Manifest};
use std::path::PathBuf;

use crate::common::GlobalOpts;

#[derive(Args, Debug, Clone)]
pub struct ManifestCommand {
    /// Artifact roots or manifest resource files to assemble
    #[arg(required = true)]
    pub artifacts: Vec<PathBuf>,

    /// Print the assembled manifest as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn handle_manifest(cmd: ManifestCommand, opts: &GlobalOpts) -> Result<()> {
    let manifest = assemble(&cmd.artifacts).context("Failed to assemble manifest")?;
    logger::debug(&format!(
        "Assembled {} ids from {} inputs",
        manifest.len(),
        cmd.artifacts.len()
    ));

    if cmd.json {
        println!("{}", render_json(&manifest)?);
        return Ok(());
    }

    if manifest.is_empty() {
        if opts.verbosity_level() > 0 {
            eprintln!("{}", "(no transformers)".yellow());
        }
        return Ok(());
    }
    print!("{}", manifest.render());
    Ok(())
}

fn render_json(manifest: &Manifest) -> Result<String> {
    let value = serde_json::json!({
        "count": manifest.len(),
        "transformers": manifest,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}
