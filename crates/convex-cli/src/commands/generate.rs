use anyhow::{Context, Result};
use clap::Args;
use convex_build::render_unit;
use convex_logger as logger;
use convex_manifest::assemble;
use std::fs;
use std::path::PathBuf;

use crate::common::GlobalOpts;

#[derive(Args, Debug, Clone)]
pub struct GenerateCommand {
    /// Artifact root or manifest resource to include (repeatable)
    #[arg(long = "artifact", required = true)]
    pub artifacts: Vec<PathBuf>,

    /// Crate the generated unit will be compiled into
    #[arg(long)]
    pub crate_name: String,

    /// Write the unit to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn handle_generate(cmd: GenerateCommand, opts: &GlobalOpts) -> Result<()> {
    let crate_name = cmd.crate_name.replace('-', "_");
    let manifest = assemble(&cmd.artifacts).context("Failed to assemble manifest")?;
    let unit = render_unit(&manifest, &crate_name)
        .with_context(|| format!("Failed to synthesize registry for {}", crate_name))?;

    let Some(output) = cmd.output else {
        print!("{}", unit);
        return Ok(());
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&output, unit).with_context(|| format!("Failed to write {}", output.display()))?;

    if opts.verbosity_level() > 0 {
        for (idx, id) in manifest.iter().enumerate() {
            logger::info(&format!("{}. {}", idx + 1, id));
        }
    }
    logger::success(&format!(
        "Registry with {} transformers written to {}",
        manifest.len(),
        output.display()
    ));
    Ok(())
}
