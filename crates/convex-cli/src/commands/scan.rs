use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use convex_config::Config;
use convex_logger as logger;
use convex_manifest::Artifact;
use convex_scan::{discover, Scanner};
use std::path::{Path, PathBuf};

use crate::common::GlobalOpts;

#[derive(Args, Debug, Clone)]
pub struct ScanCommand {
    /// Source root to scan (usually a crate's `src` directory)
    pub src: PathBuf,

    /// Crate name used as the first id segment. Defaults to `crate-name` from the crate's
    /// Convex.toml, then to the crate directory name.
    #[arg(long)]
    pub crate_name: Option<String>,

    /// Artifact root the manifest is merged into
    #[arg(long)]
    pub artifact: PathBuf,
}

pub fn handle_scan(cmd: ScanCommand, opts: &GlobalOpts) -> Result<()> {
    let crate_name = match cmd.crate_name {
        Some(name) => name,
        None => infer_crate_name(&cmd.src)?,
    };
    logger::debug(&format!(
        "Scanning {} as crate {}",
        cmd.src.display(),
        crate_name
    ));

    let scanner = Scanner::new(crate_name, vec![cmd.src.clone()]);
    let artifact = Artifact::new(&cmd.artifact);
    let outcome = discover(&scanner, &artifact)
        .with_context(|| format!("Discovery failed for {}", cmd.src.display()))?;

    for id in outcome.manifest.iter() {
        if outcome.added.contains(id) && opts.verbosity_level() > 0 {
            println!("{} {}", id, "(new)".green());
        } else {
            println!("{}", id);
        }
    }

    match outcome.written {
        Some(path) => logger::success(&format!(
            "Manifest written to {} ({} new, {} total)",
            path.display(),
            outcome.added.len(),
            outcome.manifest.len()
        )),
        None => logger::success(&format!(
            "Manifest unchanged ({} transformers)",
            outcome.manifest.len()
        )),
    }
    Ok(())
}

/// Crate name for a source root: Convex.toml next to it first, then the directory name
fn infer_crate_name(src: &Path) -> Result<String> {
    let src = src
        .canonicalize()
        .with_context(|| format!("Source directory not found: {}", src.display()))?;
    let crate_dir = src.parent().unwrap_or(&src);

    let config = Config::load_from(crate_dir)?;
    if let Some(name) = config.crate_name {
        return Ok(name);
    }

    crate_dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.replace('-', "_"))
        .with_context(|| {
            format!(
                "Cannot infer a crate name for {}; pass --crate-name",
                src.display()
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_crate_name_from_directory() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let src = temp_dir.path().join("wan-client").join("src");
        fs::create_dir_all(&src)?;

        assert_eq!(infer_crate_name(&src)?, "wan_client");
        Ok(())
    }

    #[test]
    fn test_crate_name_from_config() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let crate_dir = temp_dir.path().join("wan-client");
        fs::create_dir_all(crate_dir.join("src"))?;
        fs::write(
            crate_dir.join(convex_config::CONFIG_FILE_NAME),
            "crate-name = \"wan\"\n",
        )?;

        // CONVEX_CONFIG would redirect the lookup
        if std::env::var_os(convex_config::CONFIG_ENV).is_some() {
            return Ok(());
        }
        assert_eq!(infer_crate_name(&crate_dir.join("src"))?, "wan");
        Ok(())
    }

    #[test]
    fn test_missing_source_root() {
        let result = infer_crate_name(Path::new("/definitely/not/here/src"));
        assert!(result.is_err());
    }
}
