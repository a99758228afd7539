//! Discovery rounds
//!
//! Cargo reruns a build script whenever the crate changes, so discovery runs many times against
//! the same `OUT_DIR`. Each round merges what it found into the persisted manifest and only writes
//! when the manifest grew. Ids are never removed; a transformer that disappears from the sources
//! stays listed until the artifact directory is cleaned.

use convex_logger as logger;
use convex_manifest::{Artifact, Manifest, TransformerId};
use std::path::PathBuf;
use tracing::debug;

use crate::errors::DiscoveryError;
use crate::scanner::{ScanReport, Scanner};

/// What a finished round did to the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Ids new to the manifest, in lexical order
    pub added: Vec<TransformerId>,
    /// The manifest after the round
    pub manifest: Manifest,
    /// Where the manifest was written, `None` when the write was skipped
    pub written: Option<PathBuf>,
}

/// Working set of one discovery round
#[derive(Debug, Clone, Default)]
pub struct DiscoveryRound {
    working: Manifest,
}

impl DiscoveryRound {
    pub fn new() -> Self {
        DiscoveryRound::default()
    }

    pub fn from_report(report: &ScanReport) -> Self {
        DiscoveryRound {
            working: report.manifest(),
        }
    }

    pub fn add(&mut self, id: TransformerId) {
        self.working.insert(id);
    }

    pub fn working_set(&self) -> &Manifest {
        &self.working
    }

    /// Merge the working set into the artifact's manifest
    pub fn finish(self, artifact: &Artifact) -> Result<RoundOutcome, DiscoveryError> {
        let (mut manifest, recovered) = artifact.load_manifest_lenient();
        let previous = manifest.len();
        let merge = manifest.merge(self.working);

        if !merge.changed() && !recovered {
            debug!(
                "Manifest unchanged ({} ids), skipping write of {:?}",
                previous,
                artifact.manifest_path()
            );
            return Ok(RoundOutcome {
                added: Vec::new(),
                manifest,
                written: None,
            });
        }

        let path = artifact.save_manifest(&manifest)?;
        if merge.changed() {
            logger::info(&found_listing(&merge.added));
        }
        Ok(RoundOutcome {
            added: merge.added,
            manifest,
            written: Some(path),
        })
    }
}

fn found_listing(ids: &[TransformerId]) -> String {
    let mut out = format!("Found {} transformers:", ids.len());
    for (idx, id) in ids.iter().enumerate() {
        out.push_str(&format!("\n{}. {}", idx + 1, id));
    }
    out
}

/// Scan a crate and merge the result into `artifact`
pub fn discover(scanner: &Scanner, artifact: &Artifact) -> Result<RoundOutcome, DiscoveryError> {
    let report = scanner.scan()?;
    DiscoveryRound::from_report(&report).finish(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn round(raw: &[&str]) -> DiscoveryRound {
        let mut round = DiscoveryRound::new();
        for id in raw.iter().filter_map(|r| TransformerId::parse(r).ok()) {
            round.add(id);
        }
        round
    }

    #[test]
    fn test_first_round_writes_and_reports_everything() -> TestResult {
        let temp_dir = TempDir::new()?;
        let artifact = Artifact::new(temp_dir.path());

        let outcome = round(&["app::B", "app::A"]).finish(&artifact)?;

        assert_eq!(outcome.added.len(), 2);
        assert_eq!(outcome.written, Some(artifact.manifest_path()));
        assert_eq!(artifact.load_manifest()?.render(), "app::A\napp::B\n");
        Ok(())
    }

    #[test]
    fn test_repeated_round_is_a_fixed_point() -> TestResult {
        let temp_dir = TempDir::new()?;
        let artifact = Artifact::new(temp_dir.path());
        round(&["app::A", "app::B"]).finish(&artifact)?;
        let before = fs::read(artifact.manifest_path())?;

        let outcome = round(&["app::B", "app::A"]).finish(&artifact)?;

        assert!(outcome.added.is_empty());
        assert_eq!(outcome.written, None);
        let after = fs::read(artifact.manifest_path())?;
        assert_eq!(before, after);
        Ok(())
    }

    #[test]
    fn test_rounds_accumulate_and_never_drop_ids() -> TestResult {
        let temp_dir = TempDir::new()?;
        let artifact = Artifact::new(temp_dir.path());

        round(&["app::A"]).finish(&artifact)?;
        let outcome = round(&["app::C"]).finish(&artifact)?;

        let added: Vec<&str> = outcome.added.iter().map(TransformerId::as_str).collect();
        assert_eq!(added, vec!["app::C"]);
        assert_eq!(outcome.manifest.render(), "app::A\napp::C\n");
        Ok(())
    }

    #[test]
    fn test_corrupt_previous_manifest_is_treated_as_empty() -> TestResult {
        let temp_dir = TempDir::new()?;
        let artifact = Artifact::new(temp_dir.path());
        let path = artifact.manifest_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, "not an id at all\n")?;

        let outcome = round(&["app::A"]).finish(&artifact)?;
        assert_eq!(outcome.manifest.render(), "app::A\n");
        Ok(())
    }

    #[test]
    fn test_corrupt_manifest_is_rewritten_without_new_ids() -> TestResult {
        let temp_dir = TempDir::new()?;
        let artifact = Artifact::new(temp_dir.path());
        let path = artifact.manifest_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, "half-written garbage")?;

        let outcome = round(&[]).finish(&artifact)?;
        assert!(outcome.added.is_empty());
        assert_eq!(outcome.written.as_deref(), Some(path.as_path()));
        assert!(artifact.load_manifest()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_found_listing() {
        let ids: Vec<TransformerId> = ["app::A", "app::B"]
            .iter()
            .filter_map(|r| TransformerId::parse(r).ok())
            .collect();
        assert_eq!(found_listing(&ids), "Found 2 transformers:\n1. app::A\n2. app::B");
    }
}
