//! Artifact resource store
//!
//! An artifact is a directory tree produced by one build (a build script's `OUT_DIR`, or a
//! directory assembled from several of them). The manifest lives at [`MANIFEST_RESOURCE`]
//! relative to the artifact root. Nothing is shared across artifacts: every crate writes its
//! own resource and the assembling crate reads them all back.
//!
//! A crate that republishes its dependencies' transformers also writes an export at
//! [`EXPORT_RESOURCE`]: its own ids plus everything it assembled from upstream. The export never
//! matches the manifest suffix, so walking an artifact does not count the same ids twice.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::ManifestError;
use crate::types::Manifest;

/// Well-known location of the manifest inside an artifact
pub const MANIFEST_RESOURCE: &str = "META-INF/convex/transformers";

/// Location of the union of own and upstream ids handed to dependents
pub const EXPORT_RESOURCE: &str = "META-INF/convex/exported";

/// Handle on one artifact root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    root: PathBuf,
}

impl Artifact {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Artifact { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of this artifact's own manifest resource
    pub fn manifest_path(&self) -> PathBuf {
        self.resource_path(MANIFEST_RESOURCE)
    }

    pub fn export_path(&self) -> PathBuf {
        self.resource_path(EXPORT_RESOURCE)
    }

    fn resource_path(&self, resource: &str) -> PathBuf {
        resource
            .split('/')
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Load the manifest, returning an empty one if the resource doesn't exist
    pub fn load_manifest(&self) -> Result<Manifest, ManifestError> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(Manifest::default());
        }
        read_resource(&path)
    }

    /// Load the manifest, treating an unreadable or corrupt resource as empty.
    ///
    /// Used by the discovery pass, which must never fail a build because an earlier
    /// round left something behind it cannot read. The flag is `true` when the resource
    /// was discarded; the caller has to rewrite it even if nothing new was found.
    pub fn load_manifest_lenient(&self) -> (Manifest, bool) {
        match self.load_manifest() {
            Ok(manifest) => (manifest, false),
            Err(e) => {
                warn!(
                    "Ignoring unreadable manifest at {:?}: {}",
                    self.manifest_path(),
                    e
                );
                (Manifest::default(), true)
            }
        }
    }

    /// Save the manifest with an atomic write
    pub fn save_manifest(&self, manifest: &Manifest) -> Result<PathBuf, ManifestError> {
        let path = self.manifest_path();
        write_resource(&path, manifest)?;
        debug!("Manifest written to {:?} ({} ids)", path, manifest.len());
        Ok(path)
    }

    /// Save the export, leaving the file untouched when its content is unchanged
    pub fn save_export(&self, manifest: &Manifest) -> Result<PathBuf, ManifestError> {
        let path = self.export_path();
        if fs::read_to_string(&path).is_ok_and(|current| current == manifest.render()) {
            debug!("Export at {:?} unchanged", path);
            return Ok(path);
        }
        write_resource(&path, manifest)?;
        debug!("Export written to {:?} ({} ids)", path, manifest.len());
        Ok(path)
    }

    /// Every manifest resource below this root, including ones nested inside merged
    /// sub-artifacts. Sorted for deterministic assembly.
    pub fn manifest_resources(&self) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| is_manifest_resource(e.path()))
            .map(|e| e.into_path())
            .collect();
        found.sort();
        found
    }
}

fn is_manifest_resource(path: &Path) -> bool {
    let mut components = path.components().rev();
    MANIFEST_RESOURCE
        .rsplit('/')
        .all(|part| components.next().is_some_and(|c| c.as_os_str() == part))
}

fn write_resource(path: &Path, manifest: &Manifest) -> Result<(), ManifestError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Atomic write: write to temp file then rename
    let temp_path = path.with_extension("tmp");
    {
        let file = fs::File::create(&temp_path)?;
        let mut writer = std::io::BufWriter::new(file);
        writer.write_all(manifest.render().as_bytes())?;
        writer.flush()?;
    }
    fs::rename(&temp_path, path)?;
    Ok(())
}

fn read_resource(path: &Path) -> Result<Manifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    Manifest::parse(&content, path)
}

/// Assemble the final manifest from a set of inputs.
///
/// Each input is either a manifest resource file or an artifact root, in which case every
/// resource below it is read. Unlike the discovery pass this is strict: an unreadable input
/// fails assembly rather than silently dropping transformers.
pub fn assemble<I, P>(inputs: I) -> Result<Manifest, ManifestError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut assembled = Manifest::default();
    let mut sources = 0usize;

    for input in inputs {
        let input = input.as_ref();
        let resources = if input.is_dir() {
            Artifact::new(input).manifest_resources()
        } else {
            vec![input.to_path_buf()]
        };
        for resource in resources {
            let manifest = read_resource(&resource)?;
            debug!("Read {} ids from {:?}", manifest.len(), resource);
            assembled.merge(manifest);
            sources += 1;
        }
    }

    info!(
        "Assembled manifest with {} ids from {} resources",
        assembled.len(),
        sources
    );
    Ok(assembled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransformerId;
    use tempfile::TempDir;

    fn manifest_of(raw: &[&str]) -> Manifest {
        raw.iter()
            .filter_map(|r| TransformerId::parse(r).ok())
            .collect()
    }

    #[test]
    fn test_missing_resource_loads_empty() -> Result<(), ManifestError> {
        let temp_dir = TempDir::new()?;
        let artifact = Artifact::new(temp_dir.path());
        assert!(artifact.load_manifest()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_save_and_load_roundtrip_is_byte_stable() -> Result<(), ManifestError> {
        let temp_dir = TempDir::new()?;
        let artifact = Artifact::new(temp_dir.path());
        let manifest = manifest_of(&["app::B", "app::A"]);

        let path = artifact.save_manifest(&manifest)?;
        let first = fs::read(&path)?;
        let loaded = artifact.load_manifest()?;
        artifact.save_manifest(&loaded)?;

        assert_eq!(loaded, manifest);
        assert_eq!(fs::read(&path)?, first);
        assert!(path.ends_with("META-INF/convex/transformers"));
        Ok(())
    }

    #[test]
    fn test_lenient_load_ignores_corrupt_resource() -> Result<(), ManifestError> {
        let temp_dir = TempDir::new()?;
        let artifact = Artifact::new(temp_dir.path());
        let path = artifact.manifest_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, "app::Good\n%%% garbage %%%\n")?;

        assert!(artifact.load_manifest().is_err());
        let (manifest, recovered) = artifact.load_manifest_lenient();
        assert!(manifest.is_empty());
        assert!(recovered);
        Ok(())
    }

    #[test]
    fn test_lenient_load_of_missing_resource_is_not_a_recovery() -> Result<(), ManifestError> {
        let temp_dir = TempDir::new()?;
        let (manifest, recovered) = Artifact::new(temp_dir.path()).load_manifest_lenient();
        assert!(manifest.is_empty());
        assert!(!recovered);
        Ok(())
    }

    #[test]
    fn test_export_is_not_picked_up_as_a_manifest() -> Result<(), ManifestError> {
        let temp_dir = TempDir::new()?;
        let artifact = Artifact::new(temp_dir.path());
        artifact.save_manifest(&manifest_of(&["mid::Own"]))?;
        let export = artifact.save_export(&manifest_of(&["mid::Own", "leaf::Deep"]))?;

        assert!(export.ends_with("META-INF/convex/exported"));
        assert_eq!(artifact.manifest_resources(), vec![artifact.manifest_path()]);
        assert_eq!(assemble([&export])?.render(), "leaf::Deep\nmid::Own\n");
        Ok(())
    }

    #[test]
    fn test_assemble_from_nested_artifacts_and_files() -> Result<(), ManifestError> {
        let temp_dir = TempDir::new()?;
        let lib = Artifact::new(temp_dir.path().join("merged").join("lib"));
        let app = Artifact::new(temp_dir.path().join("app"));
        lib.save_manifest(&manifest_of(&["lib::Shared", "lib::Only"]))?;
        let app_resource = app.save_manifest(&manifest_of(&["app::Main", "lib::Shared"]))?;

        let assembled = assemble([temp_dir.path().join("merged"), app_resource])?;

        assert_eq!(
            assembled.render(),
            "app::Main\nlib::Only\nlib::Shared\n"
        );
        Ok(())
    }

    #[test]
    fn test_assemble_fails_on_missing_input() {
        let result = assemble([PathBuf::from("/definitely/not/here/transformers")]);
        assert!(matches!(result, Err(ManifestError::Io(_))));
    }
}
