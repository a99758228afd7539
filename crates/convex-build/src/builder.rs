//! Build-script driver
//!
//! ```no_run
//! // build.rs
//! fn main() {
//!     if let Err(e) = convex_build::Builder::from_env().and_then(|b| b.run()) {
//!         convex_build::report(&e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

use convex_config::{Config, CONFIG_ENV, VERBOSE_ENV};
use convex_logger as logger;
use convex_manifest::{assemble, Artifact, Manifest};
use convex_scan::{discover, RoundOutcome, Scanner};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::env::BuildEnv;
use crate::errors::BuildError;
use crate::synthesis::{render_unit, REGISTRY_FILE_NAME};
use crate::upstream::{publish_line, upstream_manifests};

/// What a build-script run produced
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub discovery: RoundOutcome,
    /// Export handed to dependents, when the crate declares `links`
    pub published: Option<PathBuf>,
    /// Generated unit and the manifest it was built from, when generation is enabled
    pub registry: Option<(PathBuf, Manifest)>,
    /// Lines for cargo, in the order they were printed
    pub directives: Vec<String>,
}

/// Runs discovery, publication and registry generation for one crate
#[derive(Debug, Clone)]
pub struct Builder {
    env: BuildEnv,
    config: Config,
    generate_registry: Option<bool>,
    source_dirs: Option<Vec<String>>,
    verbose: Option<bool>,
    extra_inputs: Vec<PathBuf>,
    emit_directives: bool,
}

impl Builder {
    /// Builder over the running build script's environment and its `Convex.toml`
    pub fn from_env() -> Result<Self, BuildError> {
        let env = BuildEnv::from_env()?;
        let config = Config::load_from(&env.manifest_dir)?;
        Ok(Self::new(env, config))
    }

    pub fn new(env: BuildEnv, config: Config) -> Self {
        Builder {
            env,
            config,
            generate_registry: None,
            source_dirs: None,
            verbose: None,
            extra_inputs: Vec::new(),
            emit_directives: true,
        }
    }

    /// Whether to synthesize `convex_registry.rs`. Library crates that only publish their
    /// manifest turn this off.
    pub fn generate_registry(mut self, generate: bool) -> Self {
        self.generate_registry = Some(generate);
        self
    }

    pub fn source_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_dirs = Some(dirs.into_iter().map(Into::into).collect());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Another manifest resource or artifact root to fold into the registry
    pub fn manifest_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_inputs.push(path.into());
        self
    }

    /// Collect cargo directives without printing them
    pub fn quiet_directives(mut self) -> Self {
        self.emit_directives = false;
        self
    }

    fn crate_name(&self) -> String {
        self.config
            .crate_name
            .clone()
            .unwrap_or_else(|| self.env.crate_name())
    }

    fn resolved_source_dirs(&self) -> Vec<String> {
        self.source_dirs
            .clone()
            .unwrap_or_else(|| self.config.source_dirs())
    }

    fn verbosity(&self) -> u8 {
        match self.verbose {
            Some(verbose) => u8::from(verbose),
            None => self.config.verbosity(),
        }
    }

    pub fn run(self) -> Result<BuildSummary, BuildError> {
        logger::init_build_script(self.verbosity(), &self.env.out_dir).map_err(BuildError::Logger)?;

        let crate_name = self.crate_name();
        let source_dirs = self.resolved_source_dirs();
        let artifact = Artifact::new(&self.env.out_dir);
        let mut directives = rerun_directives(&self.env.manifest_dir, &source_dirs);

        logger::step(&format!("Discovering transformers in {}", crate_name));
        let scanner = Scanner::for_crate(&crate_name, &self.env.manifest_dir, &source_dirs);
        let discovery = discover(&scanner, &artifact)?;

        // Dependents read the resource unconditionally, so it must exist even when empty
        let own_manifest = artifact.manifest_path();
        if !own_manifest.exists() {
            artifact.save_manifest(&discovery.manifest)?;
        }
        let mut inputs = vec![own_manifest];
        inputs.extend(
            upstream_manifests(&self.env.dep_vars)
                .into_iter()
                .map(|upstream| upstream.path),
        );

        // Cargo only hands metadata to direct dependents, so republish what came from upstream
        let published = match &self.env.links {
            Some(links) => {
                let export = artifact.save_export(&assemble(&inputs)?)?;
                debug!("Publishing {:?} for links = {}", export, links);
                directives.push(publish_line(&export));
                Some(export)
            }
            None => None,
        };

        let registry = if self.generate_registry.unwrap_or_else(|| self.config.generate_registry()) {
            inputs.extend(self.extra_inputs.iter().cloned());
            Some(generate(&inputs, &crate_name, &self.env.out_dir)?)
        } else {
            debug!("Registry generation disabled for {}", crate_name);
            None
        };

        if self.emit_directives {
            for line in &directives {
                println!("{}", line);
            }
        }

        Ok(BuildSummary {
            discovery,
            published,
            registry,
            directives,
        })
    }
}

fn rerun_directives(manifest_dir: &Path, source_dirs: &[String]) -> Vec<String> {
    let mut lines: Vec<String> = source_dirs
        .iter()
        .map(|dir| format!("cargo:rerun-if-changed={}", manifest_dir.join(dir).display()))
        .collect();
    lines.push(format!(
        "cargo:rerun-if-changed={}",
        Config::path_in(manifest_dir).display()
    ));
    lines.push(format!("cargo:rerun-if-env-changed={}", CONFIG_ENV));
    lines.push(format!("cargo:rerun-if-env-changed={}", VERBOSE_ENV));
    lines
}

/// Assemble `inputs` and write the generated unit into `out_dir`.
///
/// The file is only rewritten when its content changes, so unchanged registries don't force
/// a recompile of the including crate.
pub fn generate(inputs: &[PathBuf], crate_name: &str, out_dir: &Path) -> Result<(PathBuf, Manifest), BuildError> {
    let manifest = assemble(inputs)?;
    let unit = render_unit(&manifest, crate_name)?;
    let path = out_dir.join(REGISTRY_FILE_NAME);

    let unchanged = fs::read_to_string(&path).is_ok_and(|existing| existing == unit);
    if unchanged {
        debug!("Generated registry at {:?} is up to date", path);
    } else {
        fs::write(&path, unit).map_err(|source| BuildError::Io {
            path: path.clone(),
            source,
        })?;
    }

    let mut listing = format!("Registry for {}: {} transformers", crate_name, manifest.len());
    for (idx, id) in manifest.iter().enumerate() {
        listing.push_str(&format!("\n{}. {}", idx + 1, id));
    }
    logger::info(&listing);

    Ok((path, manifest))
}

/// Print a build failure so cargo shows it
pub fn report(error: &BuildError) {
    logger::error(&error.to_string());
}

/// Run the whole pipeline for the current build script with its `Convex.toml` settings
pub fn run_from_env() -> Result<BuildSummary, BuildError> {
    Builder::from_env()?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    const LIB_RS: &str = r#"
        pub mod wan;

        #[convex::auto_transformer]
        #[derive(Default)]
        pub struct Raw;

        impl convex::Transformer for Raw {
            fn transform(&self, original: bytes::Bytes) -> Result<bytes::Bytes, convex::BoxError> {
                Ok(original)
            }
        }
    "#;

    const WAN_RS: &str = r#"
        use convex::Transformer;

        #[convex::auto_transformer]
        #[derive(Default)]
        pub struct Envelope;

        impl Transformer for Envelope {
            fn transform(&self, original: bytes::Bytes) -> Result<bytes::Bytes, convex::BoxError> {
                Ok(original)
            }
        }
    "#;

    struct Fixture {
        _dir: TempDir,
        crate_dir: PathBuf,
        out_dir: PathBuf,
    }

    fn fixture(name: &str) -> Result<Fixture, std::io::Error> {
        let dir = TempDir::new()?;
        let crate_dir = dir.path().join(name);
        let out_dir = dir.path().join("out").join(name);
        fs::create_dir_all(crate_dir.join("src"))?;
        fs::create_dir_all(&out_dir)?;
        Ok(Fixture {
            _dir: dir,
            crate_dir,
            out_dir,
        })
    }

    fn env(fx: &Fixture, pkg: &str, links: Option<&str>, deps: &[(&str, &Path)]) -> BuildEnv {
        BuildEnv {
            manifest_dir: fx.crate_dir.clone(),
            out_dir: fx.out_dir.clone(),
            pkg_name: pkg.to_string(),
            links: links.map(str::to_string),
            dep_vars: deps
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.display().to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_library_publishes_manifest_without_registry() -> TestResult {
        let fx = fixture("wan-lib")?;
        fs::write(fx.crate_dir.join("src/lib.rs"), LIB_RS)?;
        fs::write(fx.crate_dir.join("src/wan.rs"), WAN_RS)?;

        let summary = Builder::new(env(&fx, "wan-lib", Some("wan_lib"), &[]), Config::default())
            .generate_registry(false)
            .quiet_directives()
            .run()?;

        assert_eq!(
            summary.discovery.manifest.render(),
            "wan_lib::Raw\nwan_lib::wan::Envelope\n"
        );
        assert!(summary.registry.is_none());
        assert!(summary
            .directives
            .iter()
            .any(|d| d.starts_with("cargo:convex_manifest=") && d.ends_with("exported")));
        assert!(!fx.out_dir.join(REGISTRY_FILE_NAME).exists());
        Ok(())
    }

    #[test]
    fn test_application_assembles_upstream_and_generates() -> TestResult {
        let lib = fixture("wan-lib")?;
        fs::write(lib.crate_dir.join("src/lib.rs"), LIB_RS)?;
        fs::write(lib.crate_dir.join("src/wan.rs"), WAN_RS)?;
        let lib_summary = Builder::new(env(&lib, "wan-lib", Some("wan_lib"), &[]), Config::default())
            .generate_registry(false)
            .quiet_directives()
            .run()?;
        let lib_manifest = lib_summary
            .discovery
            .written
            .ok_or("library manifest was not written")?;

        let app = fixture("app")?;
        fs::write(app.crate_dir.join("src/main.rs"), WAN_RS)?;
        let summary = Builder::new(
            env(&app, "app", None, &[("DEP_WAN_LIB_CONVEX_MANIFEST", &lib_manifest)]),
            Config::default(),
        )
        .quiet_directives()
        .run()?;

        let (path, manifest) = summary.registry.ok_or("registry was not generated")?;
        assert_eq!(
            manifest.render(),
            "app::Envelope\nwan_lib::Raw\nwan_lib::wan::Envelope\n"
        );
        let unit = fs::read_to_string(path)?;
        assert!(unit.contains("crate :: Envelope"));
        assert!(unit.contains(":: wan_lib :: wan :: Envelope"));
        assert!(!summary.directives.iter().any(|d| d.starts_with("cargo:convex_manifest=")));
        Ok(())
    }

    #[test]
    fn test_crate_without_transformers_still_publishes_an_empty_manifest() -> TestResult {
        let fx = fixture("plain")?;
        fs::write(fx.crate_dir.join("src/lib.rs"), "pub fn nothing() {}\n")?;

        let summary = Builder::new(env(&fx, "plain", Some("plain"), &[]), Config::default())
            .quiet_directives()
            .run()?;

        assert!(Artifact::new(&fx.out_dir).manifest_path().exists());
        let (_, manifest) = summary.registry.ok_or("registry was not generated")?;
        assert!(manifest.is_empty());
        Ok(())
    }

    #[test]
    fn test_transformers_reach_indirect_dependents() -> TestResult {
        let leaf = fixture("leaf")?;
        fs::write(
            leaf.crate_dir.join("src/lib.rs"),
            "#[convex::auto_transformer]\n#[derive(Default)]\npub struct Deep;\n\
             impl convex::Transformer for Deep {}\n",
        )?;
        let leaf_export = Builder::new(env(&leaf, "leaf", Some("leaf"), &[]), Config::default())
            .generate_registry(false)
            .quiet_directives()
            .run()?
            .published
            .ok_or("leaf did not publish")?;

        let mid = fixture("mid")?;
        fs::write(mid.crate_dir.join("src/lib.rs"), WAN_RS)?;
        let mid_export = Builder::new(
            env(&mid, "mid", Some("mid"), &[("DEP_LEAF_CONVEX_MANIFEST", &leaf_export)]),
            Config::default(),
        )
        .generate_registry(false)
        .quiet_directives()
        .run()?
        .published
        .ok_or("mid did not publish")?;
        assert_eq!(
            fs::read_to_string(&mid_export)?,
            "leaf::Deep\nmid::Envelope\n"
        );

        let app = fixture("app")?;
        fs::write(app.crate_dir.join("src/main.rs"), "fn main() {}\n")?;
        let summary = Builder::new(
            env(&app, "app", None, &[("DEP_MID_CONVEX_MANIFEST", &mid_export)]),
            Config::default(),
        )
        .quiet_directives()
        .run()?;

        let (_, manifest) = summary.registry.ok_or("registry was not generated")?;
        assert_eq!(manifest.render(), "leaf::Deep\nmid::Envelope\n");
        assert!(summary.published.is_none());
        Ok(())
    }

    #[test]
    fn test_corrupt_manifest_without_transformers_is_replaced() -> TestResult {
        let fx = fixture("plain")?;
        fs::write(fx.crate_dir.join("src/lib.rs"), "pub fn nothing() {}\n")?;
        let own_manifest = Artifact::new(&fx.out_dir).manifest_path();
        if let Some(parent) = own_manifest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&own_manifest, "half-written garbage")?;

        let summary = Builder::new(env(&fx, "plain", Some("plain"), &[]), Config::default())
            .quiet_directives()
            .run()?;

        assert_eq!(fs::read_to_string(&own_manifest)?, "");
        let (_, manifest) = summary.registry.ok_or("registry was not generated")?;
        assert!(manifest.is_empty());
        Ok(())
    }

    #[test]
    fn test_rejections_fail_the_build() -> TestResult {
        let fx = fixture("broken")?;
        fs::write(
            fx.crate_dir.join("src/lib.rs"),
            "#[auto_transformer]\npub struct Lonely;\n",
        )?;

        let result = Builder::new(env(&fx, "broken", None, &[]), Config::default())
            .quiet_directives()
            .run();
        assert!(matches!(result, Err(BuildError::Discovery(_))));
        assert!(!fx.out_dir.join(REGISTRY_FILE_NAME).exists());
        Ok(())
    }

    #[test]
    fn test_config_overrides_crate_name_and_sources() -> TestResult {
        let fx = fixture("renamed")?;
        fs::create_dir_all(fx.crate_dir.join("lib"))?;
        fs::write(fx.crate_dir.join("lib/lib.rs"), WAN_RS)?;

        let mut config = Config::default();
        config.set("crate-name", "custom_name")?;
        config.set("source-dirs", "lib")?;
        config.set("generate-registry", "false")?;

        let summary = Builder::new(env(&fx, "renamed", None, &[]), config)
            .quiet_directives()
            .run()?;

        assert_eq!(summary.discovery.manifest.render(), "custom_name::Envelope\n");
        assert!(summary.registry.is_none());
        assert!(summary
            .directives
            .iter()
            .any(|d| d.ends_with(&format!("renamed{}lib", std::path::MAIN_SEPARATOR))));
        Ok(())
    }
}
