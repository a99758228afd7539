//! Cargo build-script environment

use std::collections::HashMap;
use std::path::PathBuf;

use crate::errors::BuildError;

/// Variables cargo sets for every build script that the driver needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnv {
    pub manifest_dir: PathBuf,
    pub out_dir: PathBuf,
    pub pkg_name: String,
    /// `links` value of the package, if any
    pub links: Option<String>,
    /// Every `DEP_*` variable, for upstream manifest collection
    pub dep_vars: Vec<(String, String)>,
}

impl BuildEnv {
    pub fn from_env() -> Result<Self, BuildError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut vars: HashMap<String, String> = vars.into_iter().collect();
        let mut take = |key: &'static str| vars.remove(key).ok_or(BuildError::MissingEnv(key));

        let manifest_dir = PathBuf::from(take("CARGO_MANIFEST_DIR")?);
        let out_dir = PathBuf::from(take("OUT_DIR")?);
        let pkg_name = take("CARGO_PKG_NAME")?;
        let links = take("CARGO_MANIFEST_LINKS").ok().filter(|l| !l.is_empty());

        let mut dep_vars: Vec<(String, String)> = vars
            .into_iter()
            .filter(|(key, _)| key.starts_with("DEP_"))
            .collect();
        dep_vars.sort();

        Ok(BuildEnv {
            manifest_dir,
            out_dir,
            pkg_name,
            links,
            dep_vars,
        })
    }

    /// Rust name of the package's library crate
    pub fn crate_name(&self) -> String {
        self.pkg_name.replace('-', "_")
    }
}
