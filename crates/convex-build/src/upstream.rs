//! Manifests published by dependencies
//!
//! A crate with `links = "name"` prints `cargo:convex_manifest=PATH`; cargo hands that to every
//! direct dependent as `DEP_NAME_CONVEX_MANIFEST`. The published file is the crate's export,
//! which already includes whatever its own dependencies published.

use regex::Regex;
use std::path::PathBuf;
use tracing::debug;

/// Metadata key printed by publishing crates
pub const MANIFEST_METADATA_KEY: &str = "convex_manifest";

/// One manifest published by a dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    /// The dependency's `links` value, as cargo upper-cased it
    pub links: String,
    pub path: PathBuf,
}

const DEP_VAR_PATTERN: &str = r"^DEP_([A-Z0-9_]+)_CONVEX_MANIFEST$";

/// Pick the upstream manifests out of a set of environment variables, sorted by `links` name
pub fn upstream_manifests<'a, I>(vars: I) -> Vec<Upstream>
where
    I: IntoIterator<Item = &'a (String, String)>,
{
    let Ok(pattern) = Regex::new(DEP_VAR_PATTERN) else {
        return Vec::new();
    };
    let mut found: Vec<Upstream> = vars
        .into_iter()
        .filter_map(|(key, value)| {
            let links = pattern.captures(key)?.get(1)?.as_str().to_string();
            let value = value.trim();
            if value.is_empty() {
                return None;
            }
            debug!("Upstream manifest from {}: {}", links, value);
            Some(Upstream {
                links,
                path: PathBuf::from(value),
            })
        })
        .collect();
    found.sort_by(|a, b| a.links.cmp(&b.links));
    found
}

/// The line a publishing build script prints
pub fn publish_line(path: &std::path::Path) -> String {
    format!("cargo:{}={}", MANIFEST_METADATA_KEY, path.display())
}
