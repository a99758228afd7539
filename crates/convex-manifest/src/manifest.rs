//! Manifest operations - text encoding and merge logic
//!
//! The on-disk form is UTF-8 text with one id per line. Blank lines are ignored and
//! duplicates collapse, so the encoding is order-insensitive; rendering always sorts.

use std::path::Path;

use crate::errors::ManifestError;
use crate::types::{Manifest, TransformerId};

/// Result of merging a round's working set into a previously persisted manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Ids that were not present before, in lexical order
    pub added: Vec<TransformerId>,
    /// Size of the manifest after the merge
    pub total: usize,
}

impl MergeOutcome {
    /// Whether the merge grew the manifest (and therefore needs persisting)
    pub fn changed(&self) -> bool {
        !self.added.is_empty()
    }
}

impl Manifest {
    pub fn new() -> Self {
        Manifest::default()
    }

    /// Parse the line-oriented encoding. `origin` is only used for error context.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ManifestError> {
        let mut manifest = Manifest::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let id = TransformerId::parse(trimmed).map_err(|_| ManifestError::InvalidEntry {
                path: origin.to_path_buf(),
                line: idx + 1,
                content: line.to_string(),
            })?;
            manifest.ids.insert(id);
        }
        Ok(manifest)
    }

    /// Render sorted, one id per line, with a trailing newline
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.ids.iter().map(|id| id.as_str().len() + 1).sum());
        for id in &self.ids {
            out.push_str(id.as_str());
            out.push('\n');
        }
        out
    }

    pub fn insert(&mut self, id: TransformerId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: &TransformerId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransformerId> {
        self.ids.iter()
    }

    /// Fold `other` into `self`, reporting which ids were new
    pub fn merge(&mut self, other: impl IntoIterator<Item = TransformerId>) -> MergeOutcome {
        let mut added: Vec<TransformerId> = other
            .into_iter()
            .filter(|id| self.ids.insert(id.clone()))
            .collect();
        added.sort();
        MergeOutcome {
            added,
            total: self.ids.len(),
        }
    }

    /// Union of two manifests without touching either
    pub fn union(&self, other: &Manifest) -> Manifest {
        Manifest {
            ids: self.ids.union(&other.ids).cloned().collect(),
        }
    }
}

impl FromIterator<TransformerId> for Manifest {
    fn from_iter<I: IntoIterator<Item = TransformerId>>(iter: I) -> Self {
        Manifest {
            ids: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Manifest {
    type Item = TransformerId;
    type IntoIter = std::collections::btree_set::IntoIter<TransformerId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a TransformerId;
    type IntoIter = std::collections::btree_set::Iter<'a, TransformerId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}
