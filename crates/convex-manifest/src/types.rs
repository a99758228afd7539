//! Core manifest types
//!
//! - `TransformerId`: validated, cheaply clonable fully-qualified type path
//! - `Manifest`: ordered set of ids, sorted lexically so rendered output is reproducible

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::errors::ManifestError;

/// Path separator between id segments
pub const SEGMENT_SEPARATOR: &str = "::";

/// Fully-qualified name of one transformer implementation, e.g. `my_app::wan::WanTransformer`.
///
/// The first segment is the crate name (hyphens already folded to underscores), the last one
/// the type name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransformerId(Arc<str>);

impl TransformerId {
    /// Validate and build an id
    pub fn parse(raw: &str) -> Result<Self, ManifestError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(invalid(raw, "empty id"));
        }
        for segment in raw.split(SEGMENT_SEPARATOR) {
            if segment.is_empty() {
                return Err(invalid(raw, "empty path segment"));
            }
            if !is_identifier(segment) {
                return Err(invalid(raw, "segment is not a Rust identifier"));
            }
        }
        Ok(TransformerId(Arc::from(raw)))
    }

    /// Build an id from a crate name, a module path below the crate root and a type name
    pub fn from_parts(crate_name: &str, module: &[String], type_name: &str) -> Result<Self, ManifestError> {
        let mut raw = crate_name.replace('-', "_");
        for segment in module {
            raw.push_str(SEGMENT_SEPARATOR);
            raw.push_str(segment);
        }
        raw.push_str(SEGMENT_SEPARATOR);
        raw.push_str(type_name);
        Self::parse(&raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEGMENT_SEPARATOR)
    }

    /// Leading segment, the crate the type lives in
    pub fn crate_name(&self) -> &str {
        self.segments().next().unwrap_or_default()
    }

    /// Trailing segment, the bare type name
    pub fn type_name(&self) -> &str {
        self.0
            .rsplit(SEGMENT_SEPARATOR)
            .next()
            .unwrap_or_default()
    }
}

impl fmt::Display for TransformerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TransformerId {
    type Error = ManifestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TransformerId> for String {
    fn from(value: TransformerId) -> Self {
        value.0.to_string()
    }
}

fn invalid(raw: &str, reason: &'static str) -> ManifestError {
    ManifestError::InvalidId {
        id: raw.to_string(),
        reason,
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && segment != "_"
}

/// Set of transformer ids recorded for one artifact (or the union over several)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    pub(crate) ids: BTreeSet<TransformerId>,
}
