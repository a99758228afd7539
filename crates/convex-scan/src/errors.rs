use convex_manifest::ManifestError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why a marked type cannot be registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// No `impl Transformer for T` in the scanned sources
    MissingCapability,
    NotPublic,
    Generic,
    /// The marker sits on a trait
    Abstract,
    /// The marker sits on something that isn't a struct or enum
    NotAType,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RejectionReason::MissingCapability => "does not implement Transformer",
            RejectionReason::NotPublic => "must be declared `pub`",
            RejectionReason::Generic => "cannot have generic parameters",
            RejectionReason::Abstract => "is a trait, not a concrete type",
            RejectionReason::NotAType => "is not a struct or enum",
        })
    }
}

/// One marked type that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub type_name: String,
    pub file: PathBuf,
    pub line: usize,
    pub reason: RejectionReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: #[auto_transformer] type `{}` {}",
            self.file.display(),
            self.line,
            self.type_name,
            self.reason
        )
    }
}

fn list_rejections(rejections: &[Rejection]) -> String {
    let mut out = format!("{} invalid transformer(s):", rejections.len());
    for rejection in rejections {
        out.push_str("\n  ");
        out.push_str(&rejection.to_string());
    }
    out
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("{}", list_rejections(.0))]
    Rejected(Vec<Rejection>),

    #[error("Source directory not found: {0}")]
    SourceRoot(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}
