//! Convex Manifest Management
//!
//! This crate owns the registration manifest: the set of fully-qualified transformer ids
//! that the discovery pass accumulates while a crate builds, and that registry synthesis
//! reads back once the artifact is assembled.
//!
//! The manifest is a plain text resource, one id per line, stored at
//! [`MANIFEST_RESOURCE`] under an artifact root (a build script's `OUT_DIR`).

pub mod artifact;
pub mod errors;
pub mod manifest;
pub mod types;

pub use artifact::{assemble, Artifact, EXPORT_RESOURCE, MANIFEST_RESOURCE};
pub use errors::ManifestError;
pub use manifest::MergeOutcome;
pub use types::{Manifest, TransformerId};
