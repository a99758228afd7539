//! Build-time discovery of `#[auto_transformer]` types
//!
//! Runs inside a crate's build script: scans the crate's sources, validates every marked type
//! and merges the accepted ids into the manifest stored in the build's `OUT_DIR`.
//!
//! ```no_run
//! use convex_manifest::Artifact;
//! use convex_scan::{discover, Scanner};
//! use std::path::Path;
//!
//! let scanner = Scanner::for_crate("my_app", Path::new("."), &["src".to_string()]);
//! let outcome = discover(&scanner, &Artifact::new("target/out"))?;
//! println!("{} transformers", outcome.manifest.len());
//! # Ok::<(), convex_scan::DiscoveryError>(())
//! ```

mod errors;
mod module_path;
mod round;
mod scanner;

pub use errors::{DiscoveryError, Rejection, RejectionReason};
pub use module_path::module_path_for;
pub use round::{discover, DiscoveryRound, RoundOutcome};
pub use scanner::{Discovered, ScanReport, Scanner};
