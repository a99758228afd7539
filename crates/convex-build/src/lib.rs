//! Build-script side of convex
//!
//! Call [`run_from_env`] (or configure a [`Builder`]) from `build.rs`. Each run:
//!
//! 1. scans the crate for `#[auto_transformer]` types and merges them into the manifest in
//!    `OUT_DIR` (see `convex-scan`);
//! 2. publishes that manifest to dependents when the package declares `links`;
//! 3. unless disabled, assembles its own manifest with every `DEP_*_CONVEX_MANIFEST` published by
//!    dependencies and writes `OUT_DIR/convex_registry.rs`, which the crate pulls in with
//!    `convex::include_registry!()`.

mod builder;
mod env;
mod errors;
mod synthesis;
mod upstream;

pub use builder::{generate, report, run_from_env, BuildSummary, Builder};
pub use env::BuildEnv;
pub use errors::{BuildError, SynthesisError};
pub use synthesis::{render_unit, synthesize_install, synthesize_table, type_path, REGISTRY_FILE_NAME};
pub use upstream::{publish_line, upstream_manifests, Upstream, MANIFEST_METADATA_KEY};
