//! Transformers shared by every service of the demo application
//!
//! This crate only publishes its manifest. The application that depends on it assembles the
//! registry, so these types are registered there without any manual wiring.

use bytes::Bytes;
use convex::{auto_transformer, BoxError, Transformer};

pub mod text;

/// Forwards the body untouched
#[auto_transformer]
#[derive(Debug, Default)]
pub struct PassThroughTransformer;

impl Transformer for PassThroughTransformer {
    fn transform(&self, original: Bytes) -> Result<Bytes, BoxError> {
        Ok(original)
    }
}
