use thiserror::Error;

use crate::markers::TransformerId;
use crate::transformer::BoxError;

/// Failure of a single call's response handling
#[derive(Error, Debug)]
pub enum ConvexError {
    #[error(
        "No transformer registered for `{0}`. Register it by hand or mark the type with \
         #[auto_transformer] and call the generated install() at startup"
    )]
    RegistrationGap(TransformerId),

    #[error("Transformer `{id}` failed: {source}")]
    Transform {
        id: TransformerId,
        #[source]
        source: BoxError,
    },

    #[error("Downstream conversion failed: {0}")]
    Convert(#[source] BoxError),
}

impl ConvexError {
    /// Id of the transformer involved, if any
    pub fn transformer_id(&self) -> Option<&TransformerId> {
        match self {
            ConvexError::RegistrationGap(id) | ConvexError::Transform { id, .. } => Some(id),
            ConvexError::Convert(_) => None,
        }
    }
}
