use bytes::Bytes;
use convex::{auto_transformer, BoxError, Transformer};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "errorCode")]
    error_code: i64,
    #[serde(rename = "errorMsg", default)]
    error_msg: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// A response whose envelope reports a failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("errorCode {code}: {message}")]
pub struct ApiError {
    pub code: i64,
    pub message: String,
}

/// Unwraps the response envelope, failing the call when `errorCode` is non-zero
#[auto_transformer]
#[derive(Debug, Default)]
pub struct WanAndroidTransformer;

impl Transformer for WanAndroidTransformer {
    fn transform(&self, original: Bytes) -> Result<Bytes, BoxError> {
        let envelope: Envelope = serde_json::from_slice(&original)?;
        if envelope.error_code != 0 {
            return Err(Box::new(ApiError {
                code: envelope.error_code,
                message: envelope.error_msg,
            }));
        }
        Ok(Bytes::from(serde_json::to_vec(&envelope.data)?))
    }
}
