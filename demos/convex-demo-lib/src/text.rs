use bytes::Bytes;
use convex::{auto_transformer, BoxError, Transformer};

/// Strips leading and trailing ASCII whitespace, which some gateways pad responses with
#[auto_transformer]
#[derive(Debug, Default)]
pub struct TrimTransformer;

impl Transformer for TrimTransformer {
    fn transform(&self, original: Bytes) -> Result<Bytes, BoxError> {
        let start = original
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(original.len());
        let end = original
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .map_or(start, |idx| idx + 1);
        Ok(original.slice(start..end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim() -> Result<(), BoxError> {
        let trimmed = TrimTransformer.transform(Bytes::from_static(b"\n  {\"a\":1} \r\n"))?;
        assert_eq!(&trimmed[..], b"{\"a\":1}");

        let blank = TrimTransformer.transform(Bytes::from_static(b"   "))?;
        assert!(blank.is_empty());
        Ok(())
    }
}
