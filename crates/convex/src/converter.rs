//! Response conversion chain
//!
//! A client hands each raw response to a [`Converter`]. When a call selects a transformer, the
//! factory wraps the client's converter in a [`ConvexConverter`] that runs the transformer first
//! and forwards the transformed body, with its original content type, to the wrapped one.

use bytes::Bytes;
use tracing::debug;

use crate::errors::ConvexError;
use crate::markers::{CallAnnotations, Route, TransformerId};
use crate::registry::{self, Registry};
use crate::transformer::BoxError;

/// Raw response body as received from the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseBody {
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ResponseBody {
    pub fn new(content_type: Option<&str>, bytes: impl Into<Bytes>) -> Self {
        ResponseBody {
            content_type: content_type.map(str::to_string),
            bytes: bytes.into(),
        }
    }

    pub fn json(bytes: impl Into<Bytes>) -> Self {
        Self::new(Some("application/json"), bytes)
    }
}

/// Next step in the chain, typically a deserializer
pub trait Converter {
    type Output;

    fn convert(&self, body: ResponseBody) -> Result<Self::Output, BoxError>;
}

/// Run the transformer registered under `id` over a body, keeping its content type
pub fn apply(registry: &Registry, id: &TransformerId, body: ResponseBody) -> Result<ResponseBody, ConvexError> {
    let transformer = registry
        .get(id.as_str())
        .ok_or_else(|| ConvexError::RegistrationGap(id.clone()))?;

    let ResponseBody {
        content_type,
        bytes,
    } = body;
    debug!("Transforming {} bytes with {}", bytes.len(), id);
    let bytes = transformer
        .transform(bytes)
        .map_err(|source| ConvexError::Transform {
            id: id.clone(),
            source,
        })?;

    Ok(ResponseBody {
        content_type,
        bytes,
    })
}

/// Handle one call's response according to its annotations.
///
/// Unmarked and disabled calls go straight to `next`. Otherwise the selected transformer runs
/// first; a missing registration or a failing transformer aborts the call before `next` sees it.
pub fn dispatch<C: Converter>(
    registry: &Registry,
    annotations: &CallAnnotations,
    body: ResponseBody,
    next: &C,
) -> Result<C::Output, ConvexError> {
    let body = match annotations.route() {
        Route::PassThrough => body,
        Route::Transform(id) => apply(registry, id, body)?,
    };
    next.convert(body).map_err(ConvexError::Convert)
}

/// Converter that applies a transformer before delegating
#[derive(Debug)]
pub struct ConvexConverter<'r, C> {
    registry: &'r Registry,
    id: TransformerId,
    next: C,
}

impl<'r, C: Converter> ConvexConverter<'r, C> {
    pub fn new(registry: &'r Registry, id: TransformerId, next: C) -> Self {
        ConvexConverter { registry, id, next }
    }

    pub fn id(&self) -> &TransformerId {
        &self.id
    }

    pub fn try_convert(&self, body: ResponseBody) -> Result<C::Output, ConvexError> {
        let body = apply(self.registry, &self.id, body)?;
        self.next.convert(body).map_err(ConvexError::Convert)
    }
}

impl<C: Converter> Converter for ConvexConverter<'_, C> {
    type Output = C::Output;

    fn convert(&self, body: ResponseBody) -> Result<Self::Output, BoxError> {
        self.try_convert(body).map_err(Into::into)
    }
}

/// Builds response converters for calls of a resolved service
#[derive(Debug, Clone, Copy)]
pub struct ConvexConverterFactory<'r> {
    registry: &'r Registry,
}

impl<'r> ConvexConverterFactory<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        ConvexConverterFactory { registry }
    }

    /// Factory over the process-wide registry
    pub fn global() -> ConvexConverterFactory<'static> {
        ConvexConverterFactory::new(registry::global())
    }

    /// A transforming converter for the call, or `None` when the call is unmarked or disabled
    /// and the client should use its own converter unchanged.
    pub fn response_converter<C: Converter>(
        &self,
        annotations: &CallAnnotations,
        next: C,
    ) -> Option<ConvexConverter<'r, C>> {
        match annotations.route() {
            Route::PassThrough => None,
            Route::Transform(id) => Some(ConvexConverter::new(self.registry, id.clone(), next)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Converter recording what it received
    #[derive(Default)]
    struct Recorder {
        calls: AtomicUsize,
    }

    impl Converter for &Recorder {
        type Output = (Option<String>, String);

        fn convert(&self, body: ResponseBody) -> Result<Self::Output, BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((
                body.content_type,
                String::from_utf8_lossy(&body.bytes).into_owned(),
            ))
        }
    }

    fn counting_upper(counter: Arc<AtomicUsize>) -> Arc<dyn crate::Transformer> {
        Arc::new(move |bytes: Bytes| -> Result<Bytes, BoxError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from(bytes.to_ascii_uppercase()))
        })
    }

    fn failing() -> Arc<dyn crate::Transformer> {
        Arc::new(|_: Bytes| -> Result<Bytes, BoxError> { Err("envelope carried errorCode -1".into()) })
    }

    struct Fixture {
        registry: Registry,
        a_calls: Arc<AtomicUsize>,
        b_calls: Arc<AtomicUsize>,
    }

    fn fixture() -> Fixture {
        let registry = Registry::new();
        let a_calls = Arc::new(AtomicUsize::new(0));
        let b_calls = Arc::new(AtomicUsize::new(0));
        registry.register_as("app::A", counting_upper(Arc::clone(&a_calls)));
        registry.register_as("app::B", counting_upper(Arc::clone(&b_calls)));
        Fixture {
            registry,
            a_calls,
            b_calls,
        }
    }

    #[test]
    fn test_selected_transformer_runs_once_and_forwards() -> Result<(), ConvexError> {
        let fx = fixture();
        let next = Recorder::default();
        let body = ResponseBody::new(Some("text/plain"), "hello");

        let out = dispatch(&fx.registry, &CallAnnotations::selecting("app::A"), body, &&next)?;

        assert_eq!(out, (Some("text/plain".to_string()), "HELLO".to_string()));
        assert_eq!(fx.a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fx.b_calls.load(Ordering::SeqCst), 0);
        assert_eq!(next.calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn test_disable_passes_original_bytes_through() -> Result<(), ConvexError> {
        let fx = fixture();
        let next = Recorder::default();
        let annotations = CallAnnotations::selecting("app::A").disabled();

        let out = dispatch(&fx.registry, &annotations, ResponseBody::json("hello"), &&next)?;

        assert_eq!(out.1, "hello");
        assert_eq!(fx.a_calls.load(Ordering::SeqCst), 0);
        assert_eq!(fx.b_calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[test]
    fn test_missing_transformer_is_a_registration_gap() {
        let fx = fixture();
        let next = Recorder::default();

        let result = dispatch(
            &fx.registry,
            &CallAnnotations::selecting("app::C"),
            ResponseBody::json("hello"),
            &&next,
        );

        match result {
            Err(ConvexError::RegistrationGap(id)) => assert_eq!(id.as_str(), "app::C"),
            other => panic!("expected RegistrationGap, got {other:?}"),
        }
        assert_eq!(next.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_transform_failure_aborts_only_the_call() {
        let fx = fixture();
        fx.registry.register_as("app::Broken", failing());
        let next = Recorder::default();

        let failed = dispatch(
            &fx.registry,
            &CallAnnotations::selecting("app::Broken"),
            ResponseBody::json("{}"),
            &&next,
        );
        assert!(matches!(
            &failed,
            Err(ConvexError::Transform { id, .. }) if id.as_str() == "app::Broken"
        ));
        assert_eq!(next.calls.load(Ordering::SeqCst), 0);

        let ok = dispatch(
            &fx.registry,
            &CallAnnotations::selecting("app::B"),
            ResponseBody::json("next"),
            &&next,
        );
        assert!(ok.is_ok_and(|(_, text)| text == "NEXT"));
    }

    #[test]
    fn test_factory_skips_unmarked_and_disabled_calls() {
        let fx = fixture();
        let factory = ConvexConverterFactory::new(&fx.registry);
        let next = Recorder::default();

        assert!(factory
            .response_converter(&CallAnnotations::none(), &next)
            .is_none());
        assert!(factory
            .response_converter(&CallAnnotations::selecting("app::A").disabled(), &next)
            .is_none());

        let converter = factory.response_converter(&CallAnnotations::selecting("app::A"), &next);
        let out = converter.map(|c| c.convert(ResponseBody::json("wrapped")));
        assert!(matches!(out, Some(Ok((_, ref text))) if text == "WRAPPED"));
        assert_eq!(fx.a_calls.load(Ordering::SeqCst), 1);
    }
}
