use bytes::Bytes;

/// Error type produced by transformers and downstream converters
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A payload transformation applied to a raw response body before it is deserialized.
///
/// Implementations must be stateless or internally synchronized: one instance is shared by
/// every call that selects it, possibly from many threads at once.
pub trait Transformer: Send + Sync + 'static {
    fn transform(&self, original: Bytes) -> Result<Bytes, BoxError>;
}

impl<F> Transformer for F
where
    F: Fn(Bytes) -> Result<Bytes, BoxError> + Send + Sync + 'static,
{
    fn transform(&self, original: Bytes) -> Result<Bytes, BoxError> {
        self(original)
    }
}

/// Stable registry key of a transformer type.
///
/// `#[auto_transformer]` implements this as `module_path!()::TypeName`, which is the same id the
/// build-time discovery pass derives from the file layout.
pub trait Identified {
    const ID: &'static str;
}

/// Implement [`Identified`] for a type by hand.
///
/// ```
/// use bytes::Bytes;
/// use convex::{BoxError, Identified, Transformer};
///
/// #[derive(Default)]
/// pub struct Trim;
///
/// impl Transformer for Trim {
///     fn transform(&self, original: Bytes) -> Result<Bytes, BoxError> {
///         Ok(original)
///     }
/// }
///
/// convex::identified!(Trim);
/// assert!(Trim::ID.ends_with("::Trim"));
///
/// pub struct Legacy;
/// convex::identified!(Legacy = "legacy::Legacy");
/// assert_eq!(Legacy::ID, "legacy::Legacy");
/// ```
#[macro_export]
macro_rules! identified {
    ($ty:ident) => {
        impl $crate::Identified for $ty {
            const ID: &'static str =
                ::core::concat!(::core::module_path!(), "::", ::core::stringify!($ty));
        }
    };
    ($ty:ty = $id:expr) => {
        impl $crate::Identified for $ty {
            const ID: &'static str = $id;
        }
    };
}
