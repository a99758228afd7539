//! Per-call response transformers.
//!
//! A service trait marks which [`Transformer`] runs on each call's raw response before the
//! client's deserializer sees it. Transformer types carrying `#[auto_transformer]` are found at
//! build time by `convex-build`, which generates a static table and an `install()` routine that
//! merges it into the process-wide [`Registry`]. No transformer is registered by hand.
//!
//! ```ignore
//! #[convex::auto_transformer]
//! #[derive(Default)]
//! pub struct WanTransformer;
//!
//! #[convex::transformer(WanTransformer)]
//! pub trait WanService {
//!     fn articles(&self, page: u32);
//!     #[convex::disable_transformer]
//!     fn login(&self, user: &str);
//! }
//!
//! convex::include_registry!();
//!
//! let registry = convex_registry::install();
//! let service = WAN_SERVICE.resolve();
//! ```

extern crate self as convex;

mod converter;
mod errors;
mod markers;
mod registry;
mod service;
mod transformer;

pub use converter::{apply, dispatch, Converter, ConvexConverter, ConvexConverterFactory, ResponseBody};
pub use errors::ConvexError;
pub use markers::{CallAnnotations, Marker, Route, TransformerId};
pub use registry::{global, GeneratedTable, Registry};
pub use service::{propagate, Interface, InterfaceDecl, Method, MethodDecl};
pub use transformer::{BoxError, Identified, Transformer};

pub use convex_macros::{auto_transformer, disable_transformer, service, transformer};

/// Items referenced by generated code, not part of the public API
#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::{Lazy, OnceCell};
}

/// Pull the registry generated by `convex-build` into the current module as
/// `mod convex_registry`, exposing `REGISTRY` and `install()`.
#[macro_export]
macro_rules! include_registry {
    () => {
        pub mod convex_registry {
            ::core::include!(::core::concat!(
                ::core::env!("OUT_DIR"),
                "/convex_registry.rs"
            ));
        }
    };
}
