//! # convex-macros
//!
//! Attribute macros for the `convex` runtime. Use them through the `convex` re-exports; the
//! generated code refers to `::convex`.
//!
//! - `#[auto_transformer]` - mark a concrete transformer type for build-time discovery
//! - `#[transformer(Path)]` - select a transformer for a whole service trait, or for one method
//! - `#[disable_transformer]` - never transform one method's response
//! - `#[service]` - describe a trait that only carries method-level markers

mod auto_transformer;
mod service;

use proc_macro::TokenStream;

/// Mark a transformer type for discovery.
///
/// The type must be a `pub` struct or enum without generic parameters that implements
/// `convex::Transformer` and `Default`. Also implements `convex::Identified` with the id
/// `module_path!()::TypeName`.
///
/// ```rust,ignore
/// #[convex::auto_transformer]
/// #[derive(Default)]
/// pub struct WanTransformer;
/// ```
#[proc_macro_attribute]
pub fn auto_transformer(attr: TokenStream, item: TokenStream) -> TokenStream {
    auto_transformer::expand(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Select a transformer for every call of a service trait.
///
/// On a method inside a service trait, selects a transformer for that call only; methods
/// without their own selection inherit the trait's when the service is resolved.
///
/// ```rust,ignore
/// #[convex::transformer(WanTransformer)]
/// pub trait WanService {
///     fn articles(&self, page: u32);
///     #[convex::transformer(RawTransformer)]
///     fn banner(&self);
/// }
///
/// let resolved = WAN_SERVICE.resolve();
/// ```
#[proc_macro_attribute]
pub fn transformer(attr: TokenStream, item: TokenStream) -> TokenStream {
    service::expand_marked(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Describe a service trait without a service-level selection
#[proc_macro_attribute]
pub fn service(attr: TokenStream, item: TokenStream) -> TokenStream {
    service::expand_unmarked(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Never transform this method's response.
///
/// Only meaningful inside a `#[service]` or `#[transformer(..)]` trait, which consumes it.
#[proc_macro_attribute]
pub fn disable_transformer(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let item = proc_macro2::TokenStream::from(item);
    syn::Error::new_spanned(
        &item,
        "#[disable_transformer] only applies to methods of a #[service] or #[transformer(..)] trait",
    )
    .into_compile_error()
    .into()
}
