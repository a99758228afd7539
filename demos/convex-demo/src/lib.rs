//! Demo client for the WanAndroid open API
//!
//! Every endpoint wraps its payload in a `{errorCode, errorMsg, data}` envelope.
//! [`service::WanAndroidService`] selects [`transformer::WanAndroidTransformer`] once for the
//! whole service, so each call's converter only ever sees `data`.

pub mod client;
pub mod service;
pub mod transformer;

convex::include_registry!();
