//! A small client over a pluggable transport

use convex::{
    BoxError, Converter, ConvexConverterFactory, ConvexError, Interface, Registry, ResponseBody,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::marker::PhantomData;
use thiserror::Error;

use crate::service::{Article, Banner, HotKey, WanAndroidService, WAN_ANDROID_SERVICE};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("No route for {0}")]
    NotFound(String),

    #[error("Call `{0}` is not part of the service")]
    UnknownMethod(String),

    #[error(transparent)]
    Convex(#[from] ConvexError),

    #[error("Failed to decode response: {0}")]
    Decode(#[source] BoxError),
}

/// Deserializes a JSON body into `T`
#[derive(Debug)]
pub struct JsonConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonConverter<T> {
    pub fn new() -> Self {
        JsonConverter {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> Converter for JsonConverter<T> {
    type Output = T;

    fn convert(&self, body: ResponseBody) -> Result<T, BoxError> {
        if let Some(content_type) = &body.content_type {
            if !content_type.starts_with("application/json") {
                return Err(format!("unexpected content type {}", content_type).into());
            }
        }
        Ok(serde_json::from_slice(&body.bytes)?)
    }
}

pub trait Transport {
    fn get(&self, path: &str) -> Result<ResponseBody, ClientError>;
}

/// In-memory transport serving canned responses
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    routes: HashMap<String, ResponseBody>,
}

impl FakeTransport {
    pub fn new() -> Self {
        FakeTransport::default()
    }

    pub fn with_route(mut self, path: &str, body: ResponseBody) -> Self {
        self.routes.insert(path.to_string(), body);
        self
    }

    /// Responses shaped like the live API
    pub fn sample() -> Self {
        FakeTransport::new()
            .with_route(
                "/article/list/0/json",
                ResponseBody::json(
                    r#"{"data":[{"id":1,"title":"Kotlin coroutines","author":"hongyang"},{"id":2,"title":"Build scripts in depth","author":"xiaoyang"}],"errorCode":0,"errorMsg":""}"#,
                ),
            )
            .with_route(
                "/article/list/1/json",
                ResponseBody::json(r#"{"data":null,"errorCode":-1001,"errorMsg":"login required"}"#),
            )
            .with_route(
                "/banner/json",
                ResponseBody::json(
                    r#"{"data":[{"id":6,"title":"Open API","url":"https://www.wanandroid.com/blog/show/2"}],"errorCode":0,"errorMsg":""}"#,
                ),
            )
            .with_route(
                "/hotkey/list",
                ResponseBody::json(r#"[{"name":"gradle","order":1},{"name":"compose","order":2}]"#),
            )
    }
}

impl Transport for FakeTransport {
    fn get(&self, path: &str) -> Result<ResponseBody, ClientError> {
        self.routes
            .get(path)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(path.to_string()))
    }
}

/// Client whose calls run through the transformer each one selects
#[derive(Debug)]
pub struct WanAndroidClient<'r, T> {
    transport: T,
    factory: ConvexConverterFactory<'r>,
    interface: Interface,
}

impl<T: Transport> WanAndroidClient<'static, T> {
    /// Client over the generated registry
    pub fn new(transport: T) -> Self {
        WanAndroidClient::with_registry(transport, crate::convex_registry::install())
    }
}

impl<'r, T: Transport> WanAndroidClient<'r, T> {
    pub fn with_registry(transport: T, registry: &'r Registry) -> Self {
        WanAndroidClient {
            transport,
            factory: ConvexConverterFactory::new(registry),
            interface: WAN_ANDROID_SERVICE.resolve(),
        }
    }

    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    fn call<R: DeserializeOwned>(&self, method: &str, path: &str) -> Result<R, ClientError> {
        let annotations = self
            .interface
            .call(method)
            .ok_or_else(|| ClientError::UnknownMethod(method.to_string()))?;
        let body = self.transport.get(path)?;

        match self
            .factory
            .response_converter(annotations, JsonConverter::<R>::new())
        {
            Some(converter) => Ok(converter.try_convert(body)?),
            None => JsonConverter::<R>::new()
                .convert(body)
                .map_err(ClientError::Decode),
        }
    }
}

impl<T: Transport> WanAndroidService for WanAndroidClient<'_, T> {
    fn articles(&self, page: u32) -> Result<Vec<Article>, ClientError> {
        self.call("articles", &format!("/article/list/{}/json", page))
    }

    fn banners(&self) -> Result<Vec<Banner>, ClientError> {
        self.call("banners", "/banner/json")
    }

    fn raw_articles(&self, page: u32) -> Result<serde_json::Value, ClientError> {
        self.call("raw_articles", &format!("/article/list/{}/json", page))
    }

    fn hot_keys(&self) -> Result<Vec<HotKey>, ClientError> {
        self.call("hot_keys", "/hotkey/list")
    }
}
