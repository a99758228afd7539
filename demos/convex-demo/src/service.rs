use convex::{disable_transformer, transformer};
use convex_demo_lib::PassThroughTransformer;
use serde::{Deserialize, Serialize};

use crate::client::ClientError;
use crate::transformer::WanAndroidTransformer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub id: u64,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotKey {
    pub name: String,
    pub order: u32,
}

/// The subset of the WanAndroid API used by the demo
#[transformer(WanAndroidTransformer)]
pub trait WanAndroidService {
    /// `GET /article/list/{page}/json`
    fn articles(&self, page: u32) -> Result<Vec<Article>, ClientError>;

    /// `GET /banner/json`
    fn banners(&self) -> Result<Vec<Banner>, ClientError>;

    /// Same endpoint as `articles`, envelope included
    #[disable_transformer]
    fn raw_articles(&self, page: u32) -> Result<serde_json::Value, ClientError>;

    /// `GET /hotkey/list`, served from a mirror without the envelope
    #[transformer(PassThroughTransformer)]
    fn hot_keys(&self) -> Result<Vec<HotKey>, ClientError>;
}
