//! ReaderApi trait definition

use async_trait::async_trait;
use serde_json::Value;

use super::FetchError;

/// Remote source for reader tags and blogs
///
/// One request per category; each returns the raw JSON payload. Retrying is
/// not this layer's concern.
#[async_trait]
pub trait ReaderApi: Send + Sync {
    /// Default, subscribed and recommended tag sections
    async fn fetch_tags(&self) -> Result<Value, FetchError>;

    /// Blogs the user follows, with site and feed metadata
    async fn fetch_followed_blogs(&self) -> Result<Value, FetchError>;

    /// Blogs recommended to the user
    async fn fetch_recommended_blogs(&self) -> Result<Value, FetchError>;
}

/// Answers whether the caller is signed in
pub trait AuthContext: Send + Sync {
    fn is_authenticated(&self) -> bool;
}

/// Fixed authentication answer, for hosts that already know
#[derive(Debug, Clone, Copy)]
pub struct StaticAuth(pub bool);

impl AuthContext for StaticAuth {
    fn is_authenticated(&self) -> bool {
        self.0
    }
}
