//! Cached reader posts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Tag, TagType};

/// A post cached locally under the tag stream it was fetched for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPost {
    pub post_id: u64,
    pub blog_id: u64,
    pub feed_id: u64,
    pub title: String,
    pub tag_slug: String,
    pub tag_type: TagType,
    /// Denormalized from the followed-blogs table
    pub is_followed: bool,
    pub published: DateTime<Utc>,
}

impl CachedPost {
    pub fn new(post_id: u64, blog_id: u64, tag: &Tag) -> Self {
        Self {
            post_id,
            blog_id,
            feed_id: 0,
            title: String::new(),
            tag_slug: tag.slug.clone(),
            tag_type: tag.tag_type,
            is_followed: false,
            published: Utc::now(),
        }
    }
}
