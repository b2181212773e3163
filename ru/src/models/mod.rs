//! Reader domain models
//!
//! Value-like lists of tags and blogs with the comparison operations the
//! merge engine uses to decide what changed.

mod blog;
mod post;
mod tag;

pub use blog::{Blog, BlogList, RecommendedBlog, RecommendedBlogList};
pub use post::CachedPost;
pub use tag::{Tag, TagList, TagType};
