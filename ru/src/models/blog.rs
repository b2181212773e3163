//! Followed and recommended blogs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A blog or feed the user follows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    pub blog_id: u64,
    pub feed_id: u64,
    pub name: String,
    pub description: String,
    pub url: String,
    pub image_url: String,
    pub feed_url: String,
    pub num_followers: u64,
    pub is_private: bool,
    pub is_jetpack: bool,
    pub is_following: bool,
}

impl Blog {
    pub fn new(blog_id: u64, feed_id: u64, name: impl Into<String>) -> Self {
        Self {
            blog_id,
            feed_id,
            name: name.into(),
            is_following: true,
            ..Default::default()
        }
    }

    /// Blogs are identified by (blog_id, feed_id); external feeds have blog_id 0
    pub fn identity(&self) -> (u64, u64) {
        (self.blog_id, self.feed_id)
    }

    pub fn with_followers(mut self, num_followers: u64) -> Self {
        self.num_followers = num_followers;
        self
    }
}

/// Ordered collection of followed blogs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogList(Vec<Blog>);

impl BlogList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Blog> {
        self.0.iter()
    }

    fn find(&self, identity: (u64, u64)) -> Option<&Blog> {
        self.0.iter().find(|b| b.identity() == identity)
    }

    /// Append a blog unless one with the same identity is already present
    pub fn push(&mut self, blog: Blog) -> bool {
        if self.find(blog.identity()).is_some() {
            return false;
        }
        self.0.push(blog);
        true
    }

    /// Same blogs with identical metadata, in any order
    pub fn is_same_list(&self, other: &BlogList) -> bool {
        self.len() == other.len() && other.iter().all(|blog| self.find(blog.identity()) == Some(blog))
    }

    /// Same set of blogs, metadata ignored
    pub fn has_same_blogs(&self, other: &BlogList) -> bool {
        let mine: HashSet<_> = self.iter().map(Blog::identity).collect();
        let theirs: HashSet<_> = other.iter().map(Blog::identity).collect();
        mine == theirs
    }
}

impl From<Vec<Blog>> for BlogList {
    fn from(blogs: Vec<Blog>) -> Self {
        let mut list = BlogList::new();
        for blog in blogs {
            list.push(blog);
        }
        list
    }
}

impl FromIterator<Blog> for BlogList {
    fn from_iter<I: IntoIterator<Item = Blog>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

impl<'a> IntoIterator for &'a BlogList {
    type Item = &'a Blog;
    type IntoIter = std::slice::Iter<'a, Blog>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A blog suggested by the server's recommendation engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedBlog {
    pub blog_id: u64,
    pub follow_reco_id: u64,
    pub score: i64,
    pub title: String,
    pub blog_url: String,
    pub image_url: String,
    pub reason: String,
}

impl RecommendedBlog {
    pub fn new(blog_id: u64, title: impl Into<String>) -> Self {
        Self {
            blog_id,
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Ordered collection of recommended blogs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedBlogList(Vec<RecommendedBlog>);

impl RecommendedBlogList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RecommendedBlog> {
        self.0.iter()
    }

    pub fn push(&mut self, blog: RecommendedBlog) -> bool {
        if self.0.iter().any(|b| b.blog_id == blog.blog_id) {
            return false;
        }
        self.0.push(blog);
        true
    }

    /// Same recommendations with identical attributes, in any order
    pub fn is_same_list(&self, other: &RecommendedBlogList) -> bool {
        self.len() == other.len()
            && other
                .iter()
                .all(|blog| self.0.iter().any(|mine| mine.blog_id == blog.blog_id && mine == blog))
    }
}

impl From<Vec<RecommendedBlog>> for RecommendedBlogList {
    fn from(blogs: Vec<RecommendedBlog>) -> Self {
        let mut list = RecommendedBlogList::new();
        for blog in blogs {
            list.push(blog);
        }
        list
    }
}

impl<'a> IntoIterator for &'a RecommendedBlogList {
    type Item = &'a RecommendedBlog;
    type IntoIter = std::slice::Iter<'a, RecommendedBlog>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
