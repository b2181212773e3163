//! SqliteStore - rusqlite implementation of ReaderStore

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use tracing::{debug, info};

use super::{ReaderStore, StoreError, StoreResult};
use crate::models::{Blog, BlogList, CachedPost, RecommendedBlog, RecommendedBlogList, Tag, TagList, TagType};

const TAGS_TABLE: &str = "reader_tags";
const RECOMMENDED_TAGS_TABLE: &str = "reader_recommended_tags";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS reader_tags (
    slug          TEXT NOT NULL COLLATE NOCASE,
    display_name  TEXT NOT NULL,
    title         TEXT NOT NULL,
    endpoint      TEXT NOT NULL,
    tag_type      INTEGER NOT NULL,
    PRIMARY KEY (slug, tag_type)
);
CREATE TABLE IF NOT EXISTS reader_recommended_tags (
    slug          TEXT NOT NULL COLLATE NOCASE,
    display_name  TEXT NOT NULL,
    title         TEXT NOT NULL,
    endpoint      TEXT NOT NULL,
    tag_type      INTEGER NOT NULL,
    PRIMARY KEY (slug, tag_type)
);
CREATE TABLE IF NOT EXISTS reader_followed_blogs (
    blog_id       INTEGER NOT NULL,
    feed_id       INTEGER NOT NULL,
    name          TEXT NOT NULL,
    description   TEXT NOT NULL,
    url           TEXT NOT NULL,
    image_url     TEXT NOT NULL,
    feed_url      TEXT NOT NULL,
    num_followers INTEGER NOT NULL,
    is_private    INTEGER NOT NULL,
    is_jetpack    INTEGER NOT NULL,
    is_following  INTEGER NOT NULL,
    PRIMARY KEY (blog_id, feed_id)
);
CREATE TABLE IF NOT EXISTS reader_recommended_blogs (
    blog_id        INTEGER PRIMARY KEY,
    follow_reco_id INTEGER NOT NULL,
    score          INTEGER NOT NULL,
    title          TEXT NOT NULL,
    blog_url       TEXT NOT NULL,
    image_url      TEXT NOT NULL,
    reason         TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS reader_posts (
    post_id       INTEGER NOT NULL,
    blog_id       INTEGER NOT NULL,
    feed_id       INTEGER NOT NULL,
    title         TEXT NOT NULL,
    tag_slug      TEXT NOT NULL COLLATE NOCASE,
    tag_type      INTEGER NOT NULL,
    is_followed   INTEGER NOT NULL,
    published     TEXT NOT NULL,
    PRIMARY KEY (post_id, blog_id, tag_slug, tag_type)
);
";

/// Reader store backed by a single SQLite connection
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "SqliteStore::open: called");
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self::init(Connection::open(path)?)?;
        info!(path = %path.display(), "Opened reader store");
        Ok(store)
    }

    /// Open a throwaway store that lives only as long as this value
    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("SqliteStore::open_in_memory: called");
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Cache a post under the tag stream it was fetched for
    pub fn save_post(&self, post: &CachedPost) -> StoreResult<()> {
        debug!(post_id = post.post_id, tag = %post.tag_slug, "save_post: called");
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO reader_posts
                (post_id, blog_id, feed_id, title, tag_slug, tag_type, is_followed, published)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                post.post_id as i64,
                post.blog_id as i64,
                post.feed_id as i64,
                post.title,
                post.tag_slug,
                post.tag_type.as_i64(),
                post.is_followed,
                post.published.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All cached posts in insertion order
    pub fn get_posts(&self) -> StoreResult<Vec<CachedPost>> {
        debug!("get_posts: called");
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT post_id, blog_id, feed_id, title, tag_slug, tag_type, is_followed, published
             FROM reader_posts ORDER BY rowid",
        )?;
        let posts = stmt.query_map([], post_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(posts)
    }

    /// Cached posts for a single tag stream
    pub fn get_posts_with_tag(&self, tag: &Tag) -> StoreResult<Vec<CachedPost>> {
        debug!(slug = %tag.slug, tag_type = %tag.tag_type, "get_posts_with_tag: called");
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT post_id, blog_id, feed_id, title, tag_slug, tag_type, is_followed, published
             FROM reader_posts WHERE tag_slug = ?1 AND tag_type = ?2 ORDER BY rowid",
        )?;
        let posts = stmt
            .query_map(params![tag.slug, tag.tag_type.as_i64()], post_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(posts)
    }

    fn tags_of_type(&self, tag_type: TagType) -> StoreResult<TagList> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT slug, display_name, title, endpoint, tag_type FROM {} WHERE tag_type = ?1 ORDER BY rowid",
            TAGS_TABLE
        ))?;
        let tags = stmt
            .query_map(params![tag_type.as_i64()], tag_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(TagList::from(tags))
    }
}

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    let code: i64 = row.get(4)?;
    let tag_type = TagType::from_i64(code).ok_or(rusqlite::Error::IntegralValueOutOfRange(4, code))?;
    Ok(Tag {
        slug: row.get(0)?,
        display_name: row.get(1)?,
        title: row.get(2)?,
        endpoint: row.get(3)?,
        tag_type,
    })
}

fn blog_from_row(row: &Row<'_>) -> rusqlite::Result<Blog> {
    Ok(Blog {
        blog_id: row.get::<_, i64>(0)? as u64,
        feed_id: row.get::<_, i64>(1)? as u64,
        name: row.get(2)?,
        description: row.get(3)?,
        url: row.get(4)?,
        image_url: row.get(5)?,
        feed_url: row.get(6)?,
        num_followers: row.get::<_, i64>(7)? as u64,
        is_private: row.get(8)?,
        is_jetpack: row.get(9)?,
        is_following: row.get(10)?,
    })
}

fn recommended_blog_from_row(row: &Row<'_>) -> rusqlite::Result<RecommendedBlog> {
    Ok(RecommendedBlog {
        blog_id: row.get::<_, i64>(0)? as u64,
        follow_reco_id: row.get::<_, i64>(1)? as u64,
        score: row.get(2)?,
        title: row.get(3)?,
        blog_url: row.get(4)?,
        image_url: row.get(5)?,
        reason: row.get(6)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<CachedPost> {
    let code: i64 = row.get(5)?;
    let tag_type = TagType::from_i64(code).ok_or(rusqlite::Error::IntegralValueOutOfRange(5, code))?;
    let published: String = row.get(7)?;
    let published = DateTime::parse_from_rfc3339(&published)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;
    Ok(CachedPost {
        post_id: row.get::<_, i64>(0)? as u64,
        blog_id: row.get::<_, i64>(1)? as u64,
        feed_id: row.get::<_, i64>(2)? as u64,
        title: row.get(3)?,
        tag_slug: row.get(4)?,
        tag_type,
        is_followed: row.get(6)?,
        published,
    })
}

fn insert_tags(conn: &Connection, table: &str, tags: &TagList) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(&format!(
        "INSERT OR REPLACE INTO {} (slug, display_name, title, endpoint, tag_type) VALUES (?1, ?2, ?3, ?4, ?5)",
        table
    ))?;
    for tag in tags {
        stmt.execute(params![
            tag.slug,
            tag.display_name,
            tag.title,
            tag.endpoint,
            tag.tag_type.as_i64()
        ])?;
    }
    Ok(())
}

fn delete_tag_row(conn: &Connection, tag: &Tag) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM reader_tags WHERE slug = ?1 AND tag_type = ?2",
        params![tag.slug, tag.tag_type.as_i64()],
    )
}

fn delete_post_rows(conn: &Connection, tag: &Tag) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM reader_posts WHERE tag_slug = ?1 AND tag_type = ?2",
        params![tag.slug, tag.tag_type.as_i64()],
    )
}

impl ReaderStore for SqliteStore {
    fn get_default_tags(&self) -> StoreResult<TagList> {
        debug!("get_default_tags: called");
        self.tags_of_type(TagType::Default)
    }

    fn get_followed_tags(&self) -> StoreResult<TagList> {
        debug!("get_followed_tags: called");
        self.tags_of_type(TagType::Followed)
    }

    fn get_bookmark_tags(&self) -> StoreResult<TagList> {
        debug!("get_bookmark_tags: called");
        self.tags_of_type(TagType::Bookmarked)
    }

    fn get_custom_list_tags(&self) -> StoreResult<TagList> {
        debug!("get_custom_list_tags: called");
        self.tags_of_type(TagType::CustomList)
    }

    fn get_recommended_tags(&self) -> StoreResult<TagList> {
        debug!("get_recommended_tags: called");
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT slug, display_name, title, endpoint, tag_type FROM {} ORDER BY rowid",
            RECOMMENDED_TAGS_TABLE
        ))?;
        let tags = stmt.query_map([], tag_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(TagList::from(tags))
    }

    fn replace_tags(&self, tags: &TagList) -> StoreResult<()> {
        debug!(count = tags.len(), "replace_tags: called");
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(&format!("DELETE FROM {}", TAGS_TABLE), [])?;
        insert_tags(&tx, TAGS_TABLE, tags)?;
        tx.commit()?;
        Ok(())
    }

    fn set_recommended_tags(&self, tags: &TagList) -> StoreResult<()> {
        debug!(count = tags.len(), "set_recommended_tags: called");
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(&format!("DELETE FROM {}", RECOMMENDED_TAGS_TABLE), [])?;
        insert_tags(&tx, RECOMMENDED_TAGS_TABLE, tags)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_tag(&self, tag: &Tag) -> StoreResult<()> {
        debug!(slug = %tag.slug, tag_type = %tag.tag_type, "delete_tag: called");
        let conn = self.lock()?;
        delete_tag_row(&conn, tag)?;
        Ok(())
    }

    fn delete_posts_with_tag(&self, tag: &Tag) -> StoreResult<()> {
        debug!(slug = %tag.slug, tag_type = %tag.tag_type, "delete_posts_with_tag: called");
        let conn = self.lock()?;
        let count = delete_post_rows(&conn, tag)?;
        debug!(count, "delete_posts_with_tag: removed posts");
        Ok(())
    }

    fn delete_tags_with_posts(&self, tags: &TagList) -> StoreResult<()> {
        debug!(count = tags.len(), "delete_tags_with_posts: called");
        if tags.is_empty() {
            return Ok(());
        }
        let mut conn = self.lock()?;
        // Dropping the transaction without commit rolls back the whole batch
        let tx = conn.transaction()?;
        for tag in tags {
            delete_tag_row(&tx, tag)?;
            delete_post_rows(&tx, tag)?;
        }
        tx.commit()?;
        info!(count = tags.len(), "Deleted tags and their posts");
        Ok(())
    }

    fn get_followed_blogs(&self) -> StoreResult<BlogList> {
        debug!("get_followed_blogs: called");
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT blog_id, feed_id, name, description, url, image_url, feed_url,
                    num_followers, is_private, is_jetpack, is_following
             FROM reader_followed_blogs ORDER BY rowid",
        )?;
        let blogs = stmt.query_map([], blog_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(BlogList::from(blogs))
    }

    fn get_recommended_blogs(&self) -> StoreResult<RecommendedBlogList> {
        debug!("get_recommended_blogs: called");
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT blog_id, follow_reco_id, score, title, blog_url, image_url, reason
             FROM reader_recommended_blogs ORDER BY rowid",
        )?;
        let blogs = stmt
            .query_map([], recommended_blog_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(RecommendedBlogList::from(blogs))
    }

    fn set_followed_blogs(&self, blogs: &BlogList) -> StoreResult<()> {
        debug!(count = blogs.len(), "set_followed_blogs: called");
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM reader_followed_blogs", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO reader_followed_blogs
                    (blog_id, feed_id, name, description, url, image_url, feed_url,
                     num_followers, is_private, is_jetpack, is_following)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for blog in blogs {
                stmt.execute(params![
                    blog.blog_id as i64,
                    blog.feed_id as i64,
                    blog.name,
                    blog.description,
                    blog.url,
                    blog.image_url,
                    blog.feed_url,
                    blog.num_followers as i64,
                    blog.is_private,
                    blog.is_jetpack,
                    blog.is_following,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn set_recommended_blogs(&self, blogs: &RecommendedBlogList) -> StoreResult<()> {
        debug!(count = blogs.len(), "set_recommended_blogs: called");
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM reader_recommended_blogs", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO reader_recommended_blogs
                    (blog_id, follow_reco_id, score, title, blog_url, image_url, reason)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for blog in blogs {
                stmt.execute(params![
                    blog.blog_id as i64,
                    blog.follow_reco_id as i64,
                    blog.score,
                    blog.title,
                    blog.blog_url,
                    blog.image_url,
                    blog.reason,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn update_followed_status_on_cached_posts(&self) -> StoreResult<()> {
        debug!("update_followed_status_on_cached_posts: called");
        let conn = self.lock()?;
        // External feeds have no blog id and are matched on feed id instead
        let count = conn.execute(
            "UPDATE reader_posts SET is_followed = EXISTS (
                 SELECT 1 FROM reader_followed_blogs b
                 WHERE (reader_posts.blog_id != 0 AND b.blog_id = reader_posts.blog_id)
                    OR (reader_posts.blog_id = 0 AND b.feed_id = reader_posts.feed_id)
             )",
            [],
        )?;
        debug!(count, "update_followed_status_on_cached_posts: updated posts");
        Ok(())
    }
}
