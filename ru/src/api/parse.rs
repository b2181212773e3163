//! Payload parsing into reader models
//!
//! Parsing is permissive: a missing section, a missing field or a value of
//! the wrong shape yields an empty list, empty string or zero instead of an
//! error, so a partially malformed payload never fails a sync.

use serde_json::Value;
use tracing::debug;

use crate::models::{Blog, BlogList, RecommendedBlog, RecommendedBlogList, Tag, TagList, TagType};

/// Endpoint segment that marks a custom list served in the default section
const LIST_ENDPOINT_MARKER: &str = "/read/list/";

/// Parse one named tag section (`default`, `subscribed`, `recommended`)
///
/// Sections are objects keyed by an internal name; arrays are accepted too.
/// A default-section tag whose endpoint is a list becomes a custom list.
pub fn parse_tags(payload: &Value, section: &str, tag_type: TagType) -> TagList {
    let entries: Vec<(Option<&str>, &Value)> = match payload.get(section) {
        Some(Value::Object(map)) => map.iter().map(|(key, entry)| (Some(key.as_str()), entry)).collect(),
        Some(Value::Array(items)) => items.iter().map(|entry| (None, entry)).collect(),
        _ => {
            debug!(%section, "parse_tags: section missing");
            return TagList::new();
        }
    };

    let mut tags = TagList::new();
    for (key, entry) in entries.into_iter().filter(|(_, e)| e.is_object()) {
        let endpoint = str_field(entry, "URL");
        let resolved_type = if tag_type == TagType::Default && endpoint.contains(LIST_ENDPOINT_MARKER) {
            TagType::CustomList
        } else {
            tag_type
        };
        let title = decode_entities(&str_field(entry, "title"));

        // An empty slug belongs to the bookmark tag only
        let mut slug = decode_entities(&str_field(entry, "slug"));
        if slug.is_empty() {
            slug = key.map(str::to_string).unwrap_or_else(|| slug_from_title(&title));
        }
        if slug.is_empty() {
            debug!(%section, "parse_tags: skipping tag without slug or title");
            continue;
        }

        tags.push(Tag::new(
            slug,
            decode_entities(&str_field(entry, "display_name")),
            title,
            endpoint,
            resolved_type,
        ));
    }
    debug!(%section, count = tags.len(), "parse_tags: parsed");
    tags
}

/// Parse the followed-blogs response (`subscriptions[]` with site/feed meta)
pub fn parse_followed_blogs(payload: &Value) -> BlogList {
    let Some(items) = payload.get("subscriptions").and_then(Value::as_array) else {
        debug!("parse_followed_blogs: no subscriptions");
        return BlogList::new();
    };

    let blogs: BlogList = items.iter().filter(|i| i.is_object()).map(parse_followed_blog).collect();
    debug!(count = blogs.len(), "parse_followed_blogs: parsed");
    blogs
}

fn parse_followed_blog(item: &Value) -> Blog {
    let site = item.pointer("/meta/data/site").unwrap_or(&Value::Null);
    let feed = item.pointer("/meta/data/feed").unwrap_or(&Value::Null);

    let first_non_empty = |candidates: [String; 3]| candidates.into_iter().find(|s| !s.is_empty()).unwrap_or_default();

    let num_followers = match u64_field(site, "subscribers_count") {
        0 => u64_field(feed, "subscribers_count"),
        n => n,
    };

    Blog {
        blog_id: u64_field(item, "blog_ID"),
        feed_id: u64_field(item, "feed_ID"),
        name: decode_entities(&first_non_empty([str_field(site, "name"), str_field(feed, "name"), String::new()])),
        description: decode_entities(&str_field(site, "description")),
        url: first_non_empty([str_field(item, "URL"), str_field(site, "URL"), str_field(feed, "URL")]),
        image_url: item
            .pointer("/meta/data/site/icon/img")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        feed_url: str_field(feed, "feed_URL"),
        num_followers,
        is_private: bool_field(site, "is_private"),
        is_jetpack: bool_field(site, "is_jetpack"),
        is_following: true,
    }
}

/// Parse the recommendations response (`blogs[]`)
pub fn parse_recommended_blogs(payload: &Value) -> RecommendedBlogList {
    let Some(items) = payload.get("blogs").and_then(Value::as_array) else {
        debug!("parse_recommended_blogs: no blogs");
        return RecommendedBlogList::new();
    };

    let mut blogs = RecommendedBlogList::new();
    for item in items.iter().filter(|i| i.is_object()) {
        blogs.push(RecommendedBlog {
            blog_id: u64_field(item, "blog_id"),
            follow_reco_id: u64_field(item, "follow_reco_id"),
            score: i64_field(item, "score"),
            title: decode_entities(&str_field(item, "title")),
            blog_url: str_field(item, "blog_domain"),
            image_url: str_field(item, "image"),
            reason: decode_entities(&str_field(item, "reason")),
        });
    }
    debug!(count = blogs.len(), "parse_recommended_blogs: parsed");
    blogs
}

/// Lowercase, with each run of non-alphanumerics collapsed to one hyphen
fn slug_from_title(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn str_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Ids arrive as numbers or as numeric strings
fn u64_field(value: &Value, key: &str) -> u64 {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}

fn i64_field(value: &Value, key: &str) -> i64 {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}

fn bool_field(value: &Value, key: &str) -> bool {
    match value.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        Some(Value::String(s)) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    }
}

/// Decode the HTML entities the API leaves in titles and names
fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail.find(';').and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}
