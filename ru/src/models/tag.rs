//! Reader tags and tag lists

use serde::{Deserialize, Serialize};

/// Where a tag came from and how the reader treats it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagType {
    Default,
    Followed,
    Recommended,
    CustomList,
    Bookmarked,
}

impl TagType {
    /// Stable integer code used by the store
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Followed => 0,
            Self::Default => 1,
            Self::Recommended => 2,
            Self::CustomList => 3,
            Self::Bookmarked => 4,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Followed),
            1 => Some(Self::Default),
            2 => Some(Self::Recommended),
            3 => Some(Self::CustomList),
            4 => Some(Self::Bookmarked),
            _ => None,
        }
    }
}

impl std::fmt::Display for TagType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Followed => write!(f, "followed"),
            Self::Recommended => write!(f, "recommended"),
            Self::CustomList => write!(f, "custom-list"),
            Self::Bookmarked => write!(f, "bookmarked"),
        }
    }
}

/// A reader topic: a followed tag, a default stream, a custom list or the
/// local saved-posts bookmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub slug: String,
    pub display_name: String,
    pub title: String,
    pub endpoint: String,
    pub tag_type: TagType,
}

impl Tag {
    pub fn new(
        slug: impl Into<String>,
        display_name: impl Into<String>,
        title: impl Into<String>,
        endpoint: impl Into<String>,
        tag_type: TagType,
    ) -> Self {
        Self {
            slug: slug.into(),
            display_name: display_name.into(),
            title: title.into(),
            endpoint: endpoint.into(),
            tag_type,
        }
    }

    /// The synthetic saved-for-later tag; the server never supplies it
    pub fn bookmark(title: impl Into<String>) -> Self {
        Self::new("", "", title, "", TagType::Bookmarked)
    }

    /// Identity comparison: slug (case-insensitive) and type
    pub fn is_same_tag(&self, other: &Tag) -> bool {
        self.tag_type == other.tag_type && self.slug.eq_ignore_ascii_case(&other.slug)
    }
}

/// Ordered collection of tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagList(Vec<Tag>);

impl TagList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.0.iter()
    }

    pub fn index_of(&self, tag: &Tag) -> Option<usize> {
        self.0.iter().position(|t| t.is_same_tag(tag))
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.index_of(tag).is_some()
    }

    /// Append a tag unless one with the same identity is already present
    pub fn push(&mut self, tag: Tag) -> bool {
        if self.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    pub fn extend(&mut self, other: TagList) {
        for tag in other.0 {
            self.push(tag);
        }
    }

    /// Same identities with identical attributes, in any order
    pub fn is_same_list(&self, other: &TagList) -> bool {
        if self.len() != other.len() {
            return false;
        }
        other
            .iter()
            .all(|tag| self.index_of(tag).is_some_and(|i| self.0[i] == *tag))
    }

    /// Tags present here but missing from `other`
    pub fn deletions(&self, other: &TagList) -> TagList {
        TagList(self.0.iter().filter(|t| !other.contains(t)).cloned().collect())
    }
}

impl From<Vec<Tag>> for TagList {
    fn from(tags: Vec<Tag>) -> Self {
        let mut list = TagList::new();
        for tag in tags {
            list.push(tag);
        }
        list
    }
}

impl FromIterator<Tag> for TagList {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

impl IntoIterator for TagList {
    type Item = Tag;
    type IntoIter = std::vec::IntoIter<Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TagList {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
