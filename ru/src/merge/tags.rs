//! Tag merge policy

use serde_json::Value;
use tracing::{debug, info};

use crate::api::parse_tags;
use crate::events::{ChangeNotifier, ReaderEvent};
use crate::models::{Tag, TagList, TagType};
use crate::store::{ReaderStore, StoreResult};

use super::MergeReport;

const DEFAULT_SECTION: &str = "default";
const SUBSCRIBED_SECTION: &str = "subscribed";
const RECOMMENDED_SECTION: &str = "recommended";

/// Build the topic list the server considers current
///
/// Signed-out users have no subscriptions; the recommended section stands in
/// for their followed tags. The bookmark tag is always appended.
pub fn server_topics(payload: &Value, authenticated: bool, bookmark_title: &str) -> TagList {
    let mut topics = parse_tags(payload, DEFAULT_SECTION, TagType::Default);

    let followed_section = if authenticated {
        SUBSCRIBED_SECTION
    } else {
        RECOMMENDED_SECTION
    };
    topics.extend(parse_tags(payload, followed_section, TagType::Followed));
    topics.push(Tag::bookmark(bookmark_title));
    topics
}

/// Merge a fetched tag payload into the store
pub fn update_tags(
    store: &dyn ReaderStore,
    notifier: &dyn ChangeNotifier,
    payload: &Value,
    authenticated: bool,
    bookmark_title: &str,
) -> StoreResult<MergeReport> {
    debug!(authenticated, "update_tags: called");
    let mut report = MergeReport::unchanged();

    let server = server_topics(payload, authenticated, bookmark_title);
    let mut local = store.get_default_tags()?;
    local.extend(store.get_followed_tags()?);
    local.extend(store.get_bookmark_tags()?);
    local.extend(store.get_custom_list_tags()?);

    if !local.is_same_list(&server) {
        let deletions = local.deletions(&server);
        if !deletions.is_empty() {
            debug!(count = deletions.len(), "update_tags: deleting stale tags and their posts");
            store.delete_tags_with_posts(&deletions)?;
        }
        store.replace_tags(&server)?;
        info!(local = local.len(), server = server.len(), "update_tags: followed tags replaced");
        notifier.notify(ReaderEvent::FollowedTagsChanged);
        report.record(ReaderEvent::FollowedTagsChanged);
    } else {
        debug!("update_tags: followed tags unchanged");
    }

    if authenticated {
        let server_recommended = parse_tags(payload, RECOMMENDED_SECTION, TagType::Recommended);
        let local_recommended = store.get_recommended_tags()?;
        if !local_recommended.is_same_list(&server_recommended) {
            store.set_recommended_tags(&server_recommended)?;
            info!(count = server_recommended.len(), "update_tags: recommended tags replaced");
            notifier.notify(ReaderEvent::RecommendedTagsChanged);
            report.record(ReaderEvent::RecommendedTagsChanged);
        } else {
            debug!("update_tags: recommended tags unchanged");
        }
    }

    Ok(report)
}
