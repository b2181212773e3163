//! Followed and recommended blog merge policy

use serde_json::Value;
use tracing::{debug, info};

use crate::api::{parse_followed_blogs, parse_recommended_blogs};
use crate::events::{ChangeNotifier, ReaderEvent};
use crate::store::{ReaderStore, StoreResult};

use super::MergeReport;

/// Merge a fetched followed-blogs payload into the store
///
/// Metadata-only changes (names, follower counts) are persisted without an
/// event and reported as a silent write; only a change in which blogs are
/// followed notifies.
pub fn update_followed_blogs(
    store: &dyn ReaderStore,
    notifier: &dyn ChangeNotifier,
    payload: &Value,
) -> StoreResult<MergeReport> {
    debug!("update_followed_blogs: called");
    let server = parse_followed_blogs(payload);
    let local = store.get_followed_blogs()?;

    if local.is_same_list(&server) {
        debug!("update_followed_blogs: unchanged");
        return Ok(MergeReport::unchanged());
    }

    store.set_followed_blogs(&server)?;
    if local.has_same_blogs(&server) {
        debug!(count = server.len(), "update_followed_blogs: metadata refreshed");
        return Ok(MergeReport::refreshed());
    }

    store.update_followed_status_on_cached_posts()?;
    info!(before = local.len(), after = server.len(), "update_followed_blogs: followed blogs changed");
    notifier.notify(ReaderEvent::FollowedBlogsChanged);
    Ok(MergeReport::changed(vec![ReaderEvent::FollowedBlogsChanged]))
}

/// Merge a fetched recommendations payload into the store
pub fn update_recommended_blogs(
    store: &dyn ReaderStore,
    notifier: &dyn ChangeNotifier,
    payload: &Value,
) -> StoreResult<MergeReport> {
    debug!("update_recommended_blogs: called");
    let server = parse_recommended_blogs(payload);
    let local = store.get_recommended_blogs()?;

    if local.is_same_list(&server) {
        debug!("update_recommended_blogs: unchanged");
        return Ok(MergeReport::unchanged());
    }

    store.set_recommended_blogs(&server)?;
    info!(count = server.len(), "update_recommended_blogs: recommendations replaced");
    notifier.notify(ReaderEvent::RecommendedBlogsChanged);
    Ok(MergeReport::changed(vec![ReaderEvent::RecommendedBlogsChanged]))
}
