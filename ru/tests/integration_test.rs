//! Integration tests for readerupdate
//!
//! These tests drive full coordination runs against an on-disk store.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use readerupdate::api::{AuthContext, FetchError, ReaderApi, RestClient, StaticAuth};
use readerupdate::config::ApiConfig;
use readerupdate::coordinator::{TaskOutcome, UpdateCoordinator, UpdateTask};
use readerupdate::events::{EventBus, ReaderEvent};
use readerupdate::models::{CachedPost, TagType};
use readerupdate::store::{ReaderStore, SqliteStore};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Fixtures
// =============================================================================

/// In-test API whose payloads can be swapped between runs
struct FakeApi {
    tags: Mutex<Option<Value>>,
    followed_blogs: Mutex<Option<Value>>,
    recommended_blogs: Mutex<Option<Value>>,
}

impl FakeApi {
    fn new(tags: Value, followed_blogs: Value, recommended_blogs: Value) -> Self {
        Self {
            tags: Mutex::new(Some(tags)),
            followed_blogs: Mutex::new(Some(followed_blogs)),
            recommended_blogs: Mutex::new(Some(recommended_blogs)),
        }
    }

    fn set_tags(&self, payload: Option<Value>) {
        *self.tags.lock().unwrap() = payload;
    }

    fn set_followed_blogs(&self, payload: Option<Value>) {
        *self.followed_blogs.lock().unwrap() = payload;
    }

    fn answer(slot: &Mutex<Option<Value>>) -> Result<Value, FetchError> {
        slot.lock().unwrap().clone().ok_or_else(|| FetchError::Status {
            status: 502,
            message: "bad gateway".to_string(),
        })
    }
}

#[async_trait]
impl ReaderApi for FakeApi {
    async fn fetch_tags(&self) -> Result<Value, FetchError> {
        Self::answer(&self.tags)
    }

    async fn fetch_followed_blogs(&self) -> Result<Value, FetchError> {
        Self::answer(&self.followed_blogs)
    }

    async fn fetch_recommended_blogs(&self) -> Result<Value, FetchError> {
        Self::answer(&self.recommended_blogs)
    }
}

fn tags_payload() -> Value {
    json!({
        "default": {
            "following": {"slug": "following", "title": "Followed Sites", "URL": "https://api/read/following"},
            "12": {"slug": "reading", "title": "Reading List", "URL": "https://api/read/list/12/posts"}
        },
        "subscribed": {
            "1": {"slug": "alpha", "display_name": "alpha", "title": "Alpha", "URL": "https://api/read/tags/alpha/posts"},
            "2": {"slug": "doomed", "display_name": "doomed", "title": "Doomed", "URL": "https://api/read/tags/doomed/posts"}
        },
        "recommended": {
            "3": {"slug": "art", "display_name": "art", "title": "Art &amp; Design", "URL": "https://api/read/tags/art/posts"}
        }
    })
}

fn subscription(blog_id: u64, feed_id: u64, name: &str, followers: u64) -> Value {
    json!({
        "blog_ID": blog_id,
        "feed_ID": feed_id.to_string(),
        "URL": format!("https://{}.example", name.to_lowercase()),
        "meta": {"data": {"site": {"name": name, "subscribers_count": followers}}}
    })
}

fn followed_payload() -> Value {
    json!({"subscriptions": [subscription(123, 1230, "Alpha", 10)]})
}

fn recommended_payload() -> Value {
    json!({"blogs": [
        {"blog_id": 9, "follow_reco_id": 90, "score": 5, "title": "Nine", "blog_domain": "nine.example", "reason": "Trending"}
    ]})
}

struct Harness {
    temp_dir: TempDir,
    api: Arc<FakeApi>,
    store: Arc<SqliteStore>,
    bus: Arc<EventBus>,
    coordinator: UpdateCoordinator,
}

fn harness(authenticated: bool) -> Harness {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = Arc::new(SqliteStore::open(temp_dir.path().join("reader.db")).expect("Failed to open store"));
    let api = Arc::new(FakeApi::new(tags_payload(), followed_payload(), recommended_payload()));
    let bus = Arc::new(EventBus::new(64));
    let coordinator = UpdateCoordinator::new(api.clone(), store.clone(), bus.clone(), Arc::new(StaticAuth(authenticated)))
        .with_bookmark_title("Read Later");
    Harness {
        temp_dir,
        api,
        store,
        bus,
        coordinator,
    }
}

fn counting_callback() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = count.clone();
    (count, move || {
        inner.fetch_add(1, Ordering::SeqCst);
    })
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<ReaderEvent>) -> Vec<ReaderEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// =============================================================================
// Full runs
// =============================================================================

#[tokio::test]
async fn test_first_sync_populates_store_and_notifies_each_category() {
    let h = harness(true);
    let mut rx = h.bus.subscribe();
    let (count, callback) = counting_callback();

    let summary = h.coordinator.run(UpdateTask::ALL, callback).unwrap().wait().await.unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(!summary.has_failures());

    let mut published = drain(&mut rx);
    published.sort_by_key(|e| e.event_type());
    assert_eq!(
        published,
        vec![
            ReaderEvent::FollowedBlogsChanged,
            ReaderEvent::FollowedTagsChanged,
            ReaderEvent::RecommendedBlogsChanged,
            ReaderEvent::RecommendedTagsChanged,
        ]
    );

    assert_eq!(h.store.get_default_tags().unwrap().len(), 1);
    assert_eq!(h.store.get_custom_list_tags().unwrap().len(), 1);
    assert_eq!(h.store.get_followed_tags().unwrap().len(), 2);
    let bookmarks = h.store.get_bookmark_tags().unwrap();
    assert_eq!(bookmarks.iter().next().unwrap().title, "Read Later");
    let recommended = h.store.get_recommended_tags().unwrap();
    assert_eq!(recommended.iter().next().unwrap().title, "Art & Design");
    assert_eq!(h.store.get_followed_blogs().unwrap().len(), 1);
    assert_eq!(h.store.get_recommended_blogs().unwrap().len(), 1);
}

#[tokio::test]
async fn test_second_sync_with_same_payloads_is_silent() {
    let h = harness(true);
    h.coordinator.run(UpdateTask::ALL, || {}).unwrap().wait().await.unwrap();
    let tags_before = h.store.get_followed_tags().unwrap();
    let blogs_before = h.store.get_followed_blogs().unwrap();

    let mut rx = h.bus.subscribe();
    let summary = h.coordinator.run(UpdateTask::ALL, || {}).unwrap().wait().await.unwrap();

    assert!(drain(&mut rx).is_empty());
    assert!(summary.outcomes.values().all(|o| *o == TaskOutcome::Unchanged));
    assert_eq!(h.store.get_followed_tags().unwrap(), tags_before);
    assert_eq!(h.store.get_followed_blogs().unwrap(), blogs_before);
}

#[tokio::test]
async fn test_signed_out_sync_follows_recommended_section() {
    let h = harness(false);
    let summary = h.coordinator.run([UpdateTask::Tags], || {}).unwrap().wait().await.unwrap();

    assert_eq!(
        summary.outcome(UpdateTask::Tags),
        Some(&TaskOutcome::Changed(vec![ReaderEvent::FollowedTagsChanged]))
    );
    let followed = h.store.get_followed_tags().unwrap();
    assert_eq!(followed.len(), 1);
    assert_eq!(followed.iter().next().unwrap().slug, "art");
    assert!(h.store.get_recommended_tags().unwrap().is_empty());
}

#[tokio::test]
async fn test_tags_failure_leaves_other_categories_working() {
    let h = harness(true);
    h.api.set_tags(None);
    let mut rx = h.bus.subscribe();
    let (count, callback) = counting_callback();

    let summary = h.coordinator.run(UpdateTask::ALL, callback).unwrap().wait().await.unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(summary.failed_tasks(), vec![UpdateTask::Tags]);
    let published = drain(&mut rx);
    assert!(!published.contains(&ReaderEvent::FollowedTagsChanged));
    assert!(published.contains(&ReaderEvent::FollowedBlogsChanged));
    assert!(h.store.get_followed_tags().unwrap().is_empty());
}

// =============================================================================
// Followed blog scenarios
// =============================================================================

#[tokio::test]
async fn test_metadata_only_blog_change_persists_silently() {
    let h = harness(true);
    h.coordinator.run([UpdateTask::FollowedBlogs], || {}).unwrap().wait().await.unwrap();

    h.api
        .set_followed_blogs(Some(json!({"subscriptions": [subscription(123, 1230, "Alpha", 11)]})));
    let mut rx = h.bus.subscribe();
    let summary = h
        .coordinator
        .run([UpdateTask::FollowedBlogs], || {})
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(summary.outcome(UpdateTask::FollowedBlogs), Some(&TaskOutcome::Refreshed));
    assert!(summary.events().is_empty());
    assert!(drain(&mut rx).is_empty());
    let blogs = h.store.get_followed_blogs().unwrap();
    assert_eq!(blogs.iter().next().unwrap().num_followers, 11);
}

#[tokio::test]
async fn test_new_followed_blog_marks_cached_posts() {
    let h = harness(true);
    h.coordinator.run(UpdateTask::ALL, || {}).unwrap().wait().await.unwrap();

    let alpha = h
        .store
        .get_followed_tags()
        .unwrap()
        .iter()
        .find(|t| t.slug == "alpha")
        .cloned()
        .unwrap();
    h.store.save_post(&CachedPost::new(77, 456, &alpha)).unwrap();
    assert!(!h.store.get_posts().unwrap()[0].is_followed);

    h.api.set_followed_blogs(Some(json!({"subscriptions": [
        subscription(123, 1230, "Alpha", 10),
        subscription(456, 4560, "Beta", 3)
    ]})));
    let mut rx = h.bus.subscribe();
    h.coordinator
        .run([UpdateTask::FollowedBlogs], || {})
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(drain(&mut rx), vec![ReaderEvent::FollowedBlogsChanged]);
    assert_eq!(h.store.get_followed_blogs().unwrap().len(), 2);
    assert!(h.store.get_posts().unwrap()[0].is_followed);
}

// =============================================================================
// Tag deletion
// =============================================================================

#[tokio::test]
async fn test_failed_tag_deletion_rolls_back_whole_batch() {
    let h = harness(true);
    h.coordinator.run([UpdateTask::Tags], || {}).unwrap().wait().await.unwrap();

    let followed = h.store.get_followed_tags().unwrap();
    for (i, tag) in followed.iter().enumerate() {
        h.store.save_post(&CachedPost::new(i as u64 + 1, 5, tag)).unwrap();
    }

    // Make deleting the second tag's posts fail mid-batch
    let conn = rusqlite::Connection::open(h.temp_dir.path().join("reader.db")).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER refuse_doomed BEFORE DELETE ON reader_posts
         WHEN OLD.tag_slug = 'doomed'
         BEGIN SELECT RAISE(ABORT, 'refusing to delete'); END;",
    )
    .unwrap();
    drop(conn);

    let mut without_subscriptions = tags_payload();
    without_subscriptions["subscribed"] = json!({});
    h.api.set_tags(Some(without_subscriptions));

    let mut rx = h.bus.subscribe();
    let summary = h.coordinator.run([UpdateTask::Tags], || {}).unwrap().wait().await.unwrap();

    assert!(summary.outcome(UpdateTask::Tags).unwrap().is_failed());
    assert!(drain(&mut rx).is_empty());
    assert_eq!(h.store.get_followed_tags().unwrap(), followed);
    assert_eq!(h.store.get_posts().unwrap().len(), 2);
}

#[tokio::test]
async fn test_removed_tags_take_their_posts() {
    let h = harness(true);
    h.coordinator.run([UpdateTask::Tags], || {}).unwrap().wait().await.unwrap();

    let reading = h.store.get_custom_list_tags().unwrap().iter().next().cloned().unwrap();
    assert_eq!(reading.tag_type, TagType::CustomList);
    h.store.save_post(&CachedPost::new(1, 5, &reading)).unwrap();

    let mut without_list = tags_payload();
    without_list["default"].as_object_mut().unwrap().remove("12");
    h.api.set_tags(Some(without_list));

    h.coordinator.run([UpdateTask::Tags], || {}).unwrap().wait().await.unwrap();

    assert!(h.store.get_custom_list_tags().unwrap().is_empty());
    assert!(h.store.get_posts_with_tag(&reading).unwrap().is_empty());
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_concurrent_runs_each_complete_once() {
    let h = harness(true);
    let counts: Vec<_> = (0..4).map(|_| counting_callback()).collect();

    let mut handles = Vec::new();
    let mut totals = Vec::new();
    for (count, callback) in counts {
        handles.push(h.coordinator.run(UpdateTask::ALL, callback).unwrap().wait());
        totals.push(count);
    }
    let summaries = futures::future::join_all(handles).await;

    for summary in summaries {
        assert_eq!(summary.unwrap().outcomes.len(), 3);
    }
    for count in totals {
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

// =============================================================================
// REST client end to end
// =============================================================================

#[tokio::test]
async fn test_rest_client_sync_against_mock_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1.2/read/menu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tags_payload()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1.1/read/following/mine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(followed_payload()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1.1/read/recommendations/mine/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance").set_delay(Duration::from_millis(50)))
        .mount(&server)
        .await;

    let config = ApiConfig {
        base_url: server.uri(),
        timeout_ms: 5_000,
        ..Default::default()
    };
    let client = Arc::new(RestClient::from_config(&config).unwrap().with_token(Some("token".to_string())));
    assert!(client.is_authenticated());

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = Arc::new(SqliteStore::open(temp_dir.path().join("nested").join("reader.db")).unwrap());
    let bus = Arc::new(EventBus::new(16));
    let coordinator = UpdateCoordinator::new(client.clone(), store.clone(), bus, client);
    let (count, callback) = counting_callback();

    let summary = coordinator.run(UpdateTask::ALL, callback).unwrap().wait().await.unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(summary.failed_tasks(), vec![UpdateTask::RecommendedBlogs]);
    assert_eq!(store.get_followed_tags().unwrap().len(), 2);
    assert_eq!(store.get_bookmark_tags().unwrap().iter().next().unwrap().title, "Saved Posts");
    assert_eq!(store.get_followed_blogs().unwrap().len(), 1);
    assert!(store.get_recommended_blogs().unwrap().is_empty());
}
