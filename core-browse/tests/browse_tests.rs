//! Integration tests for the debounced search and the sectioned browser.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::library::{AlbumDescriptor, AlbumKind, MediaItem};
use bridge_traits::thumbnail::{ThumbnailImage, ThumbnailLoader, ThumbnailSpec};
use bytes::Bytes;
use core_albums::{AlbumsSnapshot, FetchedAlbum};
use core_browse::{AlbumSearcher, AlbumsBrowser, SectionKind};
use core_runtime::config::BrowseConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::time::timeout;

// ============================================================================
// Test Utilities
// ============================================================================

fn album(title: &str) -> Arc<FetchedAlbum> {
    Arc::new(FetchedAlbum::new(
        AlbumDescriptor::new(title.to_lowercase(), title, AlbumKind::User),
        vec![MediaItem::new(format!("{}-key", title.to_lowercase()), 0)],
    ))
}

fn ready(albums: Vec<Arc<FetchedAlbum>>) -> AlbumsSnapshot {
    AlbumsSnapshot {
        albums,
        is_loading: false,
    }
}

/// Thumbnail loader that optionally waits for a gate before resolving.
struct GateLoader {
    gate: Option<Arc<Notify>>,
    loads: AtomicUsize,
}

impl GateLoader {
    fn immediate() -> Arc<Self> {
        Arc::new(Self {
            gate: None,
            loads: AtomicUsize::new(0),
        })
    }

    fn gated(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            gate: Some(gate),
            loads: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ThumbnailLoader for GateLoader {
    async fn load_thumbnail(
        &self,
        item: &MediaItem,
        spec: &ThumbnailSpec,
    ) -> BridgeResult<ThumbnailImage> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(ThumbnailImage {
            item: item.id.clone(),
            data: Bytes::from_static(b"pixels"),
            width: spec.width,
            height: spec.height,
        })
    }
}

// ============================================================================
// Debounce
// ============================================================================

#[tokio::test(start_paused = true)]
async fn debounce_commits_only_the_latest_term() {
    let (_source_tx, source_rx) = watch::channel(ready(vec![
        album("Cafe Trip"),
        album("Beach"),
        album("CAFÉ"),
    ]));

    let searcher = AlbumSearcher::new(source_rx, Duration::from_millis(250));
    let mut out = searcher.subscribe();

    // Two terms 50 ms apart, inside the 250 ms window: the first is
    // discarded, only the later one commits.
    searcher.set_term("be");
    tokio::time::sleep(Duration::from_millis(50)).await;
    searcher.set_term("café");

    timeout(Duration::from_secs(5), out.changed())
        .await
        .expect("debounce did not commit")
        .unwrap();
    let searched = out.borrow_and_update().clone();
    assert_eq!(searched.state.raw_term, "café");

    let titles: Vec<_> = searched.albums.iter().map(|a| a.title()).collect();
    assert_eq!(titles, ["Cafe Trip", "CAFÉ"]);

    // Exactly one recomputation: nothing further is published.
    assert!(timeout(Duration::from_secs(1), out.changed()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn blank_term_restores_the_full_collection() {
    let (_source_tx, source_rx) =
        watch::channel(ready(vec![album("Alps"), album("Beach")]));

    let searcher = AlbumSearcher::new(source_rx, Duration::from_millis(250));
    let mut out = searcher.subscribe();

    searcher.set_term("alps");
    timeout(Duration::from_secs(5), out.changed())
        .await
        .expect("commit")
        .unwrap();
    assert_eq!(out.borrow_and_update().albums.len(), 1);

    searcher.set_term("   ");
    timeout(Duration::from_secs(5), out.changed())
        .await
        .expect("commit")
        .unwrap();
    let searched = out.borrow_and_update().clone();
    assert!(!searched.state.is_active());
    assert_eq!(searched.albums.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn committed_term_reapplies_to_new_snapshots() {
    let (source_tx, source_rx) = watch::channel(ready(vec![album("Beach")]));

    let searcher = AlbumSearcher::new(source_rx, Duration::from_millis(250));
    let mut out = searcher.subscribe();

    searcher.set_term("beach");
    timeout(Duration::from_secs(5), out.changed())
        .await
        .expect("commit")
        .unwrap();
    assert_eq!(out.borrow_and_update().albums.len(), 1);

    // The source publishes a new snapshot: the filter re-evaluates against
    // it with the already-committed term.
    source_tx
        .send(ready(vec![album("Beach"), album("Beach House"), album("Alps")]))
        .unwrap();

    timeout(Duration::from_secs(5), out.changed())
        .await
        .expect("recompute on new snapshot")
        .unwrap();
    let searched = out.borrow_and_update().clone();
    assert_eq!(searched.state.raw_term, "beach");
    let titles: Vec<_> = searched.albums.iter().map(|a| a.title()).collect();
    assert_eq!(titles, ["Beach", "Beach House"]);
}

// ============================================================================
// Sections
// ============================================================================

#[tokio::test(start_paused = true)]
async fn search_hides_and_restores_the_smart_section() {
    let (_smart_tx, smart_rx) = watch::channel(ready(vec![album("Videos")]));
    let (_user_tx, user_rx) = watch::channel(ready(vec![album("Trips"), album("Beach")]));

    let config = BrowseConfig::builder().build().unwrap();
    let browser = AlbumsBrowser::new(smart_rx, user_rx, GateLoader::immediate(), &config);
    let mut out = browser.subscribe();

    let initial = browser.current();
    assert_eq!(initial.sections.len(), 2);

    browser.set_search_term("trips");
    timeout(Duration::from_secs(5), out.changed())
        .await
        .expect("search commit")
        .unwrap();
    let searching = out.borrow_and_update().clone();
    assert!(searching.section(SectionKind::SmartAlbums).is_none());
    let user = searching.section(SectionKind::UserAlbums).unwrap();
    assert_eq!(user.album_count(), 1);
    assert_eq!(user.albums[0].title(), "Trips");

    browser.set_search_term("");
    timeout(Duration::from_secs(5), out.changed())
        .await
        .expect("blank commit")
        .unwrap();
    let restored = out.borrow_and_update().clone();
    assert_eq!(restored.sections.len(), 2);
    assert!(restored.section(SectionKind::SmartAlbums).is_some());
    assert_eq!(
        restored.section(SectionKind::UserAlbums).unwrap().album_count(),
        2
    );
}

// ============================================================================
// Thumbnails
// ============================================================================

#[tokio::test]
async fn thumbnail_request_resolves_for_key_item() {
    let (_smart_tx, smart_rx) = watch::channel(ready(vec![]));
    let (_user_tx, user_rx) = watch::channel(ready(vec![]));
    let loader = GateLoader::immediate();

    let config = BrowseConfig::builder().build().unwrap();
    let browser = AlbumsBrowser::new(smart_rx, user_rx, loader.clone(), &config);

    let trips = album("Trips");
    let task = browser
        .request_thumbnail(&trips, ThumbnailSpec::new(160, 160))
        .expect("non-empty album has a key item");

    let image = task.into_result().await.expect("not cancelled").unwrap();
    assert_eq!(image.item.as_str(), "trips-key");
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancelled_thumbnail_request_has_no_effect() {
    let (_smart_tx, smart_rx) = watch::channel(ready(vec![]));
    let (_user_tx, user_rx) = watch::channel(ready(vec![]));
    let gate = Arc::new(Notify::new());
    let loader = GateLoader::gated(gate.clone());

    let config = BrowseConfig::builder().build().unwrap();
    let browser = AlbumsBrowser::new(smart_rx, user_rx, loader.clone(), &config);

    let trips = album("Trips");
    let task = browser
        .request_thumbnail(&trips, ThumbnailSpec::new(160, 160))
        .unwrap();

    // Cancel while the load is still blocked on the gate. The load future
    // is dropped without completing, so nothing is delivered.
    task.cancel();

    assert!(task.into_result().await.is_none());
    assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_album_has_no_thumbnail_request() {
    let (_smart_tx, smart_rx) = watch::channel(ready(vec![]));
    let (_user_tx, user_rx) = watch::channel(ready(vec![]));

    let config = BrowseConfig::builder().build().unwrap();
    let browser = AlbumsBrowser::new(smart_rx, user_rx, GateLoader::immediate(), &config);

    let empty = Arc::new(FetchedAlbum::empty(AlbumDescriptor::new(
        "empty",
        "Empty",
        AlbumKind::User,
    )));
    assert!(browser
        .request_thumbnail(&empty, ThumbnailSpec::new(160, 160))
        .is_none());
}
