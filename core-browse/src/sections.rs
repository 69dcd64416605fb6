//! Sectioned presentation snapshots.
//!
//! An [`AlbumsBrowser`] combines the smart-album snapshot stream with the
//! searched user-album stream into an ordered list of sections, published
//! for diff-based consumers. Album descriptor ids give each row stable
//! identity across snapshots; consumers must not diff by structural
//! equality.

use crate::search::{AlbumSearcher, SearchState, SearchedAlbums};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::thumbnail::{ThumbnailImage, ThumbnailLoader, ThumbnailSpec};
use core_albums::{AlbumsSnapshot, FetchedAlbum};
use core_runtime::config::BrowseConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Section header of the user-album section.
pub const USER_ALBUMS_TITLE: &str = "My Albums";

/// Presentation grouping of one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    SmartAlbums,
    UserAlbums,
}

/// One ordered group of albums.
#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    /// User-visible header; the smart section is untitled.
    pub title: Option<String>,
    /// Album entities in display order.
    pub albums: Vec<Arc<FetchedAlbum>>,
    /// True until the backing synchronizer published its first snapshot.
    pub is_loading: bool,
}

impl Section {
    pub fn album_count(&self) -> usize {
        self.albums.len()
    }
}

/// Immutable sectioned output for the UI consumer.
#[derive(Debug, Clone)]
pub struct BrowseSnapshot {
    /// Ordered sections; the smart section is omitted entirely while a
    /// search term is active.
    pub sections: Vec<Section>,
    /// The search state the snapshot was built with.
    pub search: SearchState,
}

impl BrowseSnapshot {
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }
}

/// A cancellable, fire-and-forget thumbnail request.
///
/// The browser does not cache, dedupe or own request lifetime; a consumer
/// rebinding a row must cancel the previous request itself. A cancelled
/// request resolves to `None` and has no further effect.
pub struct ThumbnailTask {
    cancel: CancellationToken,
    handle: JoinHandle<Option<BridgeResult<ThumbnailImage>>>,
}

impl ThumbnailTask {
    /// Cancels the request. Safe to call after completion.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the outcome; `None` when the request was cancelled.
    pub async fn into_result(self) -> Option<BridgeResult<ThumbnailImage>> {
        self.handle.await.ok().flatten()
    }
}

/// Combines synchronizer outputs and search state into sectioned
/// snapshots.
///
/// Dropping the browser cancels its worker and searcher.
pub struct AlbumsBrowser {
    searcher: AlbumSearcher,
    output: watch::Receiver<BrowseSnapshot>,
    thumbnails: Arc<dyn ThumbnailLoader>,
    cancel: CancellationToken,
}

impl AlbumsBrowser {
    /// Builds a browser over the smart- and user-album snapshot streams.
    pub fn new(
        smart: watch::Receiver<AlbumsSnapshot>,
        user: watch::Receiver<AlbumsSnapshot>,
        thumbnails: Arc<dyn ThumbnailLoader>,
        config: &BrowseConfig,
    ) -> Self {
        let mut smart = smart;
        let searcher = AlbumSearcher::new(user, config.search_debounce);
        let mut searched = searcher.subscribe();
        let cancel = CancellationToken::new();

        let initial = build_snapshot(
            &smart.borrow_and_update().clone(),
            &searched.borrow_and_update().clone(),
        );
        let (out_tx, output) = watch::channel(initial);

        let worker = BrowseWorker {
            smart,
            searched,
            out: out_tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(worker.run());

        Self {
            searcher,
            output,
            thumbnails,
            cancel,
        }
    }

    /// Submits a raw search-term update (debounced).
    pub fn set_search_term(&self, raw_term: impl Into<String>) {
        self.searcher.set_term(raw_term);
    }

    /// A receiver observing every published sectioned snapshot.
    pub fn subscribe(&self) -> watch::Receiver<BrowseSnapshot> {
        self.output.clone()
    }

    /// The currently published sectioned snapshot.
    pub fn current(&self) -> BrowseSnapshot {
        self.output.borrow().clone()
    }

    /// Requests a thumbnail for an album's key item.
    ///
    /// Returns `None` for empty albums. The returned task is independent
    /// of every other request and of the snapshot stream.
    pub fn request_thumbnail(
        &self,
        album: &FetchedAlbum,
        spec: ThumbnailSpec,
    ) -> Option<ThumbnailTask> {
        let item = album.key_item()?.clone();
        let loader = Arc::clone(&self.thumbnails);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(item = %item.id, "thumbnail request cancelled");
                    None
                }
                result = loader.load_thumbnail(&item, &spec) => Some(result),
            }
        });

        Some(ThumbnailTask { cancel, handle })
    }

    /// Stops the worker. Also happens on drop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.searcher.shutdown();
    }
}

impl Drop for AlbumsBrowser {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct BrowseWorker {
    smart: watch::Receiver<AlbumsSnapshot>,
    searched: watch::Receiver<SearchedAlbums>,
    out: watch::Sender<BrowseSnapshot>,
    cancel: CancellationToken,
}

impl BrowseWorker {
    async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                changed = self.smart.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.publish();
                }
                changed = self.searched.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.publish();
                }
            }
        }
    }

    fn publish(&mut self) {
        let smart = self.smart.borrow_and_update().clone();
        let searched = self.searched.borrow_and_update().clone();
        self.out.send(build_snapshot(&smart, &searched)).ok();
    }
}

/// While a search term is active the smart section is omitted entirely;
/// search scopes user albums only.
fn build_snapshot(smart: &AlbumsSnapshot, searched: &SearchedAlbums) -> BrowseSnapshot {
    let mut sections = Vec::with_capacity(2);

    if !searched.state.is_active() {
        sections.push(Section {
            kind: SectionKind::SmartAlbums,
            title: None,
            albums: smart.albums.clone(),
            is_loading: smart.is_loading,
        });
    }

    sections.push(Section {
        kind: SectionKind::UserAlbums,
        title: Some(USER_ALBUMS_TITLE.to_string()),
        albums: searched.albums.clone(),
        is_loading: searched.is_loading,
    });

    BrowseSnapshot {
        sections,
        search: searched.state.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::library::{AlbumDescriptor, AlbumKind, MediaItem};

    fn album(title: &str) -> Arc<FetchedAlbum> {
        Arc::new(FetchedAlbum::new(
            AlbumDescriptor::new(title.to_lowercase(), title, AlbumKind::User),
            vec![MediaItem::new("item", 0)],
        ))
    }

    fn ready(albums: Vec<Arc<FetchedAlbum>>) -> AlbumsSnapshot {
        AlbumsSnapshot {
            albums,
            is_loading: false,
        }
    }

    #[test]
    fn snapshot_has_both_sections_without_search() {
        let searched = SearchedAlbums {
            state: SearchState::default(),
            albums: vec![album("Trips")],
            is_loading: false,
        };
        let snapshot = build_snapshot(&ready(vec![album("Videos")]), &searched);

        assert_eq!(snapshot.sections.len(), 2);
        assert_eq!(snapshot.sections[0].kind, SectionKind::SmartAlbums);
        assert_eq!(snapshot.sections[0].title, None);
        assert_eq!(snapshot.sections[1].kind, SectionKind::UserAlbums);
        assert_eq!(
            snapshot.sections[1].title.as_deref(),
            Some(USER_ALBUMS_TITLE)
        );
        assert_eq!(snapshot.sections[1].album_count(), 1);
    }

    #[test]
    fn smart_section_omitted_while_search_is_active() {
        let searched = SearchedAlbums {
            state: SearchState::new("trips"),
            albums: vec![album("Trips")],
            is_loading: false,
        };
        let snapshot = build_snapshot(&ready(vec![album("Videos")]), &searched);

        assert_eq!(snapshot.sections.len(), 1);
        assert_eq!(snapshot.sections[0].kind, SectionKind::UserAlbums);
        assert!(snapshot.section(SectionKind::SmartAlbums).is_none());
        assert!(snapshot.search.is_active());
    }

    #[test]
    fn loading_flags_are_carried_per_section() {
        let searched = SearchedAlbums {
            state: SearchState::default(),
            albums: Vec::new(),
            is_loading: true,
        };
        let smart = AlbumsSnapshot {
            albums: Vec::new(),
            is_loading: false,
        };
        let snapshot = build_snapshot(&smart, &searched);

        assert!(!snapshot.sections[0].is_loading);
        assert!(snapshot.sections[1].is_loading);
    }
}
