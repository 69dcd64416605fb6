//! Debounced album search.
//!
//! An [`AlbumSearcher`] consumes an unbounded stream of raw search-term
//! updates and the snapshot stream of a synchronizer, and publishes an
//! order-preserving filtered view. Terms are debounced: a held term is
//! discarded when a newer one arrives inside the quiescence window, so
//! only the most recent term after a quiet period is acted on. The filter
//! is re-evaluated on the later of debounce expiry and a new source
//! snapshot, always against the most recent available collection.

use core_albums::{AlbumsSnapshot, FetchedAlbum};
use serde::{Deserialize, Serialize};
use std::future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Current search input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchState {
    /// The term as typed.
    pub raw_term: String,
    /// Folded term used for matching; `None` when the trimmed term is
    /// empty, meaning "no filter".
    pub normalized: Option<String>,
}

impl SearchState {
    pub fn new(raw_term: impl Into<String>) -> Self {
        let raw_term = raw_term.into();
        let normalized = normalize_term(&raw_term);
        Self {
            raw_term,
            normalized,
        }
    }

    /// True when a non-blank term is set.
    pub fn is_active(&self) -> bool {
        self.normalized.is_some()
    }
}

/// Folds text for matching: NFD decomposition, combining marks stripped,
/// lowercased. "CAFÉ" and "café" fold to the same string.
pub fn fold_for_search(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalizes a raw term; `None` when it is blank after trimming.
pub fn normalize_term(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(fold_for_search(trimmed))
    }
}

/// Order-preserving subsequence of albums whose title matches the term.
/// A stable filter: matches keep their relative source order.
pub fn filter_albums(
    albums: &[Arc<FetchedAlbum>],
    state: &SearchState,
) -> Vec<Arc<FetchedAlbum>> {
    match &state.normalized {
        None => albums.to_vec(),
        Some(term) => albums
            .iter()
            .filter(|album| fold_for_search(album.title()).contains(term.as_str()))
            .cloned()
            .collect(),
    }
}

/// Published output of a searcher.
#[derive(Debug, Clone)]
pub struct SearchedAlbums {
    /// The committed search state the view was filtered with.
    pub state: SearchState,
    /// Filtered albums, in source order.
    pub albums: Vec<Arc<FetchedAlbum>>,
    /// Mirrors the source synchronizer's loading flag.
    pub is_loading: bool,
}

/// Debounced search filter over one synchronizer's snapshot stream.
///
/// Dropping the searcher cancels its worker.
pub struct AlbumSearcher {
    terms: mpsc::UnboundedSender<String>,
    output: watch::Receiver<SearchedAlbums>,
    cancel: CancellationToken,
}

impl AlbumSearcher {
    pub fn new(source: watch::Receiver<AlbumsSnapshot>, debounce: Duration) -> Self {
        let mut source = source;
        let (terms, term_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let snapshot = source.borrow_and_update().clone();
        let initial = SearchedAlbums {
            state: SearchState::default(),
            albums: snapshot.albums,
            is_loading: snapshot.is_loading,
        };
        let (out_tx, output) = watch::channel(initial);

        let worker = SearchWorker {
            source,
            terms: term_rx,
            out: out_tx,
            debounce,
            cancel: cancel.clone(),
        };
        tokio::spawn(worker.run());

        Self {
            terms,
            output,
            cancel,
        }
    }

    /// Submits a raw term update. The update takes effect after the
    /// debounce window, unless a newer term supersedes it first.
    pub fn set_term(&self, raw_term: impl Into<String>) {
        self.terms.send(raw_term.into()).ok();
    }

    /// A receiver observing every published filtered view.
    pub fn subscribe(&self) -> watch::Receiver<SearchedAlbums> {
        self.output.clone()
    }

    /// The currently published filtered view.
    pub fn current(&self) -> SearchedAlbums {
        self.output.borrow().clone()
    }

    /// Stops the worker. Also happens on drop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for AlbumSearcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct SearchWorker {
    source: watch::Receiver<AlbumsSnapshot>,
    terms: mpsc::UnboundedReceiver<String>,
    out: watch::Sender<SearchedAlbums>,
    debounce: Duration,
    cancel: CancellationToken,
}

impl SearchWorker {
    async fn run(mut self) {
        let mut state = SearchState::default();
        // The held term and its quiescence deadline.
        let mut pending: Option<(String, Instant)> = None;

        loop {
            let deadline = pending.as_ref().map(|(_, deadline)| *deadline);

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                term = self.terms.recv() => match term {
                    Some(raw_term) => {
                        // A newer term discards the held one and restarts
                        // the window.
                        pending = Some((raw_term, Instant::now() + self.debounce));
                    }
                    None => break,
                },
                _ = async {
                    match deadline {
                        Some(deadline) => sleep_until(deadline).await,
                        None => future::pending().await,
                    }
                } => {
                    if let Some((raw_term, _)) = pending.take() {
                        state = SearchState::new(raw_term);
                        debug!(term = %state.raw_term, active = state.is_active(), "search term committed");
                        self.recompute(&state);
                    }
                }
                changed = self.source.changed() => match changed {
                    Ok(()) => self.recompute(&state),
                    Err(_) => break,
                },
            }
        }
    }

    fn recompute(&mut self, state: &SearchState) {
        let snapshot = self.source.borrow_and_update().clone();
        let albums = filter_albums(&snapshot.albums, state);
        self.out
            .send(SearchedAlbums {
                state: state.clone(),
                albums,
                is_loading: snapshot.is_loading,
            })
            .ok();
    }
}
