//! # Album Synchronizer
//!
//! Orchestrates the initial fetch and change-driven incremental updates of
//! one album collection, publishing immutable snapshots.
//!
//! ## Overview
//!
//! An [`AlbumSynchronizer`] owns a background worker task per collection:
//! - Subscribe to provider change notifications before the initial fetch
//!   so no delta is missed
//! - Eagerly fetch every album once, off the consumer-facing side
//! - Apply each notification incrementally through the diff engine,
//!   strictly serialized in receipt order
//! - Publish finished snapshots over a `watch` channel; the current
//!   published snapshot is the only shared state and is replaced
//!   atomically, never mutated in place
//!
//! Two collection shapes exist: user albums (dynamic membership, full diff
//! machinery) and smart albums (fixed caller-supplied membership; only
//! per-album content deltas ever apply). Independent synchronizers run
//! fully in parallel.
//!
//! ## Failure model
//!
//! Provider fetch failures degrade to empty, internally consistent results
//! (fail-open). A change set that breaches the index contract is fatal for
//! the owning synchronizer: it stops applying further updates and leaves
//! the last good snapshot published.
//!
//! ## Usage
//!
//! ```ignore
//! use core_albums::AlbumSynchronizer;
//! use core_runtime::config::BrowseConfig;
//! use std::sync::Arc;
//!
//! # async fn example(provider: Arc<dyn bridge_traits::LibraryProvider>) {
//! let config = BrowseConfig::builder().build().unwrap();
//! let sync = AlbumSynchronizer::user_albums(provider, &config);
//!
//! let mut snapshots = sync.subscribe();
//! snapshots.changed().await.ok();
//! let snapshot = snapshots.borrow().clone();
//! println!("{} albums", snapshot.albums.len());
//! # }
//! ```

use crate::error::{AlbumsError, Result};
use crate::mapped::MappedCollection;
use crate::models::FetchedAlbum;
use bridge_traits::library::{
    AlbumDescriptor, AlbumId, AlbumKind, AlbumSort, ChangeNotification, ChangeSet, FetchOptions,
    LibraryProvider,
};
use core_runtime::config::BrowseConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

/// Immutable published state of one album collection.
#[derive(Debug, Clone)]
pub struct AlbumsSnapshot {
    /// Album entities in collection order, post-filtered by the
    /// exclude-empty setting.
    pub albums: Vec<Arc<FetchedAlbum>>,
    /// True until the initial fetch has published.
    pub is_loading: bool,
}

impl Default for AlbumsSnapshot {
    fn default() -> Self {
        Self {
            albums: Vec::new(),
            is_loading: true,
        }
    }
}

type AlbumCollection = MappedCollection<AlbumDescriptor, FetchedAlbum>;

/// How the worker determines collection membership.
enum Membership {
    /// Caller-supplied descriptor list; membership never changes, only
    /// per-album contents do.
    Fixed(Vec<AlbumDescriptor>),
    /// Membership mirrors the provider's descriptor list.
    Dynamic { sort: AlbumSort },
}

/// Live synchronizer for one album collection.
///
/// Dropping the synchronizer cancels its worker; the worker never outlives
/// the subscription it was created with.
pub struct AlbumSynchronizer {
    snapshot: watch::Receiver<AlbumsSnapshot>,
    cancel: CancellationToken,
}

impl AlbumSynchronizer {
    /// Synchronizer for the dynamic user-album collection.
    pub fn user_albums(provider: Arc<dyn LibraryProvider>, config: &BrowseConfig) -> Self {
        Self::spawn(
            provider,
            Membership::Dynamic {
                sort: config.user_album_sort,
            },
            config.fetch_options(AlbumKind::User),
            config.include_empty_albums,
            "user-albums",
        )
    }

    /// Synchronizer for the fixed smart-album collection configured in
    /// `config.smart_albums`. The given order is preserved exactly.
    pub fn smart_albums(provider: Arc<dyn LibraryProvider>, config: &BrowseConfig) -> Self {
        Self::spawn(
            provider,
            Membership::Fixed(config.smart_albums.clone()),
            config.fetch_options(AlbumKind::Smart),
            config.include_empty_albums,
            "smart-albums",
        )
    }

    fn spawn(
        provider: Arc<dyn LibraryProvider>,
        membership: Membership,
        options: FetchOptions,
        include_empty: bool,
        label: &'static str,
    ) -> Self {
        let (tx, rx) = watch::channel(AlbumsSnapshot::default());
        let cancel = CancellationToken::new();

        // Subscribe before the initial fetch so notifications arriving
        // mid-fetch are queued, not lost.
        let changes = provider.subscribe_changes();

        let worker = SyncWorker {
            provider,
            membership,
            options,
            include_empty,
            changes,
            tx,
            cancel: cancel.clone(),
            label,
        };
        tokio::spawn(worker.run());

        Self {
            snapshot: rx,
            cancel,
        }
    }

    /// A receiver observing every published snapshot, in publish order.
    pub fn subscribe(&self) -> watch::Receiver<AlbumsSnapshot> {
        self.snapshot.clone()
    }

    /// The currently published snapshot.
    pub fn current(&self) -> AlbumsSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Stops the worker. Also happens on drop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for AlbumSynchronizer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct SyncWorker {
    provider: Arc<dyn LibraryProvider>,
    membership: Membership,
    options: FetchOptions,
    include_empty: bool,
    changes: broadcast::Receiver<ChangeNotification>,
    tx: watch::Sender<AlbumsSnapshot>,
    cancel: CancellationToken,
    label: &'static str,
}

impl SyncWorker {
    #[instrument(skip(self), fields(collection = self.label))]
    async fn run(mut self) {
        let mut collection = self.full_fetch().await;
        debug!(albums = collection.len(), "initial fetch complete");
        self.publish(&collection);

        // Set after a change-set contract breach: the last good snapshot
        // stays published and no further deltas are applied.
        let mut suspended = false;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                notification = self.changes.recv() => match notification {
                    Ok(notification) => {
                        if suspended {
                            debug!("updates suspended, dropping notification");
                            continue;
                        }
                        match self.apply_notification(&collection, &notification).await {
                            Ok(Some(updated)) => {
                                collection = updated;
                                self.publish(&collection);
                            }
                            Ok(None) => {
                                debug!("notification does not affect this collection");
                            }
                            Err(e) => {
                                error!(error = %e, "inconsistent change set, suspending updates");
                                suspended = true;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        if suspended {
                            continue;
                        }
                        warn!(missed, "change notifications lost, resynchronizing");
                        collection = self.full_fetch().await;
                        self.publish(&collection);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    }

    /// Fetches the whole collection from scratch. Fail-open: provider
    /// errors degrade to empty results.
    async fn full_fetch(&self) -> AlbumCollection {
        let descriptors = match &self.membership {
            Membership::Fixed(descriptors) => descriptors.clone(),
            Membership::Dynamic { sort } => match self
                .provider
                .fetch_album_descriptors(AlbumKind::User, *sort)
                .await
            {
                Ok(descriptors) => descriptors,
                Err(e) => {
                    warn!(error = %e, "descriptor fetch failed, degrading to empty collection");
                    Vec::new()
                }
            },
        };

        let mut by_id: HashMap<AlbumId, Arc<FetchedAlbum>> =
            HashMap::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            by_id.insert(descriptor.id.clone(), self.fetch_album(descriptor).await);
        }

        MappedCollection::new(descriptors, |descriptor| {
            by_id
                .get(&descriptor.id)
                .cloned()
                .unwrap_or_else(|| Arc::new(FetchedAlbum::empty(descriptor.clone())))
        })
    }

    /// Fetches one album's contents. Fail-open to an empty entity.
    async fn fetch_album(&self, descriptor: &AlbumDescriptor) -> Arc<FetchedAlbum> {
        match self.provider.fetch_items(descriptor, &self.options).await {
            Ok(items) => Arc::new(FetchedAlbum::new(descriptor.clone(), items)),
            Err(e) => {
                warn!(album = %descriptor.id, error = %e, "album fetch failed, degrading to empty");
                Arc::new(FetchedAlbum::empty(descriptor.clone()))
            }
        }
    }

    /// Applies one notification to the collection.
    ///
    /// Returns `Ok(None)` when the notification carries nothing relevant;
    /// no recomputation happened and nothing should be published.
    async fn apply_notification(
        &self,
        collection: &AlbumCollection,
        notification: &ChangeNotification,
    ) -> Result<Option<AlbumCollection>> {
        // Structural deltas only exist for dynamic membership; the fixed
        // smart list bypasses insert/remove/move handling entirely.
        let mut structure: ChangeSet<AlbumDescriptor> = match &self.membership {
            Membership::Dynamic { .. } => {
                notification.user_album_changes().cloned().unwrap_or_default()
            }
            Membership::Fixed(_) => ChangeSet::default(),
        };
        let list_changed = std::mem::take(&mut structure.changed);
        let has_structure = !structure.is_empty();

        // Content changes for albums this collection tracks.
        let relevant_content: Vec<AlbumId> = notification
            .content_changes()
            .filter(|(_, change)| !change.is_noop())
            .filter(|(id, _)| collection.position(|d| &d.id == *id).is_some())
            .map(|(id, _)| id.clone())
            .collect();

        if !has_structure && list_changed.is_empty() && relevant_content.is_empty() {
            return Ok(None);
        }

        // Entities for inserted descriptors are fetched up front so the
        // diff apply itself stays synchronous.
        let mut inserted_by_id: HashMap<AlbumId, Arc<FetchedAlbum>> = HashMap::new();
        for (_, descriptor) in &structure.inserted {
            inserted_by_id.insert(descriptor.id.clone(), self.fetch_album(descriptor).await);
        }

        // Step one: removals, insertions and moves. Identity of every
        // surviving entity is preserved.
        let intermediate = collection.apply_changes(
            &structure,
            |descriptor| {
                inserted_by_id
                    .get(&descriptor.id)
                    .cloned()
                    .unwrap_or_else(|| Arc::new(FetchedAlbum::empty(descriptor.clone())))
            },
            |_, old| old.clone(),
        )?;

        // Step two: resolve which final indices need recomputation.
        let mut changed_indices: Vec<usize> = Vec::new();
        for &index in &list_changed {
            if index >= intermediate.len() {
                return Err(AlbumsError::IndexOutOfRange {
                    index,
                    len: intermediate.len(),
                });
            }
            changed_indices.push(index);
        }
        for id in &relevant_content {
            // Albums removed by the same notification no longer resolve.
            if let Some(index) = intermediate.position(|d| &d.id == id) {
                if !changed_indices.contains(&index) {
                    changed_indices.push(index);
                }
            }
        }
        changed_indices.sort_unstable();

        // Compute replacement entities. Content payloads apply
        // incrementally; a changed index without a payload is refetched.
        let mut updates: HashMap<AlbumId, Arc<FetchedAlbum>> = HashMap::new();
        let mut effective_changed: Vec<usize> = Vec::new();
        for &index in &changed_indices {
            let Some((descriptor, old)) = intermediate.get(index) else {
                return Err(AlbumsError::IndexOutOfRange {
                    index,
                    len: intermediate.len(),
                });
            };

            let updated = match notification.content_change(&descriptor.id) {
                Some(change) => match old.apply_change(change) {
                    Some(updated) => updated,
                    None => self.deleted_album(descriptor, old),
                },
                None => self.fetch_album(descriptor).await,
            };

            if !Arc::ptr_eq(&updated, old) {
                updates.insert(descriptor.id.clone(), updated);
                effective_changed.push(index);
            }
        }

        if effective_changed.is_empty() {
            if has_structure {
                return Ok(Some(intermediate));
            }
            return Ok(None);
        }

        let content_changes = ChangeSet {
            changed: effective_changed,
            ..Default::default()
        };
        let next = intermediate.apply_changes(
            &content_changes,
            |descriptor| Arc::new(FetchedAlbum::empty(descriptor.clone())),
            |descriptor, old| {
                updates
                    .get(&descriptor.id)
                    .cloned()
                    .unwrap_or_else(|| old.clone())
            },
        )?;

        Ok(Some(next))
    }

    /// Policy for an album whose backing collection was deleted.
    ///
    /// Fixed membership cannot drop the entry, so the album is kept and
    /// emptied. Dynamic membership routes deletions through the list
    /// change set; a content-only deletion keeps the entry until the list
    /// removal arrives.
    fn deleted_album(
        &self,
        descriptor: &AlbumDescriptor,
        old: &Arc<FetchedAlbum>,
    ) -> Arc<FetchedAlbum> {
        match &self.membership {
            Membership::Fixed(_) => {
                warn!(album = %descriptor.id, "fixed-membership album deleted, keeping it empty");
                Arc::new(FetchedAlbum::empty(descriptor.clone()))
            }
            Membership::Dynamic { .. } => {
                warn!(album = %descriptor.id, "deletion reported without list removal, keeping entry");
                old.clone()
            }
        }
    }

    /// Publishes the current collection, applying the exclude-empty
    /// post-filter. Only finished snapshots cross to consumers.
    fn publish(&self, collection: &AlbumCollection) {
        let albums: Vec<Arc<FetchedAlbum>> = collection
            .mapped()
            .iter()
            .filter(|album| self.include_empty || !album.is_empty())
            .cloned()
            .collect();

        self.tx
            .send(AlbumsSnapshot {
                albums,
                is_loading: false,
            })
            .ok();
    }
}
