//! Media Library Abstractions
//!
//! Provides the platform-agnostic contract for reading album collections and
//! their item contents, and for observing incremental library changes.
//!
//! The core tracks two collections per library: the dynamic list of user
//! albums and a fixed, caller-supplied list of smart albums. Providers
//! deliver changes as [`ChangeNotification`] values; a notification is
//! opaque to the core except through its per-collection accessors, which
//! return `None` when a collection is unaffected.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::broadcast;

use crate::error::Result;

// ============================================================================
// Identifiers
// ============================================================================

/// Stable identifier the external library assigns to a media item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier the external library assigns to an album collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlbumId(pub String);

impl AlbumId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Raw Data Model
// ============================================================================

/// A single media item inside an album.
///
/// Items are opaque to the core: an identifier plus the order key the
/// library assigned within the requested sort. Sequences returned by
/// [`LibraryProvider::fetch_items`] are already ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Library-assigned identifier.
    pub id: ItemId,
    /// Library-assigned order key within the album's ordering rule.
    pub order_key: i64,
}

impl MediaItem {
    pub fn new(id: impl Into<String>, order_key: i64) -> Self {
        Self {
            id: ItemId::new(id),
            order_key,
        }
    }
}

/// Album collection category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlbumKind {
    /// Library-curated album with fixed membership (e.g. "Videos",
    /// "Favorites"). Only its contents change.
    Smart,
    /// User-created album; membership is dynamic.
    User,
}

/// Descriptor for an album collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumDescriptor {
    /// Library-assigned identifier.
    pub id: AlbumId,
    /// User-visible title.
    pub title: String,
    /// Collection category.
    pub kind: AlbumKind,
    /// Creation date, if the library exposes one.
    pub created_at: Option<DateTime<Utc>>,
}

impl AlbumDescriptor {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: AlbumKind) -> Self {
        Self {
            id: AlbumId::new(id),
            title: title.into(),
            kind,
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

// ============================================================================
// Fetch Options
// ============================================================================

/// Media-type filter applied when fetching album contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaFilter {
    Video,
    LivePhoto,
    Any,
}

/// Ordering rule for items within an album.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemSort {
    /// The album's own custom order.
    AlbumOrder,
    CreationDateAscending,
    CreationDateDescending,
}

/// Ordering rule for album descriptor lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlbumSort {
    TitleAscending,
    CreationDateDescending,
}

/// Options for fetching an album's item contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    /// Media types to include.
    pub media: MediaFilter,
    /// Item ordering within the album.
    pub sort: ItemSort,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            media: MediaFilter::Any,
            sort: ItemSort::AlbumOrder,
        }
    }
}

// ============================================================================
// Change Model
// ============================================================================

/// Structured delta between two versions of an indexed collection.
///
/// Indices in `removed` refer to the old collection and must be listed in
/// ascending order (the core applies them descending so remaining indices
/// stay valid). Indices in `inserted` refer to the new collection and must
/// be ascending. `moved` pairs are `(from, to)` positions after removals
/// and insertions have been applied. `changed` indices refer to the final
/// collection and mark entries whose identity is unchanged but whose
/// content was updated.
///
/// The index groups are disjoint; a provider emitting the same index in
/// more than one group breaches the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet<T> {
    pub removed: Vec<usize>,
    pub inserted: Vec<(usize, T)>,
    pub moved: Vec<(usize, usize)>,
    pub changed: Vec<usize>,
}

impl<T> ChangeSet<T> {
    /// Returns true when the change set carries no deltas at all.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
            && self.inserted.is_empty()
            && self.moved.is_empty()
            && self.changed.is_empty()
    }
}

impl<T> Default for ChangeSet<T> {
    fn default() -> Self {
        Self {
            removed: Vec::new(),
            inserted: Vec::new(),
            moved: Vec::new(),
            changed: Vec::new(),
        }
    }
}

/// Per-album change details.
///
/// `None` fields mean "unchanged". A change with every field at its
/// default is a no-op and downstream entities preserve their identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentChange {
    /// Updated descriptor (e.g. the album was retitled).
    pub descriptor: Option<AlbumDescriptor>,
    /// Full replacement item sequence, already ordered.
    pub items: Option<Vec<MediaItem>>,
    /// The backing collection itself was deleted.
    pub deleted: bool,
}

impl ContentChange {
    /// True when nothing relevant changed.
    pub fn is_noop(&self) -> bool {
        self.descriptor.is_none() && self.items.is_none() && !self.deleted
    }
}

/// An opaque library change notification.
///
/// Providers construct notifications with the builder methods; the core
/// only reads them through the per-collection accessors, which return
/// `None` when the notification does not affect that collection.
///
/// # Example
///
/// ```
/// use bridge_traits::library::{AlbumId, ChangeNotification, ContentChange, MediaItem};
///
/// let note = ChangeNotification::new().with_content_change(
///     AlbumId::new("favorites"),
///     ContentChange {
///         items: Some(vec![MediaItem::new("item-1", 0)]),
///         ..Default::default()
///     },
/// );
///
/// assert!(note.user_album_changes().is_none());
/// assert!(note.content_change(&AlbumId::new("favorites")).is_some());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeNotification {
    user_albums: Option<ChangeSet<AlbumDescriptor>>,
    album_contents: HashMap<AlbumId, ContentChange>,
}

impl ChangeNotification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a delta for the user-album descriptor list.
    pub fn with_user_album_changes(mut self, changes: ChangeSet<AlbumDescriptor>) -> Self {
        self.user_albums = Some(changes);
        self
    }

    /// Attaches per-album content details.
    pub fn with_content_change(mut self, album: AlbumId, change: ContentChange) -> Self {
        self.album_contents.insert(album, change);
        self
    }

    /// Delta for the user-album list, if this notification affects it.
    pub fn user_album_changes(&self) -> Option<&ChangeSet<AlbumDescriptor>> {
        self.user_albums.as_ref()
    }

    /// Content details for one album, if this notification affects it.
    pub fn content_change(&self, album: &AlbumId) -> Option<&ContentChange> {
        self.album_contents.get(album)
    }

    /// All per-album content details carried by this notification.
    pub fn content_changes(&self) -> impl Iterator<Item = (&AlbumId, &ContentChange)> {
        self.album_contents.iter()
    }

    /// True when the notification carries no deltas for any collection.
    pub fn is_empty(&self) -> bool {
        self.user_albums.as_ref().is_none_or(ChangeSet::is_empty)
            && self.album_contents.is_empty()
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Read access to the external media library plus change subscription.
///
/// `fetch_items` and `fetch_album_descriptors` may block on platform I/O;
/// the core only calls them from background tasks. Both are fail-open at
/// the call sites: a provider error degrades to an empty collection rather
/// than surfacing to consumers.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::library::{AlbumKind, AlbumSort, FetchOptions, LibraryProvider};
///
/// async fn list_user_albums(provider: &dyn LibraryProvider) {
///     let descriptors = provider
///         .fetch_album_descriptors(AlbumKind::User, AlbumSort::TitleAscending)
///         .await
///         .unwrap_or_default();
///     for descriptor in &descriptors {
///         let items = provider
///             .fetch_items(descriptor, &FetchOptions::default())
///             .await
///             .unwrap_or_default();
///         println!("{}: {} items", descriptor.title, items.len());
///     }
/// }
/// ```
#[async_trait]
pub trait LibraryProvider: Send + Sync {
    /// Fetch the ordered item contents of an album.
    async fn fetch_items(
        &self,
        album: &AlbumDescriptor,
        options: &FetchOptions,
    ) -> Result<Vec<MediaItem>>;

    /// Fetch the ordered list of album descriptors of one kind.
    async fn fetch_album_descriptors(
        &self,
        kind: AlbumKind,
        sort: AlbumSort,
    ) -> Result<Vec<AlbumDescriptor>>;

    /// Subscribe to library change notifications.
    ///
    /// Each call returns an independent receiver. Dropping the receiver
    /// ends the subscription; there is no other teardown protocol.
    fn subscribe_changes(&self) -> broadcast::Receiver<ChangeNotification>;
}
