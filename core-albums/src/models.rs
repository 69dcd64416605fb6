//! Album entity model.
//!
//! A [`FetchedAlbum`] is an album descriptor together with its fetched,
//! ordered item contents. Entities are immutable once constructed and are
//! always handled as `Arc<FetchedAlbum>` so downstream consumers can use
//! pointer identity to detect unchanged rows.

use bridge_traits::library::{AlbumDescriptor, AlbumId, ContentChange, MediaItem};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An album and its fetched item contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedAlbum {
    /// Collection descriptor.
    pub descriptor: AlbumDescriptor,
    /// Item contents, in the album's fetch order.
    pub items: Vec<MediaItem>,
}

impl FetchedAlbum {
    pub fn new(descriptor: AlbumDescriptor, items: Vec<MediaItem>) -> Self {
        Self { descriptor, items }
    }

    /// An album with no contents; the fail-open result of a failed fetch.
    pub fn empty(descriptor: AlbumDescriptor) -> Self {
        Self {
            descriptor,
            items: Vec::new(),
        }
    }

    pub fn id(&self) -> &AlbumId {
        &self.descriptor.id
    }

    pub fn title(&self) -> &str {
        &self.descriptor.title
    }

    /// The representative item for thumbnails: first item by album order.
    pub fn key_item(&self) -> Option<&MediaItem> {
        self.items.first()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Applies per-album change details.
    ///
    /// Returns `None` if the album itself was deleted. Returns a clone of
    /// the *same* `Arc` (no new allocation) when nothing relevant changed,
    /// so identity comparisons downstream detect no-ops.
    pub fn apply_change(self: &Arc<Self>, change: &ContentChange) -> Option<Arc<FetchedAlbum>> {
        if change.deleted {
            return None;
        }

        if change.is_noop() {
            return Some(Arc::clone(self));
        }

        let descriptor = change
            .descriptor
            .clone()
            .unwrap_or_else(|| self.descriptor.clone());
        let items = change.items.clone().unwrap_or_else(|| self.items.clone());

        Some(Arc::new(FetchedAlbum { descriptor, items }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::library::AlbumKind;

    fn album(id: &str, title: &str, item_ids: &[&str]) -> Arc<FetchedAlbum> {
        let items = item_ids
            .iter()
            .enumerate()
            .map(|(i, id)| MediaItem::new(*id, i as i64))
            .collect();
        Arc::new(FetchedAlbum::new(
            AlbumDescriptor::new(id, title, AlbumKind::User),
            items,
        ))
    }

    #[test]
    fn key_item_is_first_by_album_order() {
        let album = album("a", "Trips", &["first", "second"]);
        assert_eq!(album.key_item().unwrap().id.as_str(), "first");

        let empty = album_empty();
        assert!(empty.key_item().is_none());
        assert!(empty.is_empty());
    }

    fn album_empty() -> Arc<FetchedAlbum> {
        Arc::new(FetchedAlbum::empty(AlbumDescriptor::new(
            "e",
            "Empty",
            AlbumKind::User,
        )))
    }

    #[test]
    fn noop_change_returns_same_instance() {
        let album = album("a", "Trips", &["x"]);
        let updated = album.apply_change(&ContentChange::default()).unwrap();
        assert!(Arc::ptr_eq(&album, &updated));
    }

    #[test]
    fn deleted_change_returns_none() {
        let album = album("a", "Trips", &["x"]);
        let change = ContentChange {
            deleted: true,
            ..Default::default()
        };
        assert!(album.apply_change(&change).is_none());
    }

    #[test]
    fn retitle_keeps_items_and_replaces_instance() {
        let album = album("a", "Trips", &["x", "y"]);
        let change = ContentChange {
            descriptor: Some(AlbumDescriptor::new("a", "Vacations", AlbumKind::User)),
            ..Default::default()
        };

        let updated = album.apply_change(&change).unwrap();
        assert!(!Arc::ptr_eq(&album, &updated));
        assert_eq!(updated.title(), "Vacations");
        assert_eq!(updated.items, album.items);
    }

    #[test]
    fn album_serialization_round_trip() {
        let album = album("a", "Trips", &["x", "y"]);

        let json = serde_json::to_string(album.as_ref()).unwrap();
        assert!(json.contains("Trips"));

        let deserialized: FetchedAlbum = serde_json::from_str(&json).unwrap();
        assert_eq!(&deserialized, album.as_ref());
    }

    #[test]
    fn content_change_replaces_items() {
        let album = album("a", "Trips", &["x"]);
        let change = ContentChange {
            items: Some(vec![MediaItem::new("y", 0), MediaItem::new("z", 1)]),
            ..Default::default()
        };

        let updated = album.apply_change(&change).unwrap();
        assert_eq!(updated.len(), 2);
        assert_eq!(updated.key_item().unwrap().id.as_str(), "y");
        assert_eq!(updated.title(), "Trips");
    }
}
