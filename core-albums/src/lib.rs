//! # Album Synchronization Module
//!
//! Maintains a live, incrementally-updated index of album collections
//! mirrored from an external media library.
//!
//! ## Overview
//!
//! This crate is the synchronization engine of the workspace:
//! - Fetch every album of a collection once, eagerly, on a background task
//! - Apply library change notifications incrementally in O(change size)
//! - Preserve per-album entity identity across updates so diff-based
//!   consumers never reload unchanged rows
//! - Publish immutable snapshots over a single-writer watch channel
//!
//! ## Components
//!
//! - **Album Entity** (`models`): [`FetchedAlbum`], an immutable album
//!   descriptor plus its fetched item contents
//! - **Diff Engine** (`mapped`): [`MappedCollection`], an index-aligned
//!   raw/derived pair updated element-wise from change sets
//! - **Synchronizer** (`synchronizer`): [`AlbumSynchronizer`], the worker
//!   that owns a collection, serializes updates and publishes snapshots

pub mod error;
pub mod mapped;
pub mod models;
pub mod synchronizer;

pub use error::{AlbumsError, Result};
pub use mapped::MappedCollection;
pub use models::FetchedAlbum;
pub use synchronizer::{AlbumSynchronizer, AlbumsSnapshot};
