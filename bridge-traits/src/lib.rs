//! # Host Bridge Traits
//!
//! Abstractions that must be implemented by the host platform's media store.
//!
//! ## Overview
//!
//! This crate defines the contract between the album-index core and the
//! platform-specific media library (Photos framework, MediaStore, a test
//! double, ...). The core never talks to the platform directly; it consumes
//! these traits plus the raw data model that crosses the boundary.
//!
//! ## Traits
//!
//! - [`LibraryProvider`](library::LibraryProvider) - Fetch album descriptors
//!   and item contents, subscribe to library change notifications
//! - [`ThumbnailLoader`](thumbnail::ThumbnailLoader) - Resolve a media item
//!   into thumbnail pixel data
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Platform implementations should convert platform-specific errors to
//! `BridgeError` and provide actionable messages.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so they can be shared
//! across async tasks behind an `Arc`.

pub mod error;
pub mod library;
pub mod thumbnail;

pub use error::{BridgeError, Result};
pub use library::{
    AlbumDescriptor, AlbumId, AlbumKind, AlbumSort, ChangeNotification, ChangeSet, ContentChange,
    FetchOptions, ItemId, ItemSort, LibraryProvider, MediaFilter, MediaItem,
};
pub use thumbnail::{ScaleMode, ThumbnailImage, ThumbnailLoader, ThumbnailSpec};
