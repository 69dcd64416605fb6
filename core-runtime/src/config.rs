//! # Browse Configuration Module
//!
//! Configuration for the album-index core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`BrowseConfig`] that holds every knob the synchronizers and the browse
//! layer read: the media-type filter, empty-album handling, sort rules,
//! the fixed smart-album descriptor list, and the search debounce window.
//! It enforces fail-fast validation so misconfiguration surfaces at build
//! time with an actionable message rather than as silent misbehavior later.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::BrowseConfig;
//! use bridge_traits::library::MediaFilter;
//!
//! let config = BrowseConfig::builder()
//!     .media(MediaFilter::Video)
//!     .include_empty_albums(false)
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use bridge_traits::library::{AlbumDescriptor, AlbumKind, AlbumSort, FetchOptions, ItemSort, MediaFilter};
use std::collections::HashSet;
use std::time::Duration;

/// Default quiescence window for the search debounce.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);

/// Configuration for the album-index core.
///
/// Use [`BrowseConfig::builder`] to construct instances.
#[derive(Debug, Clone)]
pub struct BrowseConfig {
    /// Media types included when fetching album contents.
    pub media: MediaFilter,

    /// Whether empty albums appear in published snapshots.
    pub include_empty_albums: bool,

    /// Ordering rule for the user-album descriptor list.
    pub user_album_sort: AlbumSort,

    /// Item ordering within user albums.
    pub user_item_sort: ItemSort,

    /// Item ordering within smart albums.
    pub smart_item_sort: ItemSort,

    /// Fixed smart-album descriptor list, in display order. Membership
    /// never changes at runtime; only per-album contents do.
    pub smart_albums: Vec<AlbumDescriptor>,

    /// Quiescence window for the search debounce.
    pub search_debounce: Duration,
}

impl BrowseConfig {
    /// Creates a new builder for constructing a `BrowseConfig`.
    pub fn builder() -> BrowseConfigBuilder {
        BrowseConfigBuilder::default()
    }

    /// Fetch options for album contents of the given kind.
    pub fn fetch_options(&self, kind: AlbumKind) -> FetchOptions {
        FetchOptions {
            media: self.media,
            sort: match kind {
                AlbumKind::Smart => self.smart_item_sort,
                AlbumKind::User => self.user_item_sort,
            },
        }
    }

    /// Validates the configuration.
    ///
    /// This checks:
    /// - The debounce window is non-zero and below the sanity ceiling
    /// - Every fixed smart-album descriptor has kind `Smart`
    /// - No duplicate ids in the fixed smart-album list
    pub fn validate(&self) -> Result<()> {
        if self.search_debounce.is_zero() {
            return Err(Error::Config(
                "Search debounce must be greater than zero. \
                 Use .search_debounce() to set a positive window."
                    .to_string(),
            ));
        }

        if self.search_debounce > Duration::from_secs(10) {
            return Err(Error::Config(
                "Search debounce exceeds maximum of 10 seconds".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for descriptor in &self.smart_albums {
            if descriptor.kind != AlbumKind::Smart {
                return Err(Error::Config(format!(
                    "Smart-album list contains non-smart descriptor '{}'",
                    descriptor.id
                )));
            }
            if !seen.insert(descriptor.id.clone()) {
                return Err(Error::Config(format!(
                    "Smart-album list contains duplicate descriptor '{}'",
                    descriptor.id
                )));
            }
        }

        Ok(())
    }
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            media: MediaFilter::Any,
            include_empty_albums: false,
            user_album_sort: AlbumSort::TitleAscending,
            user_item_sort: ItemSort::AlbumOrder,
            smart_item_sort: ItemSort::CreationDateDescending,
            smart_albums: Vec::new(),
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

/// Builder for [`BrowseConfig`] instances.
#[derive(Debug, Default)]
pub struct BrowseConfigBuilder {
    config: BrowseConfig,
}

impl BrowseConfigBuilder {
    /// Sets the media-type filter for album contents.
    ///
    /// Default: [`MediaFilter::Any`]
    pub fn media(mut self, media: MediaFilter) -> Self {
        self.config.media = media;
        self
    }

    /// Sets whether empty albums appear in published snapshots.
    ///
    /// Default: `false`
    pub fn include_empty_albums(mut self, include: bool) -> Self {
        self.config.include_empty_albums = include;
        self
    }

    /// Sets the ordering rule for the user-album list.
    ///
    /// Default: [`AlbumSort::TitleAscending`]
    pub fn user_album_sort(mut self, sort: AlbumSort) -> Self {
        self.config.user_album_sort = sort;
        self
    }

    /// Sets the item ordering within user albums.
    ///
    /// Default: [`ItemSort::AlbumOrder`]
    pub fn user_item_sort(mut self, sort: ItemSort) -> Self {
        self.config.user_item_sort = sort;
        self
    }

    /// Sets the item ordering within smart albums.
    ///
    /// Default: [`ItemSort::CreationDateDescending`]
    pub fn smart_item_sort(mut self, sort: ItemSort) -> Self {
        self.config.smart_item_sort = sort;
        self
    }

    /// Sets the fixed smart-album descriptor list, in display order.
    pub fn smart_albums(mut self, descriptors: Vec<AlbumDescriptor>) -> Self {
        self.config.smart_albums = descriptors;
        self
    }

    /// Sets the search debounce window.
    ///
    /// Default: 250 ms
    pub fn search_debounce(mut self, window: Duration) -> Self {
        self.config.search_debounce = window;
        self
    }

    /// Builds the final `BrowseConfig`, validating all settings.
    pub fn build(self) -> Result<BrowseConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
