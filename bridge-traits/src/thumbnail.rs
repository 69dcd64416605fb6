//! Thumbnail Loading Abstraction
//!
//! Resolves a media item into thumbnail pixel data. Decoding and caching
//! policy belong to the platform implementation; the core issues
//! fire-and-forget requests and cancels them when a consumer rebinds.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::library::{ItemId, MediaItem};

/// How the thumbnail should be scaled into the requested pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    /// Fill the target rect, cropping overflow.
    AspectFill,
    /// Fit inside the target rect, letterboxing as needed.
    AspectFit,
}

/// Requested thumbnail geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSpec {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Scaling mode.
    pub mode: ScaleMode,
}

impl ThumbnailSpec {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            mode: ScaleMode::AspectFill,
        }
    }

    pub fn with_mode(mut self, mode: ScaleMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Decoded thumbnail returned by a loader.
#[derive(Debug, Clone)]
pub struct ThumbnailImage {
    /// Item the thumbnail belongs to.
    pub item: ItemId,
    /// Encoded pixel data (format is the loader's choice).
    pub data: Bytes,
    /// Actual width in pixels.
    pub width: u32,
    /// Actual height in pixels.
    pub height: u32,
}

/// Thumbnail loader trait.
///
/// Implementations must not cache on behalf of the core and must be safe
/// to call concurrently; the core never awaits a load on the
/// consumer-facing side.
#[async_trait]
pub trait ThumbnailLoader: Send + Sync {
    /// Load a thumbnail for the given item.
    async fn load_thumbnail(&self, item: &MediaItem, spec: &ThumbnailSpec) -> Result<ThumbnailImage>;
}
