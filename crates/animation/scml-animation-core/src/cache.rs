//! Memoised frame for the last queried instant.

use crate::frame::Frame;
use crate::ids::{AnimId, EntityId, KeyId};
use crate::transform::Transform;

/// Everything a frame depends on. Any field differing from the stored key
/// makes the cached frame stale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CacheKey {
    pub entity: EntityId,
    pub animation: AnimId,
    pub key: KeyId,
    pub time: u32,
    pub base: Transform,
}

/// Single-entry frame cache owned by a playback instance.
#[derive(Clone, Debug, Default)]
pub struct TransformCache {
    key: Option<CacheKey>,
    frame: Frame,
    rebuilds: u64,
}

impl TransformCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn should_rebuild(&self, key: &CacheKey) -> bool {
        self.key.as_ref() != Some(key)
    }

    /// Return the cached frame for `key`, rebuilding it with `build` on a miss.
    /// `build` receives a cleared frame to fill.
    pub fn get_or_rebuild(&mut self, key: CacheKey, build: impl FnOnce(&mut Frame)) -> &Frame {
        if self.should_rebuild(&key) {
            self.rebuild(key, build);
        }
        &self.frame
    }

    /// Rebuild unconditionally, storing `key` for later hits.
    pub fn rebuild(&mut self, key: CacheKey, build: impl FnOnce(&mut Frame)) -> &Frame {
        self.frame.clear();
        build(&mut self.frame);
        self.key = Some(key);
        self.rebuilds += 1;
        &self.frame
    }

    /// Forget the stored key; the next query rebuilds.
    #[inline]
    pub fn invalidate(&mut self) {
        self.key = None;
    }

    /// Last built frame, stale or not.
    #[inline]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Number of rebuilds since creation.
    #[inline]
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}
