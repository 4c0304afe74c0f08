//! At-most-one emphasis per highlighter.
//!
//! The highlighter never aliases live style state: before emphasizing it
//! captures a snapshot (a copy) of everything it is about to change, and on
//! revert it writes that snapshot back. What "style state" means is up to the
//! [`EmphasisTarget`]: uniforms of a set of meshes, redrawn marker geometry,
//! an outline filter on a sprite.

/// Something a [`Highlighter`] can emphasize and restore.
pub trait EmphasisTarget {
    /// Identifies what to emphasize (a feature id, a set of features, ...).
    type Key: Clone + PartialEq;
    /// Pre-emphasis state needed to restore the key exactly.
    type Snapshot;

    /// Copy the current style of `key`. `None` means there is nothing to
    /// emphasize (unknown key, filtered out, selected, ...).
    fn capture(&self, key: &Self::Key) -> Option<Self::Snapshot>;

    /// Apply emphasis to `key`.
    fn emphasize(&mut self, key: &Self::Key);

    /// Write a captured snapshot back.
    fn restore(&mut self, key: &Self::Key, snapshot: Self::Snapshot);
}

#[derive(Debug)]
struct Cached<K, S> {
    key: K,
    snapshot: S,
}

/// Tracks the single emphasized key and its snapshot.
#[derive(Debug)]
pub struct Highlighter<K, S> {
    cached: Option<Cached<K, S>>,
}

impl<K, S> Default for Highlighter<K, S> {
    fn default() -> Self {
        Self { cached: None }
    }
}

impl<K: Clone + PartialEq, S> Highlighter<K, S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently emphasized key.
    pub fn current(&self) -> Option<&K> {
        self.cached.as_ref().map(|c| &c.key)
    }

    pub fn is_active(&self) -> bool {
        self.cached.is_some()
    }

    /// Revert any previous emphasis, then emphasize `key`.
    ///
    /// Returns `true` if `key` is now emphasized. When the target has nothing
    /// to capture for `key`, the previous emphasis is still reverted.
    pub fn highlight<T>(&mut self, target: &mut T, key: K) -> bool
    where
        T: EmphasisTarget<Key = K, Snapshot = S>,
    {
        self.revert(target);
        let Some(snapshot) = target.capture(&key) else {
            return false;
        };
        target.emphasize(&key);
        self.cached = Some(Cached { key, snapshot });
        true
    }

    /// Restore the cached key. Returns `false` when nothing was cached.
    pub fn revert<T>(&mut self, target: &mut T) -> bool
    where
        T: EmphasisTarget<Key = K, Snapshot = S>,
    {
        let Some(cached) = self.cached.take() else {
            return false;
        };
        target.restore(&cached.key, cached.snapshot);
        true
    }

    /// Drop the cache without restoring, for when the target itself was
    /// cleared.
    pub fn forget(&mut self) {
        self.cached = None;
    }
}
