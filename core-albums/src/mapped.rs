//! Mapped-collection diff engine.
//!
//! A [`MappedCollection`] keeps a derived collection in strict index
//! correspondence with a raw indexed collection sourced from the provider.
//! The initial mapping is the expensive pass (one derivation per element);
//! afterwards change sets are applied element-wise in O(k) derivations,
//! where k is the size of the change, independent of collection size.
//!
//! Raw entries serve as identity keys: structural operations and `changed`
//! recomputation never alter a raw entry in place.
//!
//! The engine is pure and synchronous. Callers that need async derivation
//! (fetching an album) resolve entities before the apply and hand them in
//! through the `insert`/`update` closures.

use crate::error::{AlbumsError, Result};
use bridge_traits::library::ChangeSet;
use std::sync::Arc;

/// An ordered raw collection plus its index-aligned derived collection.
///
/// Invariants, checked on every construction and apply:
/// - `len(mapped) == len(raw)` at all times
/// - elements at indices untouched by an applied change set are
///   reference-identical (`Arc::ptr_eq`) to their pre-apply values
#[derive(Debug, Clone)]
pub struct MappedCollection<R, V> {
    raw: Vec<R>,
    mapped: Vec<Arc<V>>,
}

impl<R, V> MappedCollection<R, V> {
    /// Eagerly maps every raw element. This is the expensive initial pass.
    pub fn new<F>(raw: Vec<R>, mut map: F) -> Self
    where
        F: FnMut(&R) -> Arc<V>,
    {
        let mapped = raw.iter().map(&mut map).collect();
        Self { raw, mapped }
    }

    /// Builds a collection from pre-derived parts.
    ///
    /// Used when derivation is async and ran before construction. Fails if
    /// the parts are not index-aligned.
    pub fn from_parts(raw: Vec<R>, mapped: Vec<Arc<V>>) -> Result<Self> {
        if raw.len() != mapped.len() {
            return Err(AlbumsError::Consistency(format!(
                "raw/mapped length mismatch: {} != {}",
                raw.len(),
                mapped.len()
            )));
        }
        Ok(Self { raw, mapped })
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn raw(&self) -> &[R] {
        &self.raw
    }

    pub fn mapped(&self) -> &[Arc<V>] {
        &self.mapped
    }

    pub fn get(&self, index: usize) -> Option<(&R, &Arc<V>)> {
        Some((self.raw.get(index)?, self.mapped.get(index)?))
    }

    /// Index of the first raw element matching the predicate.
    pub fn position<P>(&self, predicate: P) -> Option<usize>
    where
        P: FnMut(&R) -> bool,
    {
        self.raw.iter().position(predicate)
    }

    /// Applies a change set, producing a new collection.
    ///
    /// Operations run in order:
    /// 1. remove indices, descending, so remaining indices stay valid
    /// 2. insert `(index, insert(&raw))` pairs, ascending
    /// 3. relocate moved entries by index, without re-derivation
    /// 4. replace entries at `changed` indices with `update(raw, old)`
    ///
    /// `removed` indices refer to the pre-apply collection; `inserted`,
    /// `moved` and `changed` indices refer to the collection as it stands
    /// when their step runs. `update` receives the previous derived value
    /// and may return the identical `Arc` to signal a no-op.
    ///
    /// Any out-of-range or duplicate removal index is an upstream contract
    /// breach and fails the whole apply; `self` is left untouched.
    pub fn apply_changes<F, G>(
        &self,
        changes: &ChangeSet<R>,
        mut insert: F,
        mut update: G,
    ) -> Result<Self>
    where
        R: Clone,
        F: FnMut(&R) -> Arc<V>,
        G: FnMut(&R, &Arc<V>) -> Arc<V>,
    {
        let mut raw = self.raw.clone();
        let mut mapped: Vec<Arc<V>> = self.mapped.clone();

        let mut removals = changes.removed.clone();
        removals.sort_unstable_by(|a, b| b.cmp(a));
        if removals.windows(2).any(|w| w[0] == w[1]) {
            return Err(AlbumsError::Consistency(
                "duplicate index in removed set".to_string(),
            ));
        }
        for &index in &removals {
            if index >= raw.len() {
                return Err(AlbumsError::IndexOutOfRange {
                    index,
                    len: raw.len(),
                });
            }
            raw.remove(index);
            mapped.remove(index);
        }

        for (index, entry) in &changes.inserted {
            if *index > raw.len() {
                return Err(AlbumsError::IndexOutOfRange {
                    index: *index,
                    len: raw.len(),
                });
            }
            let value = insert(entry);
            raw.insert(*index, entry.clone());
            mapped.insert(*index, value);
        }

        for &(from, to) in &changes.moved {
            if from >= raw.len() {
                return Err(AlbumsError::IndexOutOfRange {
                    index: from,
                    len: raw.len(),
                });
            }
            if to >= raw.len() {
                return Err(AlbumsError::IndexOutOfRange {
                    index: to,
                    len: raw.len(),
                });
            }
            let entry = raw.remove(from);
            let value = mapped.remove(from);
            raw.insert(to, entry);
            mapped.insert(to, value);
        }

        for &index in &changes.changed {
            if index >= raw.len() {
                return Err(AlbumsError::IndexOutOfRange {
                    index,
                    len: raw.len(),
                });
            }
            mapped[index] = update(&raw[index], &mapped[index]);
        }

        debug_assert_eq!(raw.len(), mapped.len());
        Ok(Self { raw, mapped })
    }
}
