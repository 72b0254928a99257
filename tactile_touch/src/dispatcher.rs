// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Target dispatch: partition each batch by the target each cursor lands on.
//!
//! ## Attribution
//!
//! The dispatcher keeps an ordered target list, back-most first (index 0) and
//! front-most last, mirroring z-order where a later insertion sits on top.
//! For every cursor:
//!
//! 1. Walk the targets from front-most to back-most.
//! 2. The first target whose [`Target::is_touched`] answers `true` wins.
//! 3. A cursor no target claims goes to the **root** key, which always exists
//!    and stands for the whole surface. No cursor is dropped.
//!
//! A target whose hit test fails is reported to the [`ErrorSink`] and treated
//! as not touched for that cursor; the walk continues behind it.
//!
//! ## Output
//!
//! One tagged [`CursorBatch`] per target that holds cursors this cycle, plus
//! one **empty** tagged batch per target that held cursors for the same user
//! on the previous cycle but holds none now. That last batch is what lets
//! recognizers see the release and settle. Targets removed from the list
//! after being touched still get their final empty batch.
//!
//! Within a cycle batches are delivered root first, then in list order
//! (back to front), then removed targets. The order is the same on every call
//! for the same configuration.
//!
//! ## Cycles and edits
//!
//! All batches derived from one input batch are delivered before the next
//! input batch is processed: cycles are serialized by an internal lock held
//! while forwarding. Downstream blocks must therefore not dispatch into the
//! same dispatcher re-entrantly. They may query it: [`TargetDispatcher::touched_by`]
//! already reflects the cycle in progress. They may also edit the target list:
//! every cycle works on a snapshot of the list taken when it starts, so an edit
//! made mid-cycle applies from the next cycle on.
//!
//! ```
//! use kurbo::{Rect, Size};
//! use tactile_touch::{Cursor, Region, TargetDispatcher};
//!
//! #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
//! enum Key { Root, Background, Button }
//!
//! let dispatcher = TargetDispatcher::new(Key::Root, Size::new(800.0, 600.0));
//! dispatcher
//!     .add_on_top(Key::Background, Region::new(Rect::new(0.0, 0.0, 800.0, 600.0)))
//!     .unwrap();
//! dispatcher
//!     .add_on_top(Key::Button, Region::new(Rect::new(0.0, 0.0, 100.0, 100.0)))
//!     .unwrap();
//!
//! assert_eq!(dispatcher.hit(&Cursor::new(1, 50.0, 50.0)), Key::Button);
//! assert_eq!(dispatcher.hit(&Cursor::new(1, 500.0, 500.0)), Key::Background);
//! assert_eq!(dispatcher.hit(&Cursor::new(1, 900.0, 900.0)), Key::Root);
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use hashbrown::HashMap;
use kurbo::Size;
use smallvec::SmallVec;
use tactile_pipeline::{Outlets, ProcessingBlock, SharedSink, Sink};

use crate::cursor::{Cursor, CursorBatch, TargetKey, UserId};
use crate::error::{ErrorSink, LogErrors, TouchError, TouchResult};
use crate::target::{SharedTarget, Target};

#[derive(Clone)]
struct TargetEntry<K> {
    key: K,
    target: SharedTarget,
}

type Touched<K> = SmallVec<[K; 4]>;

/// Partitions cursor batches by target and forwards one tagged batch per target.
pub struct TargetDispatcher<K: TargetKey> {
    root: K,
    surface: RwLock<Size>,
    targets: RwLock<Arc<[TargetEntry<K>]>>,
    /// Held for the whole cycle, forwarding included.
    cycle: Mutex<()>,
    /// Per user: targets that held cursors last cycle, in delivery order.
    touched: Mutex<HashMap<UserId, Touched<K>>>,
    outlets: Outlets<CursorBatch<K>>,
    errors: Arc<dyn ErrorSink>,
}

impl<K: TargetKey> TargetDispatcher<K> {
    /// Create a dispatcher whose root target covers `surface`.
    ///
    /// Errors are logged through [`LogErrors`] until another sink is set.
    pub fn new(root: K, surface: Size) -> Self {
        Self {
            root,
            surface: RwLock::new(surface),
            targets: RwLock::new(Arc::from(Vec::new())),
            cycle: Mutex::new(()),
            touched: Mutex::new(HashMap::new()),
            outlets: Outlets::new(),
            errors: Arc::new(LogErrors),
        }
    }

    /// Route isolated errors to `errors`.
    #[must_use]
    pub fn with_error_sink(mut self, errors: Arc<dyn ErrorSink>) -> Self {
        self.errors = errors;
        self
    }

    /// The reserved background key.
    pub fn root(&self) -> K {
        self.root
    }

    /// Size of the addressable surface covered by the root.
    pub fn surface(&self) -> Size {
        *self.surface.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resize the surface covered by the root.
    pub fn set_surface(&self, surface: Size) {
        *self.surface.write().unwrap_or_else(PoisonError::into_inner) = surface;
    }

    /// Registered keys, back-most first. The root is not listed.
    pub fn targets(&self) -> Vec<K> {
        self.snapshot().iter().map(|e| e.key).collect()
    }

    /// Number of registered targets, not counting the root.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether only the root is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is registered.
    pub fn contains(&self, key: &K) -> bool {
        self.snapshot().iter().any(|e| e.key == *key)
    }

    /// The target registered under `key`.
    pub fn get(&self, key: &K) -> Option<SharedTarget> {
        self.snapshot()
            .iter()
            .find(|e| e.key == *key)
            .map(|e| e.target.clone())
    }

    /// Targets that held cursors of `user_id` on the last cycle, in delivery order.
    pub fn touched_by(&self, user_id: UserId) -> Vec<K> {
        self.touched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user_id)
            .map(|t| t.to_vec())
            .unwrap_or_default()
    }

    fn snapshot(&self) -> Arc<[TargetEntry<K>]> {
        self.targets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `edit` to a copy of the list and publish it if the edit succeeds.
    fn edit<R>(
        &self,
        edit: impl FnOnce(&mut Vec<TargetEntry<K>>) -> TouchResult<R>,
    ) -> TouchResult<R> {
        let mut targets = self.targets.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = targets.to_vec();
        let result = edit(&mut next)?;
        *targets = Arc::from(next);
        Ok(result)
    }

    fn check_new_key(&self, list: &[TargetEntry<K>], key: &K) -> TouchResult<()> {
        if *key == self.root || list.iter().any(|e| e.key == *key) {
            Err(TouchError::DuplicateTarget(format!("{key:?}")))
        } else {
            Ok(())
        }
    }

    /// Put a target in front of every other target.
    ///
    /// # Errors
    ///
    /// [`TouchError::DuplicateTarget`] if `key` is the root or already registered.
    pub fn add_on_top(&self, key: K, target: impl Target + 'static) -> TouchResult<()> {
        self.add_shared_on_top(key, Arc::new(target))
    }

    /// [`add_on_top`](Self::add_on_top) for an already shared target.
    ///
    /// # Errors
    ///
    /// [`TouchError::DuplicateTarget`] if `key` is the root or already registered.
    pub fn add_shared_on_top(&self, key: K, target: SharedTarget) -> TouchResult<()> {
        self.edit(|list| {
            self.check_new_key(list, &key)?;
            list.push(TargetEntry { key, target });
            Ok(())
        })?;
        tracing::debug!(?key, "target added on top");
        Ok(())
    }

    /// Insert a target at `index` (0 is back-most).
    ///
    /// # Errors
    ///
    /// [`TouchError::IndexOutOfRange`] if `index > len`, or
    /// [`TouchError::DuplicateTarget`] if `key` is taken.
    pub fn insert_at(&self, index: usize, key: K, target: SharedTarget) -> TouchResult<()> {
        self.edit(|list| {
            if index > list.len() {
                return Err(TouchError::IndexOutOfRange {
                    index,
                    len: list.len(),
                });
            }
            self.check_new_key(list, &key)?;
            list.insert(index, TargetEntry { key, target });
            Ok(())
        })?;
        tracing::debug!(?key, index, "target inserted");
        Ok(())
    }

    /// Insert a target directly in front of `anchor`.
    ///
    /// # Errors
    ///
    /// [`TouchError::UnknownTarget`] if `anchor` is not registered, or
    /// [`TouchError::DuplicateTarget`] if `key` is taken.
    pub fn insert_above(&self, anchor: &K, key: K, target: SharedTarget) -> TouchResult<()> {
        self.edit(|list| {
            let Some(index) = list.iter().position(|e| e.key == *anchor) else {
                return Err(TouchError::UnknownTarget(format!("{anchor:?}")));
            };
            self.check_new_key(list, &key)?;
            list.insert(index + 1, TargetEntry { key, target });
            Ok(())
        })?;
        tracing::debug!(?key, ?anchor, "target inserted above");
        Ok(())
    }

    /// Replace the target at `index`, returning the old key and target.
    ///
    /// # Errors
    ///
    /// [`TouchError::IndexOutOfRange`] if `index >= len`, or
    /// [`TouchError::DuplicateTarget`] if `key` is registered elsewhere.
    pub fn set_at(
        &self,
        index: usize,
        key: K,
        target: SharedTarget,
    ) -> TouchResult<(K, SharedTarget)> {
        let replaced = self.edit(|list| {
            if index >= list.len() {
                return Err(TouchError::IndexOutOfRange {
                    index,
                    len: list.len(),
                });
            }
            let others: Vec<_> = list
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, e)| e.clone())
                .collect();
            self.check_new_key(&others, &key)?;
            let old = core::mem::replace(&mut list[index], TargetEntry { key, target });
            Ok((old.key, old.target))
        })?;
        tracing::debug!(?key, index, "target replaced");
        Ok(replaced)
    }

    /// Remove a target. The current cycle, if any, still sees it.
    ///
    /// If it held cursors, it receives one final empty batch on the next cycle
    /// of each affected user.
    pub fn remove(&self, key: &K) -> Option<SharedTarget> {
        let removed = self
            .edit(|list| {
                let index = list
                    .iter()
                    .position(|e| e.key == *key)
                    .ok_or_else(|| TouchError::UnknownTarget(format!("{key:?}")))?;
                Ok(list.remove(index).target)
            })
            .ok();
        if removed.is_some() {
            tracing::debug!(?key, "target removed");
        }
        removed
    }

    /// The key `cursor` is attributed to under the current target list.
    pub fn hit(&self, cursor: &Cursor) -> K {
        self.attribute(&self.snapshot(), cursor)
    }

    fn attribute(&self, targets: &[TargetEntry<K>], cursor: &Cursor) -> K {
        for entry in targets.iter().rev() {
            match entry.target.is_touched(cursor) {
                Ok(true) => return entry.key,
                Ok(false) => {}
                Err(err) => self.errors.report(&TouchError::HitTest {
                    target: format!("{:?}", entry.key),
                    message: err.to_string(),
                }),
            }
        }
        self.root
    }

    /// Partition `batch` and forward one tagged batch per affected target.
    ///
    /// # Errors
    ///
    /// [`TouchError::InvalidBatch`] if cursor ids repeat. Nothing is forwarded
    /// and per-user state is left as it was.
    pub fn dispatch(&self, batch: &CursorBatch<K>) -> TouchResult<()> {
        batch.validate()?;
        let _cycle = self.cycle.lock().unwrap_or_else(PoisonError::into_inner);
        let targets = self.snapshot();

        let mut groups: SmallVec<[(K, SmallVec<[Cursor; 4]>); 4]> = SmallVec::new();
        for cursor in batch.cursors() {
            let key = self.attribute(&targets, cursor);
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, cursors)) => cursors.push(*cursor),
                None => groups.push((key, smallvec::smallvec![*cursor])),
            }
        }

        let user_id = batch.user_id();
        {
            let mut touched = self.touched.lock().unwrap_or_else(PoisonError::into_inner);
            let previous = touched.remove(&user_id).unwrap_or_default();
            let now: Touched<K> = groups.iter().map(|(k, _)| *k).collect();
            for key in previous {
                if !now.contains(&key) {
                    groups.push((key, SmallVec::new()));
                }
            }

            // Root, then list order; removed targets keep their previous relative order.
            let rank = |key: &K| {
                if *key == self.root {
                    0
                } else {
                    targets
                        .iter()
                        .position(|e| e.key == *key)
                        .map_or(usize::MAX, |i| i + 1)
                }
            };
            groups.sort_by_key(|(key, _)| rank(key));

            let delivered: Touched<K> = groups
                .iter()
                .filter(|(_, cursors)| !cursors.is_empty())
                .map(|(k, _)| *k)
                .collect();
            if !delivered.is_empty() {
                touched.insert(user_id, delivered);
            }
        }

        for (key, cursors) in groups {
            tracing::trace!(user_id, ?key, cursors = cursors.len(), "tagged batch");
            self.outlets.forward(batch.tagged(key, cursors));
        }
        Ok(())
    }

    /// Dispatch an empty batch for every user that still holds cursors.
    ///
    /// Every touched target receives its final empty batch, so downstream
    /// recognizers settle. Returns the number of users flushed.
    pub fn flush(&self, timestamp_ms: u64) -> usize {
        let mut users: Vec<UserId> = self
            .touched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        users.sort_unstable();
        for &user_id in &users {
            // An empty batch cannot hold duplicate ids.
            let _ = self.dispatch(&CursorBatch::empty(user_id, timestamp_ms));
        }
        tracing::debug!(users = users.len(), "dispatcher flushed");
        users.len()
    }
}

impl<K: TargetKey> fmt::Debug for TargetDispatcher<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetDispatcher")
            .field("root", &self.root)
            .field("surface", &self.surface())
            .field("targets", &self.targets())
            .field("outlets", &self.outlets)
            .finish_non_exhaustive()
    }
}

impl<K: TargetKey> Sink<CursorBatch<K>> for TargetDispatcher<K> {
    fn process(&self, input: CursorBatch<K>) {
        if let Err(err) = self.dispatch(&input) {
            self.errors.report(&err);
        }
    }
}

impl<K: TargetKey> ProcessingBlock<CursorBatch<K>, CursorBatch<K>> for TargetDispatcher<K> {
    fn connect(&self, next: SharedSink<CursorBatch<K>>) {
        self.outlets.connect(next);
    }

    fn disconnect(&self, next: &SharedSink<CursorBatch<K>>) -> bool {
        self.outlets.disconnect(next)
    }
}
