// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Head of the pipeline.
//!
//! Input adapters (protocol drivers, mouse or touch bridges) push raw samples
//! into a [`CursorSource`]. The source wraps them in untagged batches, forwards
//! them, and remembers which users still have cursors down so that
//! [`CursorSource::stop`] can release them.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use hashbrown::HashSet;
use tactile_pipeline::{Outlets, ProcessingBlock, SharedSink, Sink};

use crate::cursor::{Cursor, CursorBatch, TargetKey, UserId};

/// Entry point for raw cursor samples.
pub struct CursorSource<K: TargetKey> {
    active: Mutex<HashSet<UserId>>,
    outlets: Outlets<CursorBatch<K>>,
}

impl<K: TargetKey> CursorSource<K> {
    /// Create a source with no downstream blocks.
    pub fn new() -> Self {
        Self {
            active: Mutex::new(HashSet::new()),
            outlets: Outlets::new(),
        }
    }

    /// Forward one sample: every live cursor of `user_id` at `timestamp_ms`.
    pub fn push(
        &self,
        user_id: UserId,
        cursors: impl IntoIterator<Item = Cursor>,
        timestamp_ms: u64,
    ) {
        self.send(CursorBatch::new(user_id, cursors, timestamp_ms));
    }

    /// Forward a prepared batch.
    pub fn send(&self, batch: CursorBatch<K>) {
        {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            if batch.is_empty() {
                active.remove(&batch.user_id());
            } else {
                active.insert(batch.user_id());
            }
        }
        self.outlets.forward(batch);
    }

    /// Users whose last batch still had cursors, sorted.
    pub fn active_users(&self) -> Vec<UserId> {
        let mut users: Vec<_> = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect();
        users.sort_unstable();
        users
    }

    /// Stop the source: send one empty batch per active user.
    ///
    /// Downstream, the dispatcher turns each into an empty batch per touched
    /// target, and every recognizer settles to unarmed. Without this, contexts
    /// could be stranded mid-gesture. Returns the number of users released.
    pub fn stop(&self, timestamp_ms: u64) -> usize {
        let users = self.active_users();
        for &user_id in &users {
            self.send(CursorBatch::empty(user_id, timestamp_ms));
        }
        tracing::debug!(users = users.len(), "cursor source stopped");
        users.len()
    }
}

impl<K: TargetKey> Default for CursorSource<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: TargetKey> fmt::Debug for CursorSource<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorSource")
            .field("active_users", &self.active_users())
            .field("outlets", &self.outlets)
            .finish()
    }
}

impl<K: TargetKey> Sink<CursorBatch<K>> for CursorSource<K> {
    fn process(&self, input: CursorBatch<K>) {
        self.send(input);
    }
}

impl<K: TargetKey> ProcessingBlock<CursorBatch<K>, CursorBatch<K>> for CursorSource<K> {
    fn connect(&self, next: SharedSink<CursorBatch<K>>) {
        self.outlets.connect(next);
    }

    fn disconnect(&self, next: &SharedSink<CursorBatch<K>>) -> bool {
        self.outlets.disconnect(next)
    }
}
