// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cursors and cursor batches.

use core::fmt;
use core::hash::Hash;
use std::sync::Arc;

use kurbo::{Point, Vec2};
use smallvec::SmallVec;

use crate::error::TouchError;

/// Identifier of one physical contact, stable while the contact persists.
pub type CursorId = u64;

/// Identifier of the user or session a batch belongs to.
pub type UserId = u64;

/// Bound for target identifiers.
///
/// Any small copyable key works: an index, a widget id, a node handle.
pub trait TargetKey: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

impl<K: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static> TargetKey for K {}

/// One point of contact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor {
    /// Contact identifier. A new id means a new physical contact.
    pub id: CursorId,
    /// Position in surface coordinates.
    pub position: Point,
    /// Pressure in `0.0..=1.0`, when the device reports it.
    pub pressure: Option<f32>,
}

impl Cursor {
    /// A cursor without pressure information.
    pub const fn new(id: CursorId, x: f64, y: f64) -> Self {
        Self {
            id,
            position: Point::new(x, y),
            pressure: None,
        }
    }

    /// Attach a pressure reading.
    #[must_use]
    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = Some(pressure);
        self
    }
}

/// Snapshot of every live cursor of one user at one instant.
///
/// Batches are never edited in place; stages that change the cursor set or
/// assign a target build a new batch. Cloning is cheap (the cursor slice is
/// shared).
#[derive(Clone, Debug, PartialEq)]
pub struct CursorBatch<K> {
    user_id: UserId,
    cursors: Arc<[Cursor]>,
    target: Option<K>,
    timestamp_ms: u64,
}

impl<K: Copy> CursorBatch<K> {
    /// An untagged batch, as produced by an input source.
    pub fn new(
        user_id: UserId,
        cursors: impl IntoIterator<Item = Cursor>,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            user_id,
            cursors: cursors.into_iter().collect(),
            target: None,
            timestamp_ms,
        }
    }

    /// An untagged batch with no cursors: every contact of `user_id` has lifted.
    pub fn empty(user_id: UserId, timestamp_ms: u64) -> Self {
        Self::new(user_id, [], timestamp_ms)
    }

    /// A batch for the same user and instant, tagged with `target`.
    #[must_use]
    pub fn tagged(&self, target: K, cursors: impl IntoIterator<Item = Cursor>) -> Self {
        Self {
            user_id: self.user_id,
            cursors: cursors.into_iter().collect(),
            target: Some(target),
            timestamp_ms: self.timestamp_ms,
        }
    }

    /// A batch for the same user, instant and target with a different cursor set.
    #[must_use]
    pub fn with_cursors(&self, cursors: impl IntoIterator<Item = Cursor>) -> Self {
        Self {
            user_id: self.user_id,
            cursors: cursors.into_iter().collect(),
            target: self.target,
            timestamp_ms: self.timestamp_ms,
        }
    }

    /// The user or session this batch belongs to.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The target this batch was dispatched to, if any.
    pub fn target(&self) -> Option<K> {
        self.target
    }

    /// Sampling instant in milliseconds.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// The cursors, in the order the source reported them.
    pub fn cursors(&self) -> &[Cursor] {
        &self.cursors
    }

    /// Look up a cursor by id.
    pub fn cursor(&self, id: CursorId) -> Option<&Cursor> {
        self.cursors.iter().find(|c| c.id == id)
    }

    /// Cursor ids in report order.
    pub fn ids(&self) -> impl Iterator<Item = CursorId> + '_ {
        self.cursors.iter().map(|c| c.id)
    }

    /// Number of cursors.
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    /// Whether no cursor is down.
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    /// Mean position of all cursors, or `None` for an empty batch.
    pub fn centroid(&self) -> Option<Point> {
        if self.cursors.is_empty() {
            return None;
        }
        let sum = self
            .cursors
            .iter()
            .fold(Vec2::ZERO, |acc, c| acc + c.position.to_vec2());
        #[allow(
            clippy::cast_precision_loss,
            reason = "Cursor counts are tiny; the conversion is exact."
        )]
        let n = self.cursors.len() as f64;
        Some((sum / n).to_point())
    }

    /// The first cursor id that occurs more than once, if any.
    pub fn duplicate_id(&self) -> Option<CursorId> {
        let mut ids: SmallVec<[CursorId; 8]> = self.ids().collect();
        ids.sort_unstable();
        ids.windows(2).find(|w| w[0] == w[1]).map(|w| w[0])
    }

    /// Check that cursor ids are unique.
    ///
    /// Duplicate ids are rejected rather than deduplicated: silently dropping
    /// one would skew every count- or centroid-based gesture downstream.
    ///
    /// # Errors
    ///
    /// Returns [`TouchError::InvalidBatch`] naming the repeated id.
    pub fn validate(&self) -> Result<(), TouchError> {
        match self.duplicate_id() {
            Some(cursor_id) => Err(TouchError::InvalidBatch {
                user_id: self.user_id,
                cursor_id,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_two_cursors() {
        let batch: CursorBatch<u32> =
            CursorBatch::new(1, [Cursor::new(1, 0.0, 0.0), Cursor::new(2, 10.0, 20.0)], 0);
        assert_eq!(batch.centroid(), Some(Point::new(5.0, 10.0)));
        assert_eq!(CursorBatch::<u32>::empty(1, 0).centroid(), None);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let batch: CursorBatch<u32> = CursorBatch::new(
            7,
            [
                Cursor::new(3, 0.0, 0.0),
                Cursor::new(1, 1.0, 1.0),
                Cursor::new(3, 2.0, 2.0),
            ],
            0,
        );
        assert_eq!(
            batch.validate(),
            Err(TouchError::InvalidBatch {
                user_id: 7,
                cursor_id: 3
            })
        );
    }

    #[test]
    fn tagging_keeps_user_and_instant() {
        let batch: CursorBatch<u32> =
            CursorBatch::new(4, [Cursor::new(1, 0.0, 0.0).with_pressure(0.5)], 99);
        let tagged = batch.tagged(12, []);
        assert_eq!(tagged.user_id(), 4);
        assert_eq!(tagged.timestamp_ms(), 99);
        assert_eq!(tagged.target(), Some(12));
        assert!(tagged.is_empty());
        assert_eq!(batch.cursor(1).and_then(|c| c.pressure), Some(0.5));
        // The source batch is untouched.
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.target(), None);
    }
}
