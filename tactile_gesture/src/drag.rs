// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag recognition: the centroid of the target's cursors moves.
//!
//! Every sample whose centroid differs from the previous one performs, once the
//! total travel has reached [`DragConfig::min_distance`]. When a cursor joins or
//! leaves mid-drag the centroid jumps; that sample only rebases the drag so the
//! jump is not reported as motion.

use kurbo::{Point, Vec2};
use smallvec::SmallVec;
use tactile_touch::{CursorBatch, CursorId};

use crate::error::RecognizeError;
use crate::recognizer::{CursorRange, Recognize, sorted_ids};

/// Drag thresholds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DragConfig {
    /// Travel from the start before the first `Performed`.
    pub min_distance: f64,
}

/// Payload of a drag sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Drag {
    /// Where the drag started, shifted by any rebase.
    pub start: Point,
    /// Current centroid.
    pub position: Point,
    /// Motion since the previous `Performed`.
    pub delta: Vec2,
    /// Motion since the start.
    pub translation: Vec2,
}

/// Per-target drag state.
#[derive(Clone, Debug, Default)]
pub struct DragContext {
    start: Point,
    last: Point,
    ids: SmallVec<[CursorId; 4]>,
    dragging: bool,
}

/// Recognizes drags. Arms on one or more cursors by default.
#[derive(Clone, Copy, Debug, Default)]
pub struct DragRecognizer {
    config: DragConfig,
}

impl DragRecognizer {
    /// A recognizer that reports any motion.
    pub fn new() -> Self {
        Self::default()
    }

    /// A recognizer with custom thresholds.
    pub fn with_config(config: DragConfig) -> Self {
        Self { config }
    }

    /// The thresholds in use.
    pub fn config(&self) -> &DragConfig {
        &self.config
    }
}

fn centroid<K: Copy>(batch: &CursorBatch<K>) -> Result<Point, RecognizeError> {
    let position = batch.centroid().ok_or(RecognizeError::CursorCount {
        expected: 1,
        actual: 0,
    })?;
    if !position.is_finite() {
        return Err(RecognizeError::Degenerate("non-finite centroid"));
    }
    Ok(position)
}

impl<K: Copy> Recognize<K> for DragRecognizer {
    type Context = DragContext;
    type Payload = Drag;

    fn name(&self) -> &'static str {
        "drag"
    }

    fn default_range(&self) -> CursorRange {
        CursorRange::at_least(1)
    }

    fn create_context(&self, _target: &K) -> DragContext {
        DragContext::default()
    }

    fn arm(
        &self,
        context: &mut DragContext,
        batch: &CursorBatch<K>,
    ) -> Result<(), RecognizeError> {
        let position = centroid(batch)?;
        *context = DragContext {
            start: position,
            last: position,
            ids: sorted_ids(batch),
            dragging: false,
        };
        Ok(())
    }

    fn recognize(
        &self,
        context: &mut DragContext,
        batch: &CursorBatch<K>,
    ) -> Result<Option<Drag>, RecognizeError> {
        let position = centroid(batch)?;
        let ids = sorted_ids(batch);
        if ids != context.ids {
            context.start += position - context.last;
            context.last = position;
            context.ids = ids;
            return Ok(None);
        }

        let delta = position - context.last;
        if delta == Vec2::ZERO {
            return Ok(None);
        }
        let translation = position - context.start;
        if !context.dragging {
            if translation.hypot() < self.config.min_distance {
                return Ok(None);
            }
            context.dragging = true;
        }
        context.last = position;
        Ok(Some(Drag {
            start: context.start,
            position,
            delta,
            translation,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactile_touch::Cursor;

    fn at(cursors: &[Cursor]) -> CursorBatch<u32> {
        CursorBatch::new(1, cursors.to_vec(), 0).tagged(1, cursors.to_vec())
    }

    #[test]
    fn reports_motion_deltas() {
        let drag = DragRecognizer::new();
        let mut ctx = DragContext::default();
        drag.arm(&mut ctx, &at(&[Cursor::new(1, 0.0, 0.0)])).unwrap();
        let first = drag
            .recognize(&mut ctx, &at(&[Cursor::new(1, 3.0, 4.0)]))
            .unwrap()
            .unwrap();
        assert_eq!(first.delta, Vec2::new(3.0, 4.0));
        let second = drag
            .recognize(&mut ctx, &at(&[Cursor::new(1, 5.0, 4.0)]))
            .unwrap()
            .unwrap();
        assert_eq!(second.delta, Vec2::new(2.0, 0.0));
        assert_eq!(second.translation, Vec2::new(5.0, 4.0));
        assert_eq!(second.start, Point::ZERO);
    }

    #[test]
    fn stationary_sample_does_not_perform() {
        let drag = DragRecognizer::new();
        let mut ctx = DragContext::default();
        drag.arm(&mut ctx, &at(&[Cursor::new(1, 2.0, 2.0)])).unwrap();
        assert_eq!(drag.recognize(&mut ctx, &at(&[Cursor::new(1, 2.0, 2.0)])), Ok(None));
    }

    #[test]
    fn min_distance_accumulates() {
        let drag = DragRecognizer::with_config(DragConfig { min_distance: 10.0 });
        let mut ctx = DragContext::default();
        drag.arm(&mut ctx, &at(&[Cursor::new(1, 0.0, 0.0)])).unwrap();
        assert_eq!(drag.recognize(&mut ctx, &at(&[Cursor::new(1, 6.0, 0.0)])), Ok(None));
        let got = drag
            .recognize(&mut ctx, &at(&[Cursor::new(1, 12.0, 0.0)]))
            .unwrap()
            .unwrap();
        // The held-back travel is reported in the first delta.
        assert_eq!(got.delta, Vec2::new(12.0, 0.0));
        // Once dragging, small steps perform.
        assert!(drag.recognize(&mut ctx, &at(&[Cursor::new(1, 13.0, 0.0)])).unwrap().is_some());
    }

    #[test]
    fn joining_cursor_rebases() {
        let drag = DragRecognizer::new();
        let mut ctx = DragContext::default();
        drag.arm(&mut ctx, &at(&[Cursor::new(1, 0.0, 0.0)])).unwrap();
        let two = [Cursor::new(1, 0.0, 0.0), Cursor::new(2, 20.0, 0.0)];
        assert_eq!(drag.recognize(&mut ctx, &at(&two)), Ok(None));
        let moved = [Cursor::new(1, 2.0, 0.0), Cursor::new(2, 22.0, 0.0)];
        let got = drag.recognize(&mut ctx, &at(&moved)).unwrap().unwrap();
        assert_eq!(got.delta, Vec2::new(2.0, 0.0));
        assert_eq!(got.translation, Vec2::new(2.0, 0.0));
        assert_eq!(got.start, Point::new(10.0, 0.0));
    }

    #[test]
    fn cursor_order_is_irrelevant() {
        let drag = DragRecognizer::new();
        let mut ctx = DragContext::default();
        let ab = [Cursor::new(1, 0.0, 0.0), Cursor::new(2, 10.0, 0.0)];
        drag.arm(&mut ctx, &at(&ab)).unwrap();
        let ba = [Cursor::new(2, 11.0, 0.0), Cursor::new(1, 1.0, 0.0)];
        assert!(drag.recognize(&mut ctx, &at(&ba)).unwrap().is_some());
    }

    #[test]
    fn non_finite_sample_is_degenerate() {
        let drag = DragRecognizer::new();
        let mut ctx = DragContext::default();
        drag.arm(&mut ctx, &at(&[Cursor::new(1, 0.0, 0.0)])).unwrap();
        assert!(matches!(
            drag.recognize(&mut ctx, &at(&[Cursor::new(1, f64::NAN, 0.0)])),
            Err(RecognizeError::Degenerate(_))
        ));
        // The last good position is untouched.
        let got = drag
            .recognize(&mut ctx, &at(&[Cursor::new(1, 1.0, 0.0)]))
            .unwrap()
            .unwrap();
        assert_eq!(got.delta, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn empty_batch_is_an_error() {
        let drag = DragRecognizer::new();
        let mut ctx = DragContext::default();
        assert_eq!(
            drag.arm(&mut ctx, &at(&[])),
            Err(RecognizeError::CursorCount {
                expected: 1,
                actual: 0
            })
        );
    }
}
