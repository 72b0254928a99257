// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pinch recognition: the distance between exactly two cursors changes.

use kurbo::Point;
use smallvec::SmallVec;
use tactile_touch::{CursorBatch, CursorId};

use crate::error::RecognizeError;
use crate::recognizer::{CursorRange, Recognize, sorted_ids};

/// Distances at or below this are treated as coincident cursors.
const COINCIDENT: f64 = 1e-9;

/// Pinch thresholds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PinchConfig {
    /// Smallest distance change, since the previous `Performed`, that performs.
    pub min_distance_change: f64,
}

/// Payload of a pinch sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pinch {
    /// Midpoint of the two cursors.
    pub center: Point,
    /// Current distance between the cursors.
    pub distance: f64,
    /// Distance change since the previous `Performed` (positive when spreading).
    pub distance_delta: f64,
    /// Current distance over the distance when the pinch started.
    pub scale: f64,
}

/// Per-target pinch state.
#[derive(Clone, Debug, Default)]
pub struct PinchContext {
    start_distance: f64,
    last_distance: f64,
    ids: SmallVec<[CursorId; 4]>,
}

/// Recognizes two-finger pinches. Arms on exactly two cursors.
///
/// Widening the range is allowed, but samples with any other count than two
/// fail with [`RecognizeError::CursorCount`] and reset the gesture.
#[derive(Clone, Copy, Debug, Default)]
pub struct PinchRecognizer {
    config: PinchConfig,
}

impl PinchRecognizer {
    /// A recognizer that reports any distance change.
    pub fn new() -> Self {
        Self::default()
    }

    /// A recognizer with custom thresholds.
    pub fn with_config(config: PinchConfig) -> Self {
        Self { config }
    }

    /// The thresholds in use.
    pub fn config(&self) -> &PinchConfig {
        &self.config
    }
}

fn pair<K: Copy>(batch: &CursorBatch<K>) -> Result<(Point, Point), RecognizeError> {
    let [a, b] = batch.cursors() else {
        return Err(RecognizeError::CursorCount {
            expected: 2,
            actual: batch.len(),
        });
    };
    if !a.position.is_finite() || !b.position.is_finite() {
        return Err(RecognizeError::Degenerate("non-finite cursor position"));
    }
    Ok((a.position, b.position))
}

impl<K: Copy> Recognize<K> for PinchRecognizer {
    type Context = PinchContext;
    type Payload = Pinch;

    fn name(&self) -> &'static str {
        "pinch"
    }

    fn default_range(&self) -> CursorRange {
        CursorRange::exactly(2)
    }

    fn create_context(&self, _target: &K) -> PinchContext {
        PinchContext::default()
    }

    fn arm(
        &self,
        context: &mut PinchContext,
        batch: &CursorBatch<K>,
    ) -> Result<(), RecognizeError> {
        let (a, b) = pair(batch)?;
        let distance = a.distance(b);
        *context = PinchContext {
            start_distance: distance,
            last_distance: distance,
            ids: sorted_ids(batch),
        };
        Ok(())
    }

    fn recognize(
        &self,
        context: &mut PinchContext,
        batch: &CursorBatch<K>,
    ) -> Result<Option<Pinch>, RecognizeError> {
        let (a, b) = pair(batch)?;
        let distance = a.distance(b);
        let ids = sorted_ids(batch);

        if ids != context.ids {
            // A different pair: keep the scale reached so far.
            let scale = if context.start_distance > COINCIDENT {
                context.last_distance / context.start_distance
            } else {
                1.0
            };
            context.start_distance = if scale > COINCIDENT {
                distance / scale
            } else {
                distance
            };
            context.last_distance = distance;
            context.ids = ids;
            return Ok(None);
        }
        if context.start_distance <= COINCIDENT {
            // Started on one spot; measure from the first separation.
            context.start_distance = distance;
            context.last_distance = distance;
            return Ok(None);
        }

        let distance_delta = distance - context.last_distance;
        if distance_delta == 0.0 || distance_delta.abs() < self.config.min_distance_change {
            return Ok(None);
        }
        context.last_distance = distance;
        Ok(Some(Pinch {
            center: a.midpoint(b),
            distance,
            distance_delta,
            scale: distance / context.start_distance,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactile_touch::Cursor;

    fn apart(d: f64) -> CursorBatch<u32> {
        let cursors = [Cursor::new(1, 0.0, 0.0), Cursor::new(2, d, 0.0)];
        CursorBatch::new(1, cursors, 0).tagged(1, cursors)
    }

    #[test]
    fn spreading_performs_with_positive_delta() {
        let pinch = PinchRecognizer::new();
        let mut ctx = PinchContext::default();
        pinch.arm(&mut ctx, &apart(100.0)).unwrap();
        let got = pinch.recognize(&mut ctx, &apart(150.0)).unwrap().unwrap();
        assert_eq!(got.distance_delta, 50.0);
        assert_eq!(got.scale, 1.5);
        assert_eq!(got.center, Point::new(75.0, 0.0));

        let got = pinch.recognize(&mut ctx, &apart(50.0)).unwrap().unwrap();
        assert_eq!(got.distance_delta, -100.0);
        assert_eq!(got.scale, 0.5);
    }

    #[test]
    fn unchanged_distance_does_not_perform() {
        let pinch = PinchRecognizer::new();
        let mut ctx = PinchContext::default();
        pinch.arm(&mut ctx, &apart(100.0)).unwrap();
        assert_eq!(pinch.recognize(&mut ctx, &apart(100.0)), Ok(None));
    }

    #[test]
    fn small_changes_accumulate_until_threshold() {
        let pinch = PinchRecognizer::with_config(PinchConfig {
            min_distance_change: 4.0,
        });
        let mut ctx = PinchContext::default();
        pinch.arm(&mut ctx, &apart(100.0)).unwrap();
        assert_eq!(pinch.recognize(&mut ctx, &apart(102.0)), Ok(None));
        let got = pinch.recognize(&mut ctx, &apart(104.0)).unwrap().unwrap();
        assert_eq!(got.distance_delta, 4.0);
    }

    #[test]
    fn wrong_count_is_an_error() {
        let pinch = PinchRecognizer::new();
        let mut ctx = PinchContext::default();
        let one = [Cursor::new(1, 0.0, 0.0)];
        let batch = CursorBatch::new(1, one, 0).tagged(1_u32, one);
        assert_eq!(
            pinch.arm(&mut ctx, &batch),
            Err(RecognizeError::CursorCount {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn non_finite_position_is_degenerate() {
        let pinch = PinchRecognizer::new();
        let mut ctx = PinchContext::default();
        assert!(matches!(
            pinch.arm(&mut ctx, &apart(f64::NAN)),
            Err(RecognizeError::Degenerate(_))
        ));
    }

    #[test]
    fn coincident_start_measures_from_first_separation() {
        let pinch = PinchRecognizer::new();
        let mut ctx = PinchContext::default();
        pinch.arm(&mut ctx, &apart(0.0)).unwrap();
        assert_eq!(pinch.recognize(&mut ctx, &apart(20.0)), Ok(None));
        let got = pinch.recognize(&mut ctx, &apart(40.0)).unwrap().unwrap();
        assert_eq!(got.scale, 2.0);
    }

    #[test]
    fn swapped_pair_keeps_scale() {
        let pinch = PinchRecognizer::new();
        let mut ctx = PinchContext::default();
        pinch.arm(&mut ctx, &apart(100.0)).unwrap();
        pinch.recognize(&mut ctx, &apart(200.0)).unwrap();
        let other = [Cursor::new(1, 0.0, 0.0), Cursor::new(3, 50.0, 0.0)];
        let batch = CursorBatch::new(1, other, 0).tagged(1_u32, other);
        assert_eq!(pinch.recognize(&mut ctx, &batch), Ok(None));
        let wider = [Cursor::new(1, 0.0, 0.0), Cursor::new(3, 100.0, 0.0)];
        let batch = CursorBatch::new(1, wider, 0).tagged(1_u32, wider);
        let got = pinch.recognize(&mut ctx, &batch).unwrap().unwrap();
        assert_eq!(got.scale, 4.0);
    }
}
