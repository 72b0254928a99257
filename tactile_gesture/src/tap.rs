// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tap recognition.
//!
//! A tap is a press that lifts without travelling. The press starts when the
//! target's cursor count enters the range and ends when it leaves it; the tap
//! is reported on release, as `Performed` right before `Unarmed`.
//!
//! ## Rules
//!
//! 1. Every cursor must stay within [`TapConfig::slop`] of where it first
//!    touched during the press. Cursors joining mid-press are measured from
//!    their own first sample.
//! 2. The press must not last longer than [`TapConfig::max_press_ms`], when set.
//! 3. A tap whose press starts within [`TapConfig::multi_tap_window_ms`] of the
//!    previous tap's release, and within [`TapConfig::multi_tap_slop`] of its
//!    position, continues the sequence: its `tap_count` is one higher.
//!    A failed press breaks the sequence.
//! 4. The press must end with at least one of its cursors lifting. Leaving the
//!    range because more cursors touched fails the press.
//!
//! The context outlives the press while a follow-up tap can still continue the
//! sequence, so double taps are counted even though the target is released in
//! between.

use kurbo::Point;
use smallvec::SmallVec;
use tactile_touch::{CursorBatch, CursorId};

use crate::error::RecognizeError;
use crate::recognizer::{CursorRange, Recognize};

/// Tap thresholds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TapConfig {
    /// Furthest a cursor may travel from its first sample and still tap.
    pub slop: f64,
    /// Longest press that still taps. `None` accepts any duration.
    pub max_press_ms: Option<u64>,
    /// Longest gap between a release and the next press of a multi-tap.
    pub multi_tap_window_ms: u64,
    /// Furthest apart two taps of a multi-tap may be.
    pub multi_tap_slop: f64,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            slop: 10.0,
            max_press_ms: Some(300),
            multi_tap_window_ms: 300,
            multi_tap_slop: 20.0,
        }
    }
}

/// Payload of a performed tap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tap {
    /// Centroid of the cursors when the press started.
    pub position: Point,
    /// 1 for a single tap, 2 for a double tap, and so on.
    pub tap_count: u32,
}

#[derive(Clone, Debug)]
struct Press {
    position: Point,
    down_ms: u64,
    starts: SmallVec<[(CursorId, Point); 4]>,
    moved: bool,
}

#[derive(Clone, Copy, Debug)]
struct LastTap {
    position: Point,
    up_ms: u64,
    count: u32,
}

/// Per-target tap state.
#[derive(Clone, Debug, Default)]
pub struct TapContext {
    press: Option<Press>,
    last: Option<LastTap>,
}

impl TapContext {
    /// Taps counted so far in the current sequence, 0 if none.
    pub fn tap_count(&self) -> u32 {
        self.last.map_or(0, |last| last.count)
    }
}

/// Recognizes taps and multi-taps. Arms on one or more cursors by default.
#[derive(Clone, Copy, Debug, Default)]
pub struct TapRecognizer {
    config: TapConfig,
}

impl TapRecognizer {
    /// A recognizer with the default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A recognizer with custom thresholds.
    pub fn with_config(config: TapConfig) -> Self {
        Self { config }
    }

    /// The thresholds in use.
    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    fn track<K: Copy>(&self, press: &mut Press, batch: &CursorBatch<K>) {
        for cursor in batch.cursors() {
            match press.starts.iter().find(|(id, _)| *id == cursor.id) {
                Some((_, start)) => {
                    if start.distance(cursor.position) > self.config.slop {
                        press.moved = true;
                    }
                }
                None => press.starts.push((cursor.id, cursor.position)),
            }
        }
    }
}

impl<K: Copy> Recognize<K> for TapRecognizer {
    type Context = TapContext;
    type Payload = Tap;

    fn name(&self) -> &'static str {
        "tap"
    }

    fn default_range(&self) -> CursorRange {
        CursorRange::at_least(1)
    }

    fn create_context(&self, _target: &K) -> TapContext {
        TapContext::default()
    }

    fn arm(
        &self,
        context: &mut TapContext,
        batch: &CursorBatch<K>,
    ) -> Result<(), RecognizeError> {
        let Some(position) = batch.centroid() else {
            return Err(RecognizeError::CursorCount {
                expected: 1,
                actual: 0,
            });
        };
        context.press = Some(Press {
            position,
            down_ms: batch.timestamp_ms(),
            starts: batch.cursors().iter().map(|c| (c.id, c.position)).collect(),
            moved: false,
        });
        Ok(())
    }

    fn recognize(
        &self,
        context: &mut TapContext,
        batch: &CursorBatch<K>,
    ) -> Result<Option<Tap>, RecognizeError> {
        if let Some(press) = context.press.as_mut() {
            self.track(press, batch);
        }
        Ok(None)
    }

    fn release(
        &self,
        context: &mut TapContext,
        batch: &CursorBatch<K>,
    ) -> Result<Option<Tap>, RecognizeError> {
        let Some(mut press) = context.press.take() else {
            return Ok(None);
        };
        // Leaving the range by adding cursors is not a lift.
        let lifted = press
            .starts
            .iter()
            .any(|(id, _)| batch.cursors().iter().all(|c| c.id != *id));
        // Positions on the releasing sample still count; lifted cursors are simply absent.
        self.track(&mut press, batch);
        let up_ms = batch.timestamp_ms();
        let too_long = self
            .config
            .max_press_ms
            .is_some_and(|max| up_ms.saturating_sub(press.down_ms) > max);
        if !lifted || press.moved || too_long {
            context.last = None;
            return Ok(None);
        }

        let count = match context.last {
            Some(last)
                if press.down_ms.saturating_sub(last.up_ms) <= self.config.multi_tap_window_ms
                    && last.position.distance(press.position) <= self.config.multi_tap_slop =>
            {
                last.count + 1
            }
            _ => 1,
        };
        context.last = Some(LastTap {
            position: press.position,
            up_ms,
            count,
        });
        Ok(Some(Tap {
            position: press.position,
            tap_count: count,
        }))
    }

    fn retain_idle(&self, context: &TapContext, now_ms: u64) -> bool {
        let window = self.config.multi_tap_window_ms;
        context
            .last
            .is_some_and(|last| now_ms.saturating_sub(last.up_ms) <= window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactile_touch::Cursor;

    fn at(ts: u64, cursors: &[Cursor]) -> CursorBatch<u32> {
        CursorBatch::new(1, cursors.to_vec(), ts).tagged(1, cursors.to_vec())
    }

    fn press(ctx: &mut TapContext, tap: &TapRecognizer, down: u64, up: u64, x: f64) -> Option<Tap> {
        let finger = Cursor::new(down, x, 0.0);
        tap.arm(ctx, &at(down, &[finger])).unwrap();
        tap.release(ctx, &at(up, &[])).unwrap()
    }

    #[test]
    fn quick_release_taps() {
        let tap = TapRecognizer::new();
        let mut ctx = TapContext::default();
        let got = press(&mut ctx, &tap, 0, 50, 4.0).unwrap();
        assert_eq!(got.position, Point::new(4.0, 0.0));
        assert_eq!(got.tap_count, 1);
    }

    #[test]
    fn travel_beyond_slop_cancels() {
        let tap = TapRecognizer::new();
        let mut ctx = TapContext::default();
        tap.arm(&mut ctx, &at(0, &[Cursor::new(1, 0.0, 0.0)])).unwrap();
        tap.recognize(&mut ctx, &at(10, &[Cursor::new(1, 30.0, 0.0)])).unwrap();
        // Coming back does not undo the travel.
        tap.recognize(&mut ctx, &at(20, &[Cursor::new(1, 0.0, 0.0)])).unwrap();
        assert_eq!(tap.release(&mut ctx, &at(30, &[])).unwrap(), None);
    }

    #[test]
    fn small_jitter_still_taps() {
        let tap = TapRecognizer::new();
        let mut ctx = TapContext::default();
        tap.arm(&mut ctx, &at(0, &[Cursor::new(1, 0.0, 0.0)])).unwrap();
        tap.recognize(&mut ctx, &at(10, &[Cursor::new(1, 3.0, 4.0)])).unwrap();
        assert!(tap.release(&mut ctx, &at(30, &[])).unwrap().is_some());
    }

    #[test]
    fn long_press_is_not_a_tap() {
        let tap = TapRecognizer::new();
        let mut ctx = TapContext::default();
        assert_eq!(press(&mut ctx, &tap, 0, 301, 0.0), None);

        let patient = TapRecognizer::with_config(TapConfig {
            max_press_ms: None,
            ..TapConfig::default()
        });
        assert!(press(&mut ctx, &patient, 0, 5_000, 0.0).is_some());
    }

    #[test]
    fn taps_in_sequence_count_up() {
        let tap = TapRecognizer::new();
        let mut ctx = TapContext::default();
        assert_eq!(press(&mut ctx, &tap, 0, 50, 0.0).unwrap().tap_count, 1);
        assert_eq!(press(&mut ctx, &tap, 200, 250, 5.0).unwrap().tap_count, 2);
        assert_eq!(press(&mut ctx, &tap, 400, 450, 0.0).unwrap().tap_count, 3);
        assert_eq!(ctx.tap_count(), 3);
        // Too late.
        assert_eq!(press(&mut ctx, &tap, 1_000, 1_050, 0.0).unwrap().tap_count, 1);
        // Too far.
        assert_eq!(press(&mut ctx, &tap, 1_100, 1_150, 100.0).unwrap().tap_count, 1);
    }

    #[test]
    fn failed_press_breaks_sequence() {
        let tap = TapRecognizer::new();
        let mut ctx = TapContext::default();
        press(&mut ctx, &tap, 0, 50, 0.0).unwrap();
        assert_eq!(press(&mut ctx, &tap, 100, 900, 0.0), None);
        assert_eq!(ctx.tap_count(), 0);
        assert_eq!(press(&mut ctx, &tap, 1_000, 1_050, 0.0).unwrap().tap_count, 1);
    }

    #[test]
    fn idle_context_kept_during_window() {
        let tap = TapRecognizer::new();
        let mut ctx = TapContext::default();
        assert!(!Recognize::<u32>::retain_idle(&tap, &ctx, 0));
        press(&mut ctx, &tap, 0, 50, 0.0).unwrap();
        assert!(Recognize::<u32>::retain_idle(&tap, &ctx, 350));
        assert!(!Recognize::<u32>::retain_idle(&tap, &ctx, 351));
    }

    #[test]
    fn extra_finger_leaving_range_is_not_a_tap() {
        let tap = TapRecognizer::new();
        let mut ctx = TapContext::default();
        press(&mut ctx, &tap, 0, 50, 0.0).unwrap();
        tap.arm(&mut ctx, &at(100, &[Cursor::new(1, 0.0, 0.0)])).unwrap();
        let both = [Cursor::new(1, 0.0, 0.0), Cursor::new(2, 4.0, 0.0)];
        assert_eq!(tap.release(&mut ctx, &at(120, &both)).unwrap(), None);
        assert_eq!(ctx.tap_count(), 0);
    }

    #[test]
    fn late_joining_cursor_measured_from_its_own_start() {
        let tap = TapRecognizer::new();
        let mut ctx = TapContext::default();
        tap.arm(&mut ctx, &at(0, &[Cursor::new(1, 0.0, 0.0)])).unwrap();
        let both = [Cursor::new(1, 0.0, 0.0), Cursor::new(2, 80.0, 0.0)];
        tap.recognize(&mut ctx, &at(10, &both)).unwrap();
        tap.recognize(&mut ctx, &at(20, &both)).unwrap();
        let got = tap.release(&mut ctx, &at(40, &[])).unwrap().unwrap();
        assert_eq!(got.position, Point::ZERO);
    }
}
