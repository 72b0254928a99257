// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tactile Gesture: per-target gesture recognition.
//!
//! ## Overview
//!
//! A [`GestureRecognizer`] sits downstream of a
//! [`TargetDispatcher`](tactile_touch::TargetDispatcher) and sees one batch per
//! touched target per sampling cycle. It keeps one context per
//! `(user, target)` and turns the target's cursor count into a lifecycle:
//!
//! - count enters the recognizer's [`CursorRange`]: [`GestureState::Armed`]
//! - gesture condition met on a sample: [`GestureState::Performed`]
//! - count leaves the range: [`GestureState::Unarmed`]
//!
//! What "condition met" means is supplied by a [`Recognize`] implementation.
//! Three ship with the crate:
//!
//! - [`TapRecognizer`]: a press released in place, with multi-tap counting.
//! - [`DragRecognizer`]: motion of the cursors' centroid.
//! - [`PinchRecognizer`]: distance change between two cursors.
//!
//! Register one recognizer per gesture type; several can consume the same
//! dispatcher. Events reach [`GestureListener`]s and any blocks connected to
//! the recognizer.
//!
//! ## Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use kurbo::{Rect, Size};
//! use tactile_gesture::{GestureEvent, GestureRecognizer, GestureState, Pinch, PinchRecognizer};
//! use tactile_pipeline::ProcessingBlock;
//! use tactile_touch::{Cursor, CursorSource, Region, TargetDispatcher};
//!
//! let dispatcher = Arc::new(TargetDispatcher::new("root", Size::new(800.0, 600.0)));
//! dispatcher
//!     .add_on_top("photo", Region::new(Rect::new(100.0, 100.0, 500.0, 400.0)))
//!     .unwrap();
//!
//! let pinch: Arc<GestureRecognizer<&str, _>> =
//!     Arc::new(GestureRecognizer::new(PinchRecognizer::new()));
//! let scales = Arc::new(Mutex::new(Vec::new()));
//! let out = scales.clone();
//! pinch.add_listener(Arc::new(move |e: &GestureEvent<&'static str, Pinch>| {
//!     if let Some(p) = &e.payload {
//!         out.lock().unwrap().push((e.target, p.scale));
//!     }
//! }));
//! dispatcher.connect(pinch.clone());
//!
//! let source: CursorSource<&str> = CursorSource::new();
//! source.connect(dispatcher.clone());
//! source.push(1, [Cursor::new(1, 200.0, 200.0), Cursor::new(2, 300.0, 200.0)], 0);
//! source.push(1, [Cursor::new(1, 150.0, 200.0), Cursor::new(2, 350.0, 200.0)], 16);
//! source.stop(32);
//!
//! assert_eq!(*scales.lock().unwrap(), [("photo", 2.0)]);
//! assert_eq!(pinch.state_of(1, &"photo"), GestureState::Unarmed);
//! assert_eq!(pinch.live_contexts(), 0);
//! ```

pub mod drag;
pub mod error;
pub mod event;
pub mod pinch;
pub mod recognizer;
pub mod tap;

pub use drag::{Drag, DragConfig, DragContext, DragRecognizer};
pub use error::{RecognitionFailed, RecognizeError};
pub use event::{GestureEvent, GestureListener, GestureState};
pub use pinch::{Pinch, PinchConfig, PinchContext, PinchRecognizer};
pub use recognizer::{CursorRange, GestureRecognizer, Recognize};
pub use tap::{Tap, TapConfig, TapContext, TapRecognizer};
