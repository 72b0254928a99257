// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tactile Touch: cursor batches and front-to-back target dispatch.
//!
//! ## Overview
//!
//! Multi-touch input arrives as an unstructured stream of simultaneous contact
//! points. This crate gives that stream a shape:
//!
//! - [`Cursor`]: one point of contact with a stable id.
//! - [`CursorBatch`]: every live cursor of one user at one instant, optionally
//!   tagged with the target it was dispatched to.
//! - [`Target`]: a region that can be touched, supplied by the application.
//!   [`Region`] covers plain [`kurbo`] shapes.
//! - [`TargetDispatcher`]: splits each batch into one tagged batch per target,
//!   front-most target first, with a reserved root catching everything else.
//! - [`CursorSource`]: head of the pipeline, with [`CursorSource::stop`] to
//!   release every active user.
//! - Filters ([`SurfaceClipFilter`], [`UnchangedBatchFilter`]) to place between
//!   source and dispatcher.
//!
//! All stages are [`tactile_pipeline`] blocks and connect with
//! [`ProcessingBlock::connect`](tactile_pipeline::ProcessingBlock::connect).
//! Hit testing against a windowing system is left to the embedding
//! application: implement [`Target`] over your widget geometry.
//!
//! ## Errors
//!
//! Edits and explicit dispatch calls return [`TouchResult`]. Failures that must
//! not stop the pipeline (a target's hit test failing, a malformed batch
//! arriving through [`Sink::process`](tactile_pipeline::Sink::process)) go to an
//! [`ErrorSink`]; the default [`LogErrors`] logs them with `tracing`.
//!
//! ## Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use kurbo::{Rect, Size};
//! use tactile_pipeline::{FnBlock, ProcessingBlock};
//! use tactile_touch::{Cursor, CursorBatch, CursorSource, Region, TargetDispatcher};
//!
//! let source: CursorSource<&str> = CursorSource::new();
//! let dispatcher = Arc::new(TargetDispatcher::new("root", Size::new(640.0, 480.0)));
//! dispatcher.add_on_top("button", Region::new(Rect::new(0.0, 0.0, 100.0, 100.0))).unwrap();
//! source.connect(dispatcher.clone());
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let out = seen.clone();
//! dispatcher.connect(Arc::new(FnBlock::new(move |b: CursorBatch<&'static str>| {
//!     out.lock().unwrap().push((b.target(), b.len()));
//!     None::<()>
//! })));
//!
//! source.push(1, [Cursor::new(1, 10.0, 10.0), Cursor::new(2, 300.0, 300.0)], 0);
//! source.stop(16);
//! assert_eq!(
//!     *seen.lock().unwrap(),
//!     vec![
//!         (Some("root"), 1),
//!         (Some("button"), 1),
//!         (Some("root"), 0),
//!         (Some("button"), 0),
//!     ]
//! );
//! ```

pub mod cursor;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod region;
pub mod source;
pub mod target;

pub use cursor::{Cursor, CursorBatch, CursorId, TargetKey, UserId};
pub use dispatcher::TargetDispatcher;
pub use error::{ErrorSink, HitTestError, LogErrors, TouchError, TouchResult};
pub use filter::{SurfaceClipFilter, UnchangedBatchFilter};
pub use region::{HitShape, Region};
pub use source::CursorSource;
pub use target::{SharedTarget, Target};
