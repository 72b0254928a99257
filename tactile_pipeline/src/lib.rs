// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tactile Pipeline: composable processing blocks for input dataflow.
//!
//! ## Overview
//!
//! A pipeline is a graph of blocks. Each block consumes one input unit in
//! [`Sink::process`], does its work, and forwards zero or more derived units to
//! every block registered with [`ProcessingBlock::connect`].
//! Nothing is returned to the caller; forwarding is the only side effect.
//!
//! - [`Outlets`] holds the downstream edges of a block as a copy-on-write list,
//!   so edges can be added or removed while a unit is in flight.
//! - [`CompositeBlock`] wraps an ordered chain of same-typed blocks and presents
//!   it as a single block.
//! - [`FnBlock`] turns a closure into a map or filter stage.
//! - [`DeferredBlock`] queues units and releases them when the consuming
//!   execution context calls [`DeferredBlock::drain`].
//!
//! The crate does not care what flows through it. Cursor batches and gesture
//! events are defined by the crates layered on top.
//!
//! ## Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use tactile_pipeline::{CompositeBlock, FnBlock, ProcessingBlock, SharedBlock, Sink};
//!
//! let doubled: SharedBlock<i32> = Arc::new(FnBlock::new(|x: i32| Some(x * 2)));
//! let positive: SharedBlock<i32> = Arc::new(tactile_pipeline::fn_block::filter(|x: &i32| *x > 0));
//!
//! let chain = CompositeBlock::new();
//! chain.add_sub_block(doubled);
//! chain.add_sub_block(positive);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let out = seen.clone();
//! chain.connect(Arc::new(FnBlock::new(move |x: i32| {
//!     out.lock().unwrap().push(x);
//!     None::<()>
//! })));
//!
//! chain.process(3);
//! chain.process(-1);
//! assert_eq!(*seen.lock().unwrap(), vec![6]);
//! ```

use std::sync::Arc;

pub mod composite;
pub mod deferred;
pub mod fn_block;
pub mod outlets;

pub use composite::CompositeBlock;
pub use deferred::DeferredBlock;
pub use fn_block::FnBlock;
pub use outlets::{CowList, Outlets};

/// Consumer side of a block: anything that accepts input units.
///
/// Implementations run synchronously and briefly. They must not block on I/O;
/// hand work to another execution context through a [`DeferredBlock`] instead.
pub trait Sink<In>: Send + Sync {
    /// Consume one unit and forward whatever it derives downstream.
    fn process(&self, input: In);
}

/// A block in the pipeline: consumes `In`, forwards `Out`.
pub trait ProcessingBlock<In, Out>: Sink<In> {
    /// Add a forwarding edge to `next`.
    ///
    /// Connecting a sink that is already connected is a no-op.
    fn connect(&self, next: SharedSink<Out>);

    /// Remove the forwarding edge to `next`.
    ///
    /// Returns `true` if the edge existed.
    fn disconnect(&self, next: &SharedSink<Out>) -> bool;
}

/// Shared handle to a downstream consumer.
pub type SharedSink<T> = Arc<dyn Sink<T>>;

/// Shared handle to a block whose input and output types match.
pub type SharedBlock<T> = Arc<dyn ProcessingBlock<T, T>>;

/// Identity comparison for shared blocks.
///
/// Compares allocation addresses only, so the same block seen through
/// different trait objects (for example as a [`SharedBlock`] and as a
/// [`SharedSink`]) compares equal.
pub fn same_block<A: ?Sized, B: ?Sized>(a: &Arc<A>, b: &Arc<B>) -> bool {
    core::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
