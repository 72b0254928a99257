// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hand-off between execution contexts.
//!
//! The pipeline runs on whatever thread pushes input. Consumers confined to
//! another context (a UI thread, an event loop tick) connect behind a
//! [`DeferredBlock`]: the producing side only enqueues, and the consuming
//! side calls [`DeferredBlock::drain`] from its own context to release the
//! queued units downstream, in arrival order.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::{Outlets, ProcessingBlock, SharedSink, Sink};

/// Queues units until the consuming context drains them.
pub struct DeferredBlock<T: 'static> {
    queue: Mutex<VecDeque<T>>,
    outlets: Outlets<T>,
}

impl<T: 'static> DeferredBlock<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            outlets: Outlets::new(),
        }
    }

    /// Number of queued units.
    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn pop(&self) -> Option<T> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

impl<T: Clone + 'static> DeferredBlock<T> {
    /// Forward every queued unit downstream on the calling thread.
    ///
    /// Units enqueued while draining are forwarded by the same call. Call this
    /// from one consuming context only; concurrent drains may reorder units.
    /// Returns the number of units forwarded.
    pub fn drain(&self) -> usize {
        let mut forwarded = 0;
        // The lock is released between units so downstream code may enqueue.
        while let Some(unit) = self.pop() {
            self.outlets.forward(unit);
            forwarded += 1;
        }
        if forwarded > 0 {
            tracing::trace!(forwarded, "deferred queue drained");
        }
        forwarded
    }
}

impl<T: 'static> Default for DeferredBlock<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for DeferredBlock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredBlock")
            .field("pending", &self.pending())
            .field("outlets", &self.outlets)
            .finish()
    }
}

impl<T: Send + 'static> Sink<T> for DeferredBlock<T> {
    fn process(&self, input: T) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(input);
    }
}

impl<T: Send + 'static> ProcessingBlock<T, T> for DeferredBlock<T> {
    fn connect(&self, next: SharedSink<T>) {
        self.outlets.connect(next);
    }

    fn disconnect(&self, next: &SharedSink<T>) -> bool {
        self.outlets.disconnect(next)
    }
}
