// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An ordered chain of blocks that behaves as one block.
//!
//! ## Wiring
//!
//! Sub-block *i* is connected to sub-block *i + 1* when it is inserted, so a
//! unit entering the composite walks the whole chain before it leaves.
//!
//! - [`Sink::process`] hands the unit to the **first** sub-block only.
//! - [`ProcessingBlock::connect`] / [`ProcessingBlock::disconnect`] act on the
//!   **last** sub-block, the composite's visible output. The composite also
//!   remembers these external edges so it can move them when the last
//!   sub-block changes.
//! - [`CompositeBlock::remove_sub_block`] splices a block out by connecting its
//!   predecessor directly to its successor (or to the external edges when the
//!   removed block was last).
//!
//! An empty composite drops every unit it receives.
//!
//! ```
//! use std::sync::Arc;
//! use tactile_pipeline::{CompositeBlock, FnBlock, SharedBlock};
//!
//! let a: SharedBlock<u8> = Arc::new(FnBlock::new(|x: u8| Some(x)));
//! let b: SharedBlock<u8> = Arc::new(FnBlock::new(|x: u8| Some(x)));
//! let chain = CompositeBlock::new();
//! chain.add_sub_block(a.clone());
//! chain.add_sub_block(b.clone());
//! assert!(chain.remove_sub_block(&a));
//! assert_eq!(chain.len(), 1);
//! ```

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{ProcessingBlock, SharedBlock, SharedSink, Sink, same_block};

/// An ordered chain of same-typed blocks presented as a single block.
pub struct CompositeBlock<T: 'static> {
    chain: Mutex<Chain<T>>,
}

struct Chain<T: 'static> {
    blocks: Vec<SharedBlock<T>>,
    /// Edges connected to the composite from outside; they hang off the last block.
    downstream: Vec<SharedSink<T>>,
}

fn as_sink<T: 'static>(block: &SharedBlock<T>) -> SharedSink<T> {
    block.clone()
}

impl<T: 'static> CompositeBlock<T> {
    /// Create an empty composite.
    pub fn new() -> Self {
        Self {
            chain: Mutex::new(Chain {
                blocks: Vec::new(),
                downstream: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Chain<T>> {
        self.chain.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `block` to the end of the chain.
    ///
    /// The previous last block is rewired to feed `block`, and the external
    /// edges move to `block`. Returns `false` (and changes nothing) if `block`
    /// is already part of this chain, since a second copy would form a cycle.
    pub fn add_sub_block(&self, block: SharedBlock<T>) -> bool {
        let mut chain = self.lock();
        if chain.blocks.iter().any(|b| same_block(b, &block)) {
            return false;
        }
        if let Some(last) = chain.blocks.last() {
            for next in &chain.downstream {
                last.disconnect(next);
            }
            last.connect(as_sink(&block));
        }
        for next in &chain.downstream {
            block.connect(next.clone());
        }
        chain.blocks.push(block);
        tracing::debug!(len = chain.blocks.len(), "sub-block appended");
        true
    }

    /// Splice `block` out of the chain.
    ///
    /// Its predecessor is connected to its successor; if `block` was last, the
    /// predecessor takes over the external edges. Returns `false` if `block`
    /// is not part of this chain.
    pub fn remove_sub_block(&self, block: &SharedBlock<T>) -> bool {
        let mut chain = self.lock();
        let Some(index) = chain.blocks.iter().position(|b| same_block(b, block)) else {
            return false;
        };
        let removed = chain.blocks.remove(index);
        let successor = chain.blocks.get(index).cloned();

        match &successor {
            Some(next) => {
                removed.disconnect(&as_sink(next));
            }
            None => {
                for next in &chain.downstream {
                    removed.disconnect(next);
                }
            }
        }

        if let Some(prev) = index.checked_sub(1).map(|i| chain.blocks[i].clone()) {
            prev.disconnect(&as_sink(&removed));
            match &successor {
                Some(next) => prev.connect(as_sink(next)),
                None => {
                    for next in &chain.downstream {
                        prev.connect(next.clone());
                    }
                }
            }
        }
        tracing::debug!(index, len = chain.blocks.len(), "sub-block removed");
        true
    }

    /// The sub-blocks in chain order.
    pub fn sub_blocks(&self) -> Vec<SharedBlock<T>> {
        self.lock().blocks.clone()
    }

    /// Number of sub-blocks.
    pub fn len(&self) -> usize {
        self.lock().blocks.len()
    }

    /// Whether the chain has no sub-blocks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for CompositeBlock<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for CompositeBlock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain = self.lock();
        f.debug_struct("CompositeBlock")
            .field("sub_blocks", &chain.blocks.len())
            .field("downstream", &chain.downstream.len())
            .finish()
    }
}

impl<T: 'static> Sink<T> for CompositeBlock<T> {
    fn process(&self, input: T) {
        // Release the lock before running the chain so blocks may edit it.
        let first = self.lock().blocks.first().cloned();
        match first {
            Some(first) => first.process(input),
            None => tracing::trace!("empty composite; unit dropped"),
        }
    }
}

impl<T: 'static> ProcessingBlock<T, T> for CompositeBlock<T> {
    fn connect(&self, next: SharedSink<T>) {
        let mut chain = self.lock();
        if chain.downstream.iter().any(|d| same_block(d, &next)) {
            return;
        }
        if let Some(last) = chain.blocks.last() {
            last.connect(next.clone());
        }
        chain.downstream.push(next);
    }

    fn disconnect(&self, next: &SharedSink<T>) -> bool {
        let mut chain = self.lock();
        let Some(index) = chain.downstream.iter().position(|d| same_block(d, next)) else {
            return false;
        };
        let removed = chain.downstream.remove(index);
        if let Some(last) = chain.blocks.last() {
            last.disconnect(&removed);
        }
        true
    }
}
