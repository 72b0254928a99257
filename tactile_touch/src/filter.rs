// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input filters: blocks that take cursor batches and emit cursor batches.
//!
//! Filters sit between the [`CursorSource`](crate::source::CursorSource) and
//! the [`TargetDispatcher`](crate::dispatcher::TargetDispatcher), usually
//! chained in a [`CompositeBlock`](tactile_pipeline::CompositeBlock). Any
//! closure can serve as a filter through [`FnBlock`](tactile_pipeline::FnBlock).

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use hashbrown::HashMap;
use kurbo::Rect;
use tactile_pipeline::{Outlets, ProcessingBlock, SharedSink, Sink};

use crate::cursor::{Cursor, CursorBatch, TargetKey, UserId};

/// Drops cursors that fall outside the addressable surface.
///
/// Edges count as inside. A batch whose cursors all lie inside is forwarded
/// unchanged.
pub struct SurfaceClipFilter<K: TargetKey> {
    bounds: RwLock<Rect>,
    outlets: Outlets<CursorBatch<K>>,
}

impl<K: TargetKey> SurfaceClipFilter<K> {
    /// Clip to `bounds`.
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds: RwLock::new(bounds),
            outlets: Outlets::new(),
        }
    }

    /// Current clip bounds.
    pub fn bounds(&self) -> Rect {
        *self.bounds.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the clip bounds; applies from the next batch.
    pub fn set_bounds(&self, bounds: Rect) {
        *self.bounds.write().unwrap_or_else(PoisonError::into_inner) = bounds;
    }
}

fn inside(bounds: &Rect, cursor: &Cursor) -> bool {
    let p = cursor.position;
    (bounds.x0..=bounds.x1).contains(&p.x) && (bounds.y0..=bounds.y1).contains(&p.y)
}

impl<K: TargetKey> fmt::Debug for SurfaceClipFilter<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceClipFilter")
            .field("bounds", &self.bounds())
            .field("outlets", &self.outlets)
            .finish()
    }
}

impl<K: TargetKey> Sink<CursorBatch<K>> for SurfaceClipFilter<K> {
    fn process(&self, input: CursorBatch<K>) {
        let bounds = self.bounds();
        if input.cursors().iter().all(|c| inside(&bounds, c)) {
            self.outlets.forward(input);
            return;
        }
        let kept: Vec<Cursor> = input
            .cursors()
            .iter()
            .filter(|c| inside(&bounds, c))
            .copied()
            .collect();
        tracing::trace!(
            user_id = input.user_id(),
            dropped = input.len() - kept.len(),
            "cursors clipped to surface"
        );
        self.outlets.forward(input.with_cursors(kept));
    }
}

impl<K: TargetKey> ProcessingBlock<CursorBatch<K>, CursorBatch<K>> for SurfaceClipFilter<K> {
    fn connect(&self, next: SharedSink<CursorBatch<K>>) {
        self.outlets.connect(next);
    }

    fn disconnect(&self, next: &SharedSink<CursorBatch<K>>) -> bool {
        self.outlets.disconnect(next)
    }
}

/// Drops a batch whose cursors equal those of the same user's previous batch.
///
/// Sources that resample at a fixed rate repeat identical frames while the
/// fingers rest; downstream stages only need changes. Releases always differ
/// from a non-empty predecessor, so they are never dropped.
pub struct UnchangedBatchFilter<K: TargetKey> {
    last: Mutex<HashMap<UserId, Arc<[Cursor]>>>,
    outlets: Outlets<CursorBatch<K>>,
}

impl<K: TargetKey> UnchangedBatchFilter<K> {
    /// Create a filter with no history.
    pub fn new() -> Self {
        Self {
            last: Mutex::new(HashMap::new()),
            outlets: Outlets::new(),
        }
    }

    /// Forget the history of `user_id`, so its next batch always passes.
    pub fn forget(&self, user_id: UserId) {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&user_id);
    }
}

impl<K: TargetKey> Default for UnchangedBatchFilter<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: TargetKey> fmt::Debug for UnchangedBatchFilter<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnchangedBatchFilter")
            .field("outlets", &self.outlets)
            .finish_non_exhaustive()
    }
}

impl<K: TargetKey> Sink<CursorBatch<K>> for UnchangedBatchFilter<K> {
    fn process(&self, input: CursorBatch<K>) {
        {
            let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
            if last
                .get(&input.user_id())
                .is_some_and(|prev| **prev == *input.cursors())
            {
                tracing::trace!(user_id = input.user_id(), "unchanged batch dropped");
                return;
            }
            last.insert(input.user_id(), input.cursors().into());
        }
        self.outlets.forward(input);
    }
}

impl<K: TargetKey> ProcessingBlock<CursorBatch<K>, CursorBatch<K>> for UnchangedBatchFilter<K> {
    fn connect(&self, next: SharedSink<CursorBatch<K>>) {
        self.outlets.connect(next);
    }

    fn disconnect(&self, next: &SharedSink<CursorBatch<K>>) -> bool {
        self.outlets.disconnect(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactile_pipeline::{CompositeBlock, FnBlock, SharedBlock};

    type Seen = Arc<Mutex<Vec<Vec<u64>>>>;

    fn record<B: ProcessingBlock<CursorBatch<u32>, CursorBatch<u32>>>(block: &B) -> Seen {
        let seen: Seen = Arc::default();
        let out = seen.clone();
        block.connect(Arc::new(FnBlock::new(move |b: CursorBatch<u32>| {
            out.lock().unwrap().push(b.ids().collect());
            None::<()>
        })));
        seen
    }

    #[test]
    fn clip_drops_outside_cursors() {
        let filter = SurfaceClipFilter::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let seen = record(&filter);
        filter.process(CursorBatch::new(
            1,
            [
                Cursor::new(1, 100.0, 100.0),
                Cursor::new(2, -1.0, 5.0),
                Cursor::new(3, 50.0, 50.0),
            ],
            0,
        ));
        assert_eq!(*seen.lock().unwrap(), vec![vec![1, 3]]);
    }

    #[test]
    fn unchanged_batches_are_dropped_per_user() {
        let filter = UnchangedBatchFilter::new();
        let seen = record(&filter);
        let a = [Cursor::new(1, 1.0, 1.0)];
        filter.process(CursorBatch::new(1, a, 0));
        filter.process(CursorBatch::new(1, a, 16));
        filter.process(CursorBatch::new(2, a, 16));
        filter.process(CursorBatch::new(1, [Cursor::new(1, 2.0, 1.0)], 32));
        filter.process(CursorBatch::empty(1, 48));
        filter.process(CursorBatch::empty(1, 64));
        filter.forget(1);
        filter.process(CursorBatch::empty(1, 80));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![vec![1], vec![1], vec![1], vec![], vec![]]
        );
    }

    #[test]
    fn filters_chain_in_a_composite() {
        let chain = CompositeBlock::new();
        let clip: SharedBlock<CursorBatch<u32>> =
            Arc::new(SurfaceClipFilter::new(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let dedupe: SharedBlock<CursorBatch<u32>> = Arc::new(UnchangedBatchFilter::new());
        chain.add_sub_block(clip);
        chain.add_sub_block(dedupe);
        let seen = record(&chain);
        // After clipping, both batches hold the same single cursor.
        chain.process(CursorBatch::new(1, [Cursor::new(1, 5.0, 5.0)], 0));
        chain.process(CursorBatch::new(
            1,
            [Cursor::new(1, 5.0, 5.0), Cursor::new(2, 50.0, 5.0)],
            16,
        ));
        assert_eq!(*seen.lock().unwrap(), vec![vec![1]]);
    }
}
