// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Closure-backed blocks.

use core::marker::PhantomData;
use std::fmt;

use crate::{Outlets, ProcessingBlock, SharedSink, Sink};

/// A block that runs a closure per unit and forwards `Some` results.
///
/// Returning `None` drops the unit, which makes this the building block for
/// both maps and filters.
pub struct FnBlock<In, Out: 'static, F> {
    f: F,
    outlets: Outlets<Out>,
    _in: PhantomData<fn(In)>,
}

impl<In, Out: 'static, F> FnBlock<In, Out, F>
where
    F: Fn(In) -> Option<Out> + Send + Sync,
{
    /// Wrap `f` as a block.
    pub fn new(f: F) -> Self {
        Self {
            f,
            outlets: Outlets::new(),
            _in: PhantomData,
        }
    }
}

/// A block that forwards only the units matching `predicate`.
pub fn filter<T: 'static>(
    predicate: impl Fn(&T) -> bool + Send + Sync,
) -> FnBlock<T, T, impl Fn(T) -> Option<T> + Send + Sync> {
    FnBlock::new(move |input: T| predicate(&input).then_some(input))
}

impl<In, Out: 'static, F> fmt::Debug for FnBlock<In, Out, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnBlock")
            .field("outlets", &self.outlets)
            .finish_non_exhaustive()
    }
}

impl<In, Out, F> Sink<In> for FnBlock<In, Out, F>
where
    Out: Clone + 'static,
    F: Fn(In) -> Option<Out> + Send + Sync,
{
    fn process(&self, input: In) {
        if let Some(output) = (self.f)(input) {
            self.outlets.forward(output);
        }
    }
}

impl<In, Out, F> ProcessingBlock<In, Out> for FnBlock<In, Out, F>
where
    Out: Clone + 'static,
    F: Fn(In) -> Option<Out> + Send + Sync,
{
    fn connect(&self, next: SharedSink<Out>) {
        self.outlets.connect(next);
    }

    fn disconnect(&self, next: &SharedSink<Out>) -> bool {
        self.outlets.disconnect(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn collector<T: Send + 'static>() -> (SharedSink<T>, Arc<Mutex<Vec<T>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let out = seen.clone();
        let sink: SharedSink<T> = Arc::new(FnBlock::new(move |x: T| {
            out.lock().unwrap().push(x);
            None::<()>
        }));
        (sink, seen)
    }

    #[test]
    fn map_forwards_results() {
        let block = FnBlock::new(|x: u32| Some(x + 1));
        let (sink, seen) = collector();
        block.connect(sink);
        block.process(1);
        block.process(2);
        assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
    }

    #[test]
    fn filter_drops_non_matching_units() {
        let block = filter(|x: &u32| x % 2 == 0);
        let (sink, seen) = collector();
        block.connect(sink);
        for x in 0..5 {
            block.process(x);
        }
        assert_eq!(*seen.lock().unwrap(), vec![0, 2, 4]);
    }

    #[test]
    fn fan_out_reaches_every_sink() {
        let block = FnBlock::new(|x: u32| Some(x));
        let (first, seen_first) = collector();
        let (second, seen_second) = collector();
        block.connect(first.clone());
        block.connect(second);
        block.process(9);
        assert!(block.disconnect(&first));
        block.process(10);
        assert_eq!(*seen_first.lock().unwrap(), vec![9]);
        assert_eq!(*seen_second.lock().unwrap(), vec![9, 10]);
    }
}
