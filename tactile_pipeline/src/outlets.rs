// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copy-on-write edge lists.
//!
//! Forwarding walks a snapshot of the list taken when the unit arrives.
//! `connect`/`disconnect` calls made while that walk is running (for example
//! from inside a downstream handler) replace the list for the *next* unit and
//! never disturb the walk in progress.
//!
//! ## Semantics
//!
//! - Entries are visited in connection order.
//! - An entry is held at most once; identity is the allocation address
//!   (see [`same_block`]).
//! - The unit is cloned for every entry but the last, which receives it by value.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::{SharedSink, same_block};

/// A copy-on-write list of shared handles.
pub struct CowList<T: ?Sized> {
    items: RwLock<Arc<[Arc<T>]>>,
}

impl<T: ?Sized> CowList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Append `item` unless it is already present.
    ///
    /// Returns `true` if the list changed.
    pub fn push(&self, item: Arc<T>) -> bool {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        if items.iter().any(|existing| same_block(existing, &item)) {
            return false;
        }
        let mut next = items.to_vec();
        next.push(item);
        *items = Arc::from(next);
        true
    }

    /// Remove `item` if present.
    ///
    /// Returns `true` if the list changed.
    pub fn remove(&self, item: &Arc<T>) -> bool {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let Some(index) = items.iter().position(|existing| same_block(existing, item)) else {
            return false;
        };
        let mut next = items.to_vec();
        next.remove(index);
        *items = Arc::from(next);
        true
    }

    /// Whether `item` is present.
    pub fn contains(&self, item: &Arc<T>) -> bool {
        self.snapshot()
            .iter()
            .any(|existing| same_block(existing, item))
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        *items = Arc::from(Vec::new());
    }

    /// The current entries. Later mutations do not affect the returned slice.
    pub fn snapshot(&self) -> Arc<[Arc<T>]> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized> Default for CowList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for CowList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CowList")
            .field("len", &self.len())
            .finish()
    }
}

/// Downstream edges of a block.
pub struct Outlets<T: 'static> {
    sinks: CowList<dyn crate::Sink<T>>,
}

impl<T: 'static> Outlets<T> {
    /// Create a block output with no edges.
    pub fn new() -> Self {
        Self {
            sinks: CowList::new(),
        }
    }

    /// Add an edge. Returns `false` if `next` was already connected.
    pub fn connect(&self, next: SharedSink<T>) -> bool {
        self.sinks.push(next)
    }

    /// Remove an edge. Returns `true` if it existed.
    pub fn disconnect(&self, next: &SharedSink<T>) -> bool {
        self.sinks.remove(next)
    }

    /// Whether `next` is connected.
    pub fn is_connected(&self, next: &SharedSink<T>) -> bool {
        self.sinks.contains(next)
    }

    /// The current edges.
    pub fn snapshot(&self) -> Arc<[SharedSink<T>]> {
        self.sinks.snapshot()
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether the block has no downstream consumers.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl<T: Clone + 'static> Outlets<T> {
    /// Deliver `item` to every connected sink, in connection order.
    pub fn forward(&self, item: T) {
        let sinks = self.sinks.snapshot();
        let Some((last, rest)) = sinks.split_last() else {
            tracing::trace!("no downstream sink; unit dropped");
            return;
        };
        for sink in rest {
            sink.process(item.clone());
        }
        last.process(item);
    }
}

impl<T: 'static> Default for Outlets<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for Outlets<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outlets")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sink;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Record(Mutex<Vec<u32>>);

    impl Sink<u32> for Record {
        fn process(&self, input: u32) {
            self.0.lock().unwrap().push(input);
        }
    }

    impl Record {
        fn seen(&self) -> Vec<u32> {
            self.0.lock().unwrap().clone()
        }
    }

    #[test]
    fn forwards_in_connection_order() {
        let outlets: Outlets<u32> = Outlets::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        struct Named(u32, Arc<Mutex<Vec<u32>>>);
        impl Sink<u32> for Named {
            fn process(&self, _input: u32) {
                self.1.lock().unwrap().push(self.0);
            }
        }

        outlets.connect(Arc::new(Named(1, order.clone())));
        outlets.connect(Arc::new(Named(2, order.clone())));
        outlets.connect(Arc::new(Named(3, order.clone())));
        outlets.forward(7);
        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn connect_is_idempotent() {
        let outlets = Outlets::new();
        let record = Arc::new(Record::default());
        let sink: SharedSink<u32> = record.clone();
        assert!(outlets.connect(sink.clone()));
        assert!(!outlets.connect(sink.clone()));
        outlets.forward(1);
        assert_eq!(record.seen(), vec![1]);
    }

    #[test]
    fn disconnect_by_identity() {
        let outlets = Outlets::new();
        let a = Arc::new(Record::default());
        let b = Arc::new(Record::default());
        let a_sink: SharedSink<u32> = a.clone();
        outlets.connect(a_sink.clone());
        outlets.connect(b.clone());

        // A fresh trait object for the same allocation still matches.
        let again: SharedSink<u32> = a.clone();
        assert!(outlets.disconnect(&again));
        assert!(!outlets.disconnect(&a_sink));

        outlets.forward(5);
        assert!(a.seen().is_empty());
        assert_eq!(b.seen(), vec![5]);
    }

    #[test]
    fn disconnect_during_forward_applies_to_next_unit() {
        struct Detacher {
            outlets: Arc<Outlets<u32>>,
            victim: SharedSink<u32>,
        }
        impl Sink<u32> for Detacher {
            fn process(&self, _input: u32) {
                self.outlets.disconnect(&self.victim);
            }
        }

        let outlets: Arc<Outlets<u32>> = Arc::new(Outlets::new());
        let victim = Arc::new(Record::default());
        let victim_sink: SharedSink<u32> = victim.clone();
        outlets.connect(Arc::new(Detacher {
            outlets: outlets.clone(),
            victim: victim_sink.clone(),
        }));
        outlets.connect(victim_sink);

        // The walk in progress still reaches the victim.
        outlets.forward(1);
        assert_eq!(victim.seen(), vec![1]);

        outlets.forward(2);
        assert_eq!(victim.seen(), vec![1]);
        assert_eq!(outlets.len(), 1);
    }

    #[test]
    fn forward_without_sinks_is_a_no_op() {
        let outlets: Outlets<u32> = Outlets::new();
        outlets.forward(1);
        assert!(outlets.is_empty());
    }
}
