// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The generic recognizer stage.
//!
//! [`GestureRecognizer`] owns everything gestures have in common: one context
//! per `(user, target)`, the armed/performed/unarmed state machine driven by a
//! [`CursorRange`], event fan-out, error isolation and context eviction.
//! A concrete gesture only implements the [`Recognize`] hooks.
//!
//! ## State machine
//!
//! Per batch, with `n` the cursor count and `in` meaning `n` is inside the range:
//!
//! | state            | `n`    | hook called   | emitted                             |
//! |------------------|--------|---------------|-------------------------------------|
//! | unarmed          | out    | none          | nothing                             |
//! | unarmed          | in     | `arm`         | `Armed`                             |
//! | armed/performed  | in     | `recognize`   | `Performed` if it returned a payload |
//! | armed/performed  | out    | `release`     | `Performed` if payload, then `Unarmed` |
//!
//! The arming batch is not passed to `recognize`.
//!
//! A hook returning an error is reported to the error sink; the context is
//! recreated and, if a gesture was in progress, `Unarmed` is emitted. Processing
//! of later batches is unaffected.
//!
//! ## Eviction
//!
//! A context is dropped once its target receives an empty batch while no
//! gesture is in progress, unless [`Recognize::retain_idle`] asks to keep it
//! (multi-tap counting does). Retained contexts are re-checked on every batch
//! and by [`GestureRecognizer::evict_idle`].

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;
use tactile_pipeline::{CowList, Outlets, ProcessingBlock, SharedSink, Sink};
use tactile_touch::{CursorBatch, CursorId, ErrorSink, LogErrors, TargetKey, UserId};

use crate::error::{RecognitionFailed, RecognizeError};
use crate::event::{GestureEvent, GestureListener, GestureState};

/// Inclusive range of cursor counts within which a gesture is armed.
///
/// The lower bound is at least 1: a target that loses every cursor always
/// leaves the range, which is what ends a gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CursorRange {
    min: usize,
    max: Option<usize>,
}

impl CursorRange {
    /// `min` cursors or more.
    pub const fn at_least(min: usize) -> Self {
        Self {
            min: if min == 0 { 1 } else { min },
            max: None,
        }
    }

    /// Exactly `n` cursors.
    pub const fn exactly(n: usize) -> Self {
        Self::between(n, n)
    }

    /// Between `min` and `max` cursors, both inclusive.
    ///
    /// A `max` below `min` is raised to `min`.
    pub const fn between(min: usize, max: usize) -> Self {
        let min = if min == 0 { 1 } else { min };
        let max = if max < min { min } else { max };
        Self {
            min,
            max: Some(max),
        }
    }

    /// Lower bound.
    pub const fn min(&self) -> usize {
        self.min
    }

    /// Upper bound, `None` when unbounded.
    pub const fn max(&self) -> Option<usize> {
        self.max
    }

    /// Whether `count` cursors arm the gesture.
    pub fn contains(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

/// Gesture-specific hooks driven by [`GestureRecognizer`].
///
/// Hooks run under the recognizer's lock and must not call back into it.
/// They see the whole batch, already tagged with the target the context
/// belongs to.
pub trait Recognize<K>: Send + Sync {
    /// Per `(user, target)` recognition state.
    type Context: Send;

    /// Data carried by `Performed` events.
    type Payload: Clone + Send + Sync + 'static;

    /// Short name used in logs and error reports.
    fn name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    /// Range used unless the recognizer is built with an explicit one.
    fn default_range(&self) -> CursorRange;

    /// Fresh context for a target seen for the first time, or after a reset.
    fn create_context(&self, target: &K) -> Self::Context;

    /// The cursor count entered the range.
    fn arm(
        &self,
        context: &mut Self::Context,
        batch: &CursorBatch<K>,
    ) -> Result<(), RecognizeError> {
        let _ = (context, batch);
        Ok(())
    }

    /// A batch arrived while armed with the count still in range.
    ///
    /// Returning a payload emits `Performed`.
    fn recognize(
        &self,
        context: &mut Self::Context,
        batch: &CursorBatch<K>,
    ) -> Result<Option<Self::Payload>, RecognizeError>;

    /// The cursor count left the range.
    ///
    /// Returning a payload emits `Performed` before the final `Unarmed`.
    fn release(
        &self,
        context: &mut Self::Context,
        batch: &CursorBatch<K>,
    ) -> Result<Option<Self::Payload>, RecognizeError> {
        let _ = (context, batch);
        Ok(None)
    }

    /// Whether an idle context (no gesture in progress, no cursors) is kept
    /// at `now_ms`.
    fn retain_idle(&self, context: &Self::Context, now_ms: u64) -> bool {
        let _ = (context, now_ms);
        false
    }
}

/// Cursor ids of a batch, sorted, for comparing cursor sets across samples.
pub(crate) fn sorted_ids<K: Copy>(batch: &CursorBatch<K>) -> SmallVec<[CursorId; 4]> {
    let mut ids: SmallVec<[CursorId; 4]> = batch.ids().collect();
    ids.sort_unstable();
    ids
}

struct Slot<C> {
    context: C,
    state: GestureState,
    /// Last batch for this slot was empty.
    idle: bool,
}

struct Slots<K, C> {
    live: HashMap<(UserId, K), Slot<C>>,
    /// Idle slots kept alive by `retain_idle`.
    lingering: HashSet<(UserId, K)>,
}

type Events<K, P> = SmallVec<[GestureEvent<K, P>; 2]>;

/// Per-target gesture recognition stage.
///
/// Consumes target-tagged [`CursorBatch`]es (normally from a
/// [`TargetDispatcher`](tactile_touch::TargetDispatcher)) and emits
/// [`GestureEvent`]s, both to registered [`GestureListener`]s and to connected
/// downstream blocks. Listeners are called first, in registration order.
///
/// Events are delivered after the internal lock is released, so listeners may
/// query the recognizer or edit the listener list.
///
/// ## Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use tactile_gesture::{GestureEvent, GestureRecognizer, GestureState, Tap, TapRecognizer};
/// use tactile_pipeline::Sink;
/// use tactile_touch::{Cursor, CursorBatch};
///
/// let taps: GestureRecognizer<u32, _> = GestureRecognizer::new(TapRecognizer::new());
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let log = seen.clone();
/// taps.add_listener(Arc::new(move |e: &GestureEvent<u32, Tap>| {
///     log.lock().unwrap().push(e.state);
/// }));
///
/// let finger = Cursor::new(1, 5.0, 5.0);
/// let down = CursorBatch::new(1, [finger], 0).tagged(7, [finger]);
/// let up = CursorBatch::new(1, [], 40).tagged(7, []);
/// taps.process(down);
/// taps.process(up);
///
/// assert_eq!(
///     *seen.lock().unwrap(),
///     [GestureState::Armed, GestureState::Performed, GestureState::Unarmed]
/// );
/// ```
pub struct GestureRecognizer<K: TargetKey, R: Recognize<K>> {
    recognizer: R,
    range: CursorRange,
    slots: Mutex<Slots<K, R::Context>>,
    listeners: CowList<dyn GestureListener<K, R::Payload>>,
    outlets: Outlets<GestureEvent<K, R::Payload>>,
    errors: Arc<dyn ErrorSink>,
}

impl<K: TargetKey, R: Recognize<K>> GestureRecognizer<K, R> {
    /// Wrap `recognizer`, using its default range.
    pub fn new(recognizer: R) -> Self {
        let range = recognizer.default_range();
        Self {
            recognizer,
            range,
            slots: Mutex::new(Slots {
                live: HashMap::new(),
                lingering: HashSet::new(),
            }),
            listeners: CowList::new(),
            outlets: Outlets::new(),
            errors: Arc::new(LogErrors),
        }
    }

    /// Arm on `range` instead of the recognizer's default.
    #[must_use]
    pub fn with_range(mut self, range: CursorRange) -> Self {
        self.range = range;
        self
    }

    /// Route hook failures to `errors`.
    #[must_use]
    pub fn with_error_sink(mut self, errors: Arc<dyn ErrorSink>) -> Self {
        self.errors = errors;
        self
    }

    /// The gesture hooks.
    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// The arming range.
    pub fn range(&self) -> CursorRange {
        self.range
    }

    /// Register a listener. Returns `false` if it was already registered.
    pub fn add_listener(&self, listener: Arc<dyn GestureListener<K, R::Payload>>) -> bool {
        self.listeners.push(listener)
    }

    /// Unregister a listener. Returns `true` if it was registered.
    pub fn remove_listener(&self, listener: &Arc<dyn GestureListener<K, R::Payload>>) -> bool {
        self.listeners.remove(listener)
    }

    /// Number of contexts currently held.
    pub fn live_contexts(&self) -> usize {
        self.lock().live.len()
    }

    /// Current state of the gesture of `user_id` on `target`.
    ///
    /// Targets without a context report [`GestureState::Unarmed`].
    pub fn state_of(&self, user_id: UserId, target: &K) -> GestureState {
        self.lock()
            .live
            .get(&(user_id, *target))
            .map_or(GestureState::Unarmed, |slot| slot.state)
    }

    /// Drop the context of `user_id` on `target`.
    ///
    /// A gesture in progress ends with `Unarmed` stamped `timestamp_ms`.
    /// Returns `true` if a context existed.
    pub fn cancel(&self, user_id: UserId, target: &K, timestamp_ms: u64) -> bool {
        let removed = {
            let mut slots = self.lock();
            let key = (user_id, *target);
            slots.lingering.remove(&key);
            slots.live.remove(&key)
        };
        let Some(slot) = removed else {
            return false;
        };
        if slot.state.is_active() {
            self.deliver(
                [GestureEvent {
                    user_id,
                    target: *target,
                    state: GestureState::Unarmed,
                    timestamp_ms,
                    payload: None,
                }]
                .into_iter(),
            );
        }
        true
    }

    /// Drop every context, ending gestures in progress with `Unarmed`.
    ///
    /// Returns the number of contexts dropped.
    pub fn cancel_all(&self, timestamp_ms: u64) -> usize {
        let drained: Vec<_> = {
            let mut slots = self.lock();
            slots.lingering.clear();
            slots.live.drain().collect()
        };
        let count = drained.len();
        self.deliver(
            drained
                .into_iter()
                .filter(|(_, slot)| slot.state.is_active())
                .map(|((user_id, target), _)| GestureEvent {
                    user_id,
                    target,
                    state: GestureState::Unarmed,
                    timestamp_ms,
                    payload: None,
                }),
        );
        count
    }

    /// Drop idle contexts that [`Recognize::retain_idle`] no longer keeps at
    /// `now_ms`.
    ///
    /// Returns the number of contexts dropped.
    pub fn evict_idle(&self, now_ms: u64) -> usize {
        let mut slots = self.lock();
        self.sweep(&mut slots, now_ms)
    }

    /// Run one batch through the state machine.
    ///
    /// Untagged batches are a wiring error: they trip a debug assertion and are
    /// otherwise ignored.
    pub fn on_batch(&self, batch: &CursorBatch<K>) {
        let Some(target) = batch.target() else {
            tracing::error!(
                recognizer = self.recognizer.name(),
                user_id = batch.user_id(),
                "untagged batch reached a gesture recognizer"
            );
            debug_assert!(false, "untagged batch reached a gesture recognizer");
            return;
        };
        let events = self.step(target, batch);
        self.deliver(events.into_iter());
    }

    fn step(&self, target: K, batch: &CursorBatch<K>) -> Events<K, R::Payload> {
        let user_id = batch.user_id();
        let timestamp_ms = batch.timestamp_ms();
        let key = (user_id, target);
        let in_range = self.range.contains(batch.len());
        let event = |state, payload| GestureEvent {
            user_id,
            target,
            state,
            timestamp_ms,
            payload,
        };

        let mut events = Events::new();
        let mut guard = self.lock();
        let slots = &mut *guard;
        let slot = slots.live.entry(key).or_insert_with(|| {
            tracing::trace!(
                recognizer = self.recognizer.name(),
                user_id,
                ?target,
                "context created"
            );
            Slot {
                context: self.recognizer.create_context(&target),
                state: GestureState::Unarmed,
                idle: true,
            }
        });

        let outcome = match (slot.state.is_active(), in_range) {
            (false, false) => Ok(()),
            (false, true) => self.recognizer.arm(&mut slot.context, batch).map(|()| {
                slot.state = GestureState::Armed;
                events.push(event(GestureState::Armed, None));
            }),
            (true, true) => self
                .recognizer
                .recognize(&mut slot.context, batch)
                .map(|payload| {
                    if let Some(payload) = payload {
                        slot.state = GestureState::Performed;
                        events.push(event(GestureState::Performed, Some(payload)));
                    }
                }),
            (true, false) => self
                .recognizer
                .release(&mut slot.context, batch)
                .map(|payload| {
                    if let Some(payload) = payload {
                        events.push(event(GestureState::Performed, Some(payload)));
                    }
                    slot.state = GestureState::Unarmed;
                    events.push(event(GestureState::Unarmed, None));
                }),
        };

        if let Err(source) = outcome {
            if slot.state.is_active() {
                events.push(event(GestureState::Unarmed, None));
            }
            slot.context = self.recognizer.create_context(&target);
            slot.state = GestureState::Unarmed;
            self.errors.report(&RecognitionFailed {
                recognizer: self.recognizer.name(),
                target: format!("{target:?}"),
                user_id,
                source,
            });
        }

        slot.idle = batch.is_empty();
        if slot.idle && !slot.state.is_active() {
            if self.recognizer.retain_idle(&slot.context, timestamp_ms) {
                slots.lingering.insert(key);
            } else {
                slots.live.remove(&key);
                slots.lingering.remove(&key);
                tracing::trace!(
                    recognizer = self.recognizer.name(),
                    user_id,
                    ?target,
                    "context evicted"
                );
            }
        } else {
            slots.lingering.remove(&key);
        }

        if !slots.lingering.is_empty() {
            self.sweep(slots, timestamp_ms);
        }
        events
    }

    fn sweep(&self, slots: &mut Slots<K, R::Context>, now_ms: u64) -> usize {
        let Slots { live, lingering } = slots;
        let before = live.len();
        lingering.retain(|key| match live.get(key) {
            Some(slot) if slot.idle && !slot.state.is_active() => {
                if self.recognizer.retain_idle(&slot.context, now_ms) {
                    true
                } else {
                    live.remove(key);
                    false
                }
            }
            _ => false,
        });
        let evicted = before - live.len();
        if evicted > 0 {
            tracing::trace!(recognizer = self.recognizer.name(), evicted, "idle contexts evicted");
        }
        evicted
    }

    fn deliver(&self, events: impl Iterator<Item = GestureEvent<K, R::Payload>>) {
        let mut listeners = None;
        for event in events {
            tracing::debug!(
                recognizer = self.recognizer.name(),
                user_id = event.user_id,
                target = ?event.target,
                state = ?event.state,
                "gesture event"
            );
            let listeners = listeners.get_or_insert_with(|| self.listeners.snapshot());
            for listener in listeners.iter() {
                listener.on_event(&event);
            }
            self.outlets.forward(event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots<K, R::Context>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: TargetKey, R: Recognize<K>> Sink<CursorBatch<K>> for GestureRecognizer<K, R> {
    fn process(&self, batch: CursorBatch<K>) {
        self.on_batch(&batch);
    }
}

impl<K: TargetKey, R: Recognize<K>> ProcessingBlock<CursorBatch<K>, GestureEvent<K, R::Payload>>
    for GestureRecognizer<K, R>
{
    fn connect(&self, next: SharedSink<GestureEvent<K, R::Payload>>) {
        self.outlets.connect(next);
    }

    fn disconnect(&self, next: &SharedSink<GestureEvent<K, R::Payload>>) -> bool {
        self.outlets.disconnect(next)
    }
}

impl<K: TargetKey, R: Recognize<K>> fmt::Debug for GestureRecognizer<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureRecognizer")
            .field("recognizer", &self.recognizer.name())
            .field("range", &self.range)
            .field("live_contexts", &self.live_contexts())
            .field("listeners", &self.listeners.len())
            .field("outlets", &self.outlets.len())
            .finish_non_exhaustive()
    }
}
