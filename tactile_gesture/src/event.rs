// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture states, events and listeners.

use tactile_touch::UserId;

/// Lifecycle state of one gesture on one target.
///
/// Per target the emitted sequence always reads
/// `Armed Performed* Unarmed`, repeated. The initial unarmed state is implicit
/// and never emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureState {
    /// The cursor count entered the recognizer's range; a gesture may follow.
    Armed,
    /// The gesture-specific condition was met on this sample.
    Performed,
    /// The cursor count left the range, or recognition was reset.
    Unarmed,
}

impl GestureState {
    /// Whether a gesture is in progress (armed or performed).
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Unarmed)
    }
}

/// A state transition of one gesture on one target.
///
/// Events are plain snapshots: they hold copies of the data, never a reference
/// into recognizer state, so they can be retained or sent across threads.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureEvent<K, P> {
    /// User or session the gesture belongs to.
    pub user_id: UserId,
    /// Target the gesture happened on.
    pub target: K,
    /// The new state.
    pub state: GestureState,
    /// Sampling instant of the batch that caused the transition.
    pub timestamp_ms: u64,
    /// Gesture data. Always present on [`GestureState::Performed`], absent otherwise.
    pub payload: Option<P>,
}

/// Receiver of gesture events.
///
/// Listeners run synchronously on the thread driving the pipeline and must
/// return quickly. Closures taking `&GestureEvent` are listeners.
pub trait GestureListener<K, P>: Send + Sync {
    /// Called once per emitted event, in emission order.
    fn on_event(&self, event: &GestureEvent<K, P>);
}

impl<K, P, F> GestureListener<K, P> for F
where
    F: Fn(&GestureEvent<K, P>) + Send + Sync,
{
    fn on_event(&self, event: &GestureEvent<K, P>) {
        self(event);
    }
}
