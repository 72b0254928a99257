// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types and the error sink.

use std::error::Error as StdError;

use thiserror::Error;

use crate::cursor::{CursorId, UserId};

/// Result type for touch operations.
pub type TouchResult<T> = Result<T, TouchError>;

/// Errors raised by the dispatch stage and target list edits.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TouchError {
    /// A batch listed the same cursor id twice.
    #[error("invalid batch from user {user_id}: cursor {cursor_id} appears more than once")]
    InvalidBatch {
        /// Batch owner.
        user_id: UserId,
        /// The repeated id.
        cursor_id: CursorId,
    },

    /// A target failed while hit testing a cursor; it was treated as not touched.
    #[error("hit test failed on target {target}: {message}")]
    HitTest {
        /// Debug rendering of the target key.
        target: String,
        /// What the target reported.
        message: String,
    },

    /// A positional edit named an index past the end of the target list.
    #[error("target index {index} out of range for {len} targets")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Current list length.
        len: usize,
    },

    /// The named target is not registered.
    #[error("unknown target {0}")]
    UnknownTarget(String),

    /// The key is already registered (or is the root key).
    #[error("target {0} is already registered")]
    DuplicateTarget(String),
}

/// Failure reported by a [`Target`](crate::target::Target) hit test.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct HitTestError(pub String);

/// Receiver for errors that must not stop the pipeline.
///
/// Stages isolate failures (a misbehaving target, a failing recognizer hook,
/// a rejected batch) and report them here instead of unwinding through the
/// pipeline.
pub trait ErrorSink: Send + Sync {
    /// Record one error.
    fn report(&self, error: &(dyn StdError + 'static));
}

impl<F> ErrorSink for F
where
    F: Fn(&(dyn StdError + 'static)) + Send + Sync,
{
    fn report(&self, error: &(dyn StdError + 'static)) {
        self(error);
    }
}

/// The default sink: logs each error at `warn` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogErrors;

impl ErrorSink for LogErrors {
    fn report(&self, error: &(dyn StdError + 'static)) {
        tracing::warn!(%error, "input pipeline error");
    }
}
