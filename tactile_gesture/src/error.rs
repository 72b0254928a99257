// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recognition errors.

use tactile_touch::UserId;
use thiserror::Error;

/// Failure of a recognizer hook on one batch.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RecognizeError {
    /// The batch holds a cursor count the gesture cannot work with.
    ///
    /// Usually a sign that the recognizer was given a range wider than its
    /// algorithm supports.
    #[error("expected {expected} cursors, got {actual}")]
    CursorCount {
        /// Count the gesture needs.
        expected: usize,
        /// Count in the batch.
        actual: usize,
    },

    /// The cursor data cannot be measured (for example non-finite positions).
    #[error("degenerate input: {0}")]
    Degenerate(&'static str),

    /// Any other failure of a custom recognizer.
    #[error("{0}")]
    Other(String),
}

/// A hook failure, with where it happened. Sent to the error sink.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{recognizer} failed on target {target} for user {user_id}: {source}")]
pub struct RecognitionFailed {
    /// Recognizer name.
    pub recognizer: &'static str,
    /// Debug rendering of the target key.
    pub target: String,
    /// Batch owner.
    pub user_id: UserId,
    /// What the hook returned.
    pub source: RecognizeError,
}
