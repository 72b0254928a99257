// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The target contract.

use std::sync::Arc;

use kurbo::Size;

use crate::cursor::Cursor;
use crate::error::HitTestError;

/// A spatial region that cursors can touch.
///
/// Targets own no gesture state and carry no ordering; the dispatcher's list
/// supplies front-to-back order. Implementations are supplied by the embedding
/// application, for example backed by widget geometry, or use
/// [`Region`](crate::region::Region) for plain shapes.
pub trait Target: Send + Sync {
    /// Whether `cursor` lands on this target.
    ///
    /// # Errors
    ///
    /// An error isolates this target for this cursor only: the dispatcher
    /// reports it and continues as if the target was not touched.
    fn is_touched(&self, cursor: &Cursor) -> Result<bool, HitTestError>;

    /// The largest extent the target can occupy.
    fn max_size(&self) -> Size;
}

/// Shared handle to a target.
pub type SharedTarget = Arc<dyn Target>;
