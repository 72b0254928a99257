// Copyright 2026 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape-backed targets.
//!
//! [`Region`] turns any [`HitShape`] into a [`Target`]. Shapes are in surface
//! coordinates. A `tolerance` inflates the hit area on every side, which is
//! useful for small targets under fingers.
//!
//! Implementations are provided for these [`kurbo`] primitives:
//!
//! - [`Rect`]: half-open on the right and bottom edges, as [`Rect::contains`].
//! - [`Circle`]: a filled disk; the boundary counts as inside.
//! - [`RoundedRect`]: exact inside its outline; with tolerance, near misses
//!   are accepted within the inflated bounding box.
//! - [`BezPath`]: fill only, using the winding rule of [`Shape::contains`];
//!   with tolerance, the whole inflated bounding box hits.
//!
//! ```
//! use kurbo::{Circle, Point};
//! use tactile_touch::{Cursor, Region, Target};
//!
//! let knob = Region::with_tolerance(Circle::new(Point::new(50.0, 50.0), 10.0), 4.0);
//! assert!(knob.is_touched(&Cursor::new(1, 63.0, 50.0)).unwrap());
//! assert!(!knob.is_touched(&Cursor::new(1, 65.0, 50.0)).unwrap());
//! ```

use kurbo::{BezPath, Circle, Point, Rect, RoundedRect, Shape, Size};

use crate::cursor::Cursor;
use crate::error::HitTestError;
use crate::target::Target;

/// Geometry that can answer point hit queries.
pub trait HitShape {
    /// Whether `pt` hits the shape, accepting misses up to `tolerance` away.
    fn hit(&self, pt: Point, tolerance: f64) -> bool;

    /// Size of the shape's bounding box.
    fn extent(&self) -> Size;
}

impl HitShape for Rect {
    fn hit(&self, pt: Point, tolerance: f64) -> bool {
        if tolerance > 0.0 {
            self.inflate(tolerance, tolerance).contains(pt)
        } else {
            self.contains(pt)
        }
    }

    fn extent(&self) -> Size {
        self.size()
    }
}

impl HitShape for Circle {
    fn hit(&self, pt: Point, tolerance: f64) -> bool {
        self.center.distance(pt) <= self.radius + tolerance.max(0.0)
    }

    fn extent(&self) -> Size {
        Size::new(2.0 * self.radius, 2.0 * self.radius)
    }
}

impl HitShape for RoundedRect {
    fn hit(&self, pt: Point, tolerance: f64) -> bool {
        if self.contains(pt) {
            return true;
        }
        // Corner curves get no exact distance; a tolerant near miss is judged
        // against the inflated bounding box.
        tolerance > 0.0
            && self
                .bounding_box()
                .inflate(tolerance, tolerance)
                .contains(pt)
    }

    fn extent(&self) -> Size {
        self.rect().size()
    }
}

impl HitShape for BezPath {
    fn hit(&self, pt: Point, tolerance: f64) -> bool {
        let bounds = self.bounding_box();
        if tolerance > 0.0 {
            return bounds.inflate(tolerance, tolerance).contains(pt);
        }
        bounds.contains(pt) && self.contains(pt)
    }

    fn extent(&self) -> Size {
        self.bounding_box().size()
    }
}

/// A target backed by a shape.
#[derive(Clone, Debug)]
pub struct Region<S> {
    shape: S,
    tolerance: f64,
}

impl<S> Region<S> {
    /// Hit exactly the shape.
    pub fn new(shape: S) -> Self {
        Self {
            shape,
            tolerance: 0.0,
        }
    }

    /// Hit the shape plus `tolerance` units on every side.
    pub fn with_tolerance(shape: S, tolerance: f64) -> Self {
        Self { shape, tolerance }
    }

    /// The underlying shape.
    pub fn shape(&self) -> &S {
        &self.shape
    }

    /// Near-miss tolerance in surface units.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

impl<S: HitShape + Send + Sync> Target for Region<S> {
    fn is_touched(&self, cursor: &Cursor) -> Result<bool, HitTestError> {
        Ok(self.shape.hit(cursor.position, self.tolerance))
    }

    fn max_size(&self) -> Size {
        self.shape.extent()
    }
}
