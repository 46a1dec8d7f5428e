//! 2-D Axis Aligned Bounding Boxes.

use super::{point2, Point2, Point2f, Union, Vector2};
use crate::core::common::{max, min, Float, Int, INFINITY};
use num_traits::Num;

/// A 2-D Axis Aligned Bounding Box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds2<T> {
    /// Minimum bounds.
    pub p_min: Point2<T>,

    /// Maximum bounds.
    pub p_max: Point2<T>,
}

/// 2-D bounding box containing `Float` points.
pub type Bounds2f = Bounds2<Float>;

/// 2-D bounding box containing `Int` points.
pub type Bounds2i = Bounds2<Int>;

/// Creates a new 2-D bounding box from 2 points. The minimum and maximum bounds
/// are used for each coordinate axis.
///
/// * `p1` - First point.
/// * `p2` - Second point.
pub fn bounds2<T: Num + PartialOrd + Copy>(p1: Point2<T>, p2: Point2<T>) -> Bounds2<T> {
    Bounds2 {
        p_min: point2(min(p1.x, p2.x), min(p1.y, p2.y)),
        p_max: point2(max(p1.x, p2.x), max(p1.y, p2.y)),
    }
}

impl Bounds2f {
    /// An empty box where the minimum and maximum bounds are +∞ and -∞
    /// respectively, so it can be grown from nothing via unions.
    pub const EMPTY: Self = Self {
        p_min: Point2 {
            x: INFINITY,
            y: INFINITY,
        },
        p_max: Point2 {
            x: -INFINITY,
            y: -INFINITY,
        },
    };

    /// Returns the center of the bounding box.
    pub fn center(&self) -> Point2f {
        (self.p_min + self.p_max) * 0.5
    }
}

impl<T: Num + Copy> Bounds2<T> {
    /// Returns true if the bounds describe an empty box where any component
    /// of `p_max` is less than the corresponding component of `p_min`.
    pub fn is_empty(&self) -> bool
    where
        T: PartialOrd,
    {
        self.p_max.x < self.p_min.x || self.p_max.y < self.p_min.y
    }

    /// Returns the vector along the box diagonal from the minimum point to
    /// the maximum point.
    pub fn diagonal(&self) -> Vector2<T> {
        self.p_max - self.p_min
    }
}

impl<T> From<Point2<T>> for Bounds2<T>
where
    T: Copy,
{
    /// Use a 2-D point as minimum and maximum 2-D bounds.
    ///
    /// * `p` - 2-D point.
    fn from(p: Point2<T>) -> Self {
        Bounds2 { p_min: p, p_max: p }
    }
}

impl<T: Num + PartialOrd + Copy> Union<Point2<T>> for Bounds2<T> {
    /// Return a bounding box containing itself and a point.
    ///
    /// * `other` - The point.
    fn union(&self, other: &Point2<T>) -> Self {
        Bounds2 {
            p_min: point2(min(self.p_min.x, other.x), min(self.p_min.y, other.y)),
            p_max: point2(max(self.p_max.x, other.x), max(self.p_max.y, other.y)),
        }
    }
}

impl<T: Num + PartialOrd + Copy> Union<Bounds2<T>> for Bounds2<T> {
    /// Return a bounding box containing both bounding boxes.
    ///
    /// * `other` - The other bounding box.
    fn union(&self, other: &Bounds2<T>) -> Self {
        Bounds2 {
            p_min: point2(
                min(self.p_min.x, other.p_min.x),
                min(self.p_min.y, other.p_min.y),
            ),
            p_max: point2(
                max(self.p_max.x, other.p_max.x),
                max(self.p_max.y, other.p_max.y),
            ),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
