//! 3-D Axis Aligned Bounding Boxes.

use super::{point3, Point3, Point3f, Union, Vector3};
use crate::core::common::{max, min, Float, Int, INFINITY};
use num_traits::Num;

/// A 3-D Axis Aligned Bounding Box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds3<T> {
    /// Minimum bounds.
    pub p_min: Point3<T>,

    /// Maximum bounds.
    pub p_max: Point3<T>,
}

/// 3-D bounding box containing `Float` points.
pub type Bounds3f = Bounds3<Float>;

/// 3-D bounding box containing `Int` points.
pub type Bounds3i = Bounds3<Int>;

/// Creates a new 3-D bounding box from 2 points. The minimum and maximum bounds
/// are used for each coordinate axis.
///
/// * `p1` - First point.
/// * `p2` - Second point.
pub fn bounds3<T: Num + PartialOrd + Copy>(p1: Point3<T>, p2: Point3<T>) -> Bounds3<T> {
    Bounds3 {
        p_min: point3(min(p1.x, p2.x), min(p1.y, p2.y), min(p1.z, p2.z)),
        p_max: point3(max(p1.x, p2.x), max(p1.y, p2.y), max(p1.z, p2.z)),
    }
}

impl Bounds3f {
    /// An empty box where the minimum and maximum bounds are +∞ and -∞
    /// respectively, so it can be grown from nothing via unions.
    pub const EMPTY: Self = Self {
        p_min: Point3 {
            x: INFINITY,
            y: INFINITY,
            z: INFINITY,
        },
        p_max: Point3 {
            x: -INFINITY,
            y: -INFINITY,
            z: -INFINITY,
        },
    };

    /// Returns the center of the bounding box.
    pub fn center(&self) -> Point3f {
        (self.p_min + self.p_max) * 0.5
    }
}

impl<T: Num + Copy> Bounds3<T> {
    /// Returns true if the bounds describe an empty box where any component
    /// of `p_max` is less than the corresponding component of `p_min`.
    pub fn is_empty(&self) -> bool
    where
        T: PartialOrd,
    {
        self.p_max.x < self.p_min.x || self.p_max.y < self.p_min.y || self.p_max.z < self.p_min.z
    }

    /// Returns the vector along the box diagonal from the minimum point to
    /// the maximum point.
    pub fn diagonal(&self) -> Vector3<T> {
        self.p_max - self.p_min
    }
}

impl<T> From<Point3<T>> for Bounds3<T>
where
    T: Copy,
{
    /// Use a 3-D point as minimum and maximum 3-D bounds.
    ///
    /// * `p` - 3-D point.
    fn from(p: Point3<T>) -> Self {
        Bounds3 { p_min: p, p_max: p }
    }
}

impl<T: Num + PartialOrd + Copy> Union<Point3<T>> for Bounds3<T> {
    /// Return a bounding box containing itself and a point.
    ///
    /// * `other` - The point.
    fn union(&self, other: &Point3<T>) -> Self {
        Bounds3 {
            p_min: point3(
                min(self.p_min.x, other.x),
                min(self.p_min.y, other.y),
                min(self.p_min.z, other.z),
            ),
            p_max: point3(
                max(self.p_max.x, other.x),
                max(self.p_max.y, other.y),
                max(self.p_max.z, other.z),
            ),
        }
    }
}

impl<T: Num + PartialOrd + Copy> Union<Bounds3<T>> for Bounds3<T> {
    /// Return a bounding box containing both bounding boxes.
    ///
    /// * `other` - The other bounding box.
    fn union(&self, other: &Bounds3<T>) -> Self {
        Bounds3 {
            p_min: point3(
                min(self.p_min.x, other.p_min.x),
                min(self.p_min.y, other.p_min.y),
                min(self.p_min.z, other.p_min.z),
            ),
            p_max: point3(
                max(self.p_max.x, other.p_max.x),
                max(self.p_max.y, other.p_max.y),
                max(self.p_max.z, other.p_max.z),
            ),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
