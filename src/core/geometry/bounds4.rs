//! 4-D Axis Aligned Bounding Boxes.

use super::{point4, Point4, Point4f, Union, Vector4};
use crate::core::common::{max, min, Float, Int, INFINITY};
use num_traits::Num;

/// A 4-D Axis Aligned Bounding Box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds4<T> {
    /// Minimum bounds.
    pub p_min: Point4<T>,

    /// Maximum bounds.
    pub p_max: Point4<T>,
}

/// 4-D bounding box containing `Float` points.
pub type Bounds4f = Bounds4<Float>;

/// 4-D bounding box containing `Int` points.
pub type Bounds4i = Bounds4<Int>;

/// Creates a new 4-D bounding box from 2 points. The minimum and maximum bounds
/// are used for each coordinate axis.
///
/// * `p1` - First point.
/// * `p2` - Second point.
pub fn bounds4<T: Num + PartialOrd + Copy>(p1: Point4<T>, p2: Point4<T>) -> Bounds4<T> {
    Bounds4 {
        p_min: point4(
            min(p1.x, p2.x),
            min(p1.y, p2.y),
            min(p1.z, p2.z),
            min(p1.w, p2.w),
        ),
        p_max: point4(
            max(p1.x, p2.x),
            max(p1.y, p2.y),
            max(p1.z, p2.z),
            max(p1.w, p2.w),
        ),
    }
}

impl Bounds4f {
    /// An empty box where the minimum and maximum bounds are +∞ and -∞
    /// respectively, so it can be grown from nothing via unions.
    pub const EMPTY: Self = Self {
        p_min: Point4 {
            x: INFINITY,
            y: INFINITY,
            z: INFINITY,
            w: INFINITY,
        },
        p_max: Point4 {
            x: -INFINITY,
            y: -INFINITY,
            z: -INFINITY,
            w: -INFINITY,
        },
    };

    /// Returns the center of the bounding box.
    pub fn center(&self) -> Point4f {
        (self.p_min + self.p_max) * 0.5
    }
}

impl<T: Num + Copy> Bounds4<T> {
    /// Returns true if the bounds describe an empty box where any component
    /// of `p_max` is less than the corresponding component of `p_min`.
    pub fn is_empty(&self) -> bool
    where
        T: PartialOrd,
    {
        self.p_max.x < self.p_min.x
            || self.p_max.y < self.p_min.y
            || self.p_max.z < self.p_min.z
            || self.p_max.w < self.p_min.w
    }

    /// Returns the vector along the box diagonal from the minimum point to
    /// the maximum point.
    pub fn diagonal(&self) -> Vector4<T> {
        self.p_max - self.p_min
    }
}

impl<T> From<Point4<T>> for Bounds4<T>
where
    T: Copy,
{
    /// Use a 4-D point as minimum and maximum 4-D bounds.
    ///
    /// * `p` - 4-D point.
    fn from(p: Point4<T>) -> Self {
        Bounds4 { p_min: p, p_max: p }
    }
}

impl<T: Num + PartialOrd + Copy> Union<Point4<T>> for Bounds4<T> {
    /// Return a bounding box containing itself and a point.
    ///
    /// * `other` - The point.
    fn union(&self, other: &Point4<T>) -> Self {
        Bounds4 {
            p_min: point4(
                min(self.p_min.x, other.x),
                min(self.p_min.y, other.y),
                min(self.p_min.z, other.z),
                min(self.p_min.w, other.w),
            ),
            p_max: point4(
                max(self.p_max.x, other.x),
                max(self.p_max.y, other.y),
                max(self.p_max.z, other.z),
                max(self.p_max.w, other.w),
            ),
        }
    }
}

impl<T: Num + PartialOrd + Copy> Union<Bounds4<T>> for Bounds4<T> {
    /// Return a bounding box containing both bounding boxes.
    ///
    /// * `other` - The other bounding box.
    fn union(&self, other: &Bounds4<T>) -> Self {
        Bounds4 {
            p_min: point4(
                min(self.p_min.x, other.p_min.x),
                min(self.p_min.y, other.p_min.y),
                min(self.p_min.z, other.p_min.z),
                min(self.p_min.w, other.p_min.w),
            ),
            p_max: point4(
                max(self.p_max.x, other.p_max.x),
                max(self.p_max.y, other.p_max.y),
                max(self.p_max.z, other.p_max.z),
                max(self.p_max.w, other.p_max.w),
            ),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box() {
        assert!(Bounds4f::EMPTY.is_empty());
        assert!(!bounds4(point4(0.0, 0.0, 0.0, 0.0), point4(1.0, 1.0, 1.0, 1.0)).is_empty());
    }

    #[test]
    fn union_grows_from_empty() {
        let b = Bounds4f::EMPTY
            .union(&point4(1.0, 2.0, 3.0, 4.0))
            .union(&point4(-1.0, 0.0, 5.0, 2.0));
        assert_eq!(b.p_min, point4(-1.0, 0.0, 3.0, 2.0));
        assert_eq!(b.p_max, point4(1.0, 2.0, 5.0, 4.0));
    }

    #[test]
    fn center_and_diagonal() {
        let b = bounds4(point4(0.0, 2.0, -2.0, 0.0), point4(2.0, 4.0, 2.0, 1.0));
        assert_eq!(b.center(), point4(1.0, 3.0, 0.0, 0.5));
        assert_eq!(b.diagonal(), Vector4::new(2.0, 2.0, 4.0, 1.0));
    }
}
