//! 4-D Points

use super::Vector4;
use crate::core::common::{Axis, Float, Int};
use num_traits::{Num, Zero};
use std::ops::{Add, Index, IndexMut, Mul, Sub};

/// A 4-D point containing numeric values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point4<T> {
    /// X-coordinate.
    pub x: T,

    /// Y-coordinate.
    pub y: T,

    /// Z-coordinate.
    pub z: T,

    /// W-coordinate.
    pub w: T,
}

/// 4-D point containing `Float` values.
pub type Point4f = Point4<Float>;

/// 4-D point containing `Int` values.
pub type Point4i = Point4<Int>;

/// Creates a new 4-D point.
///
/// * `x` - X-coordinate.
/// * `y` - Y-coordinate.
/// * `z` - Z-coordinate.
/// * `w` - W-coordinate.
pub fn point4<T: Num>(x: T, y: T, z: T, w: T) -> Point4<T> {
    Point4::new(x, y, z, w)
}

impl<T: Num> Point4<T> {
    /// Creates a new 4-D point.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    /// * `z` - Z-coordinate.
    /// * `w` - W-coordinate.
    pub fn new(x: T, y: T, z: T, w: T) -> Self {
        Self { x, y, z, w }
    }

    /// Creates a new 4-D zero point.
    pub fn zero() -> Self
    where
        T: Zero,
    {
        Self::new(T::zero(), T::zero(), T::zero(), T::zero())
    }

    /// Returns true if any coordinate is NaN.
    pub fn has_nans(&self) -> bool
    where
        T: num_traits::Float,
    {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan() || self.w.is_nan()
    }
}

impl<T: Num> Add for Point4<T> {
    type Output = Self;

    /// Adds the coordinates of the given point and returns the result.
    ///
    /// * `other` - The point to add.
    fn add(self, other: Self) -> Self::Output {
        Self::Output::new(
            self.x + other.x,
            self.y + other.y,
            self.z + other.z,
            self.w + other.w,
        )
    }
}

impl<T: Num> Sub for Point4<T> {
    type Output = Vector4<T>;

    /// Subtracts the given point and returns the vector between the two.
    ///
    /// * `other` - The point to subtract.
    fn sub(self, other: Self) -> Self::Output {
        Self::Output::new(
            self.x - other.x,
            self.y - other.y,
            self.z - other.z,
            self.w - other.w,
        )
    }
}

impl<T: Num + Copy> Mul<T> for Point4<T> {
    type Output = Point4<T>;

    /// Scale the point's coordinates.
    ///
    /// * `f` - The scaling factor.
    fn mul(self, f: T) -> Self::Output {
        Self::Output::new(f * self.x, f * self.y, f * self.z, f * self.w)
    }
}

impl<T> Index<Axis> for Point4<T> {
    type Output = T;

    /// Index the point by an axis to get the immutable coordinate axis value.
    ///
    /// * `axis` - A 4-D coordinate axis.
    fn index(&self, axis: Axis) -> &Self::Output {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
            Axis::W => &self.w,
        }
    }
}

impl<T> Index<usize> for Point4<T> {
    type Output = T;

    /// Index the point by an axis to get the immutable coordinate axis value.
    ///
    /// * `axis` - A 4-D coordinate axis.
    fn index(&self, axis: usize) -> &Self::Output {
        &self[Axis::from(axis)]
    }
}

impl<T> IndexMut<Axis> for Point4<T> {
    /// Index the point by an axis to get a mutable coordinate axis value.
    ///
    /// * `axis` - A 4-D coordinate axis.
    fn index_mut(&mut self, axis: Axis) -> &mut Self::Output {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
            Axis::W => &mut self.w,
        }
    }
}

impl<T> IndexMut<usize> for Point4<T> {
    /// Index the point by an axis to get a mutable coordinate axis value.
    ///
    /// * `axis` - A 4-D coordinate axis.
    fn index_mut(&mut self, axis: usize) -> &mut Self::Output {
        &mut self[Axis::from(axis)]
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
