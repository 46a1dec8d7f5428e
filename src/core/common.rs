//! Common stuff

use num_traits::Num;

/// Use 32-bit precision for floating point numbers.
pub type Float = f32;

/// Default signed integer to 32-bit.
pub type Int = i32;

/// Infinty (∞)
pub const INFINITY: Float = Float::INFINITY;

/// Axis enumeration
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Axis {
    #[default]
    X = 0,
    Y = 1,
    Z = 2,
    W = 3,
}

impl From<usize> for Axis {
    /// Convert an index in [0, 4) to the corresponding axis.
    ///
    /// * `i` - The axis index.
    fn from(i: usize) -> Self {
        match i {
            0 => Axis::X,
            1 => Axis::Y,
            2 => Axis::Z,
            3 => Axis::W,
            _ => panic!("Invalid index {} for Axis", i),
        }
    }
}

/// Returns the minimum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
pub fn min<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a < b {
        a
    } else {
        b
    }
}

/// Returns the maximum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
pub fn max<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a > b {
        a
    } else {
        b
    }
}

/// Clamps a value between a lower and upper bound.
///
/// * `v`  - The value.
/// * `lo` - Lower bound.
/// * `hi` - Upper bound.
pub fn clamp<T>(v: T, lo: T, hi: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    min(max(v, lo), hi)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
