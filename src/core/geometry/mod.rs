//! Geometry

// Define macros for property based testing.
#[cfg(test)]
#[macro_export]
macro_rules! prop_range {
    ($name: ident, $t: ty, $r: expr) => {
        prop_compose! {
            fn $name()(f in $r) -> $t {
                f
            }
        }
    };
}

#[cfg(test)]
#[macro_export]
macro_rules! prop_point2 {
    ($name: ident, $t: ty, $xr: expr, $yr: expr) => {
        prop_compose! {
            fn $name()(x in $xr, y in $yr) -> Point2<$t> {
                Point2 { x, y }
            }
        }
    };
}

#[cfg(test)]
#[macro_export]
macro_rules! prop_point3 {
    ($name: ident, $t: ty, $xr: expr, $yr: expr, $zr: expr) => {
        prop_compose! {
            fn $name()(x in $xr, y in $yr, z in $zr) -> Point3<$t> {
                Point3 { x, y, z }
            }
        }
    };
}

#[cfg(test)]
#[macro_export]
macro_rules! prop_point4 {
    ($name: ident, $t: ty, $xr: expr, $yr: expr, $zr: expr, $wr: expr) => {
        prop_compose! {
            fn $name()(x in $xr, y in $yr, z in $zr, w in $wr) -> Point4<$t> {
                Point4 { x, y, z, w }
            }
        }
    };
}

mod bounds2;
mod bounds3;
mod bounds4;
mod common;
mod point2;
mod point3;
mod point4;
mod vector2;
mod vector3;
mod vector4;

// Re-export
pub use bounds2::*;
pub use bounds3::*;
pub use bounds4::*;
pub use common::*;
pub use point2::*;
pub use point3::*;
pub use point4::*;
pub use vector2::*;
pub use vector3::*;
pub use vector4::*;
