//! Parallel construction of bounding volume hierarchies (BVHs) over
//! axis-aligned bounding boxes.
//!
//! The central entry point is [`builders::morton::build`], which turns a slice
//! of primitive boxes into a [`bvh::BinaryBvh`]: a flat node array plus a
//! Morton-ordered permutation of the valid primitive indices. Primitives whose
//! boxes are empty are compacted out of the result. 2-D, 3-D and 4-D boxes are
//! supported through the same build path; the dimension is picked by the box
//! type handed to `build`.

#[macro_use]
extern crate log;

pub mod builders;
pub mod bvh;
pub mod core;

pub use builders::morton::{build, build_with};
pub use builders::{BuildBounds, BuildConfig, BuildScratch};
pub use bvh::{BinaryBvh, Node};
