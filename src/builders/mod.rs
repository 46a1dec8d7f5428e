//! BVH builders.

use crate::bvh::Node;
use crate::core::common::min;
use crate::core::geometry::*;

pub mod morton;
pub mod radix;
pub mod refit;

pub use morton::codes::{MortonCode, Quantizer};
pub use radix::{PairSorter, RadixPairSorter, SortScratch};

use morton::expand::TempNode;
use std::sync::atomic::AtomicU64;

/// Number of work items handed to one parallel task at a time. Per-chunk
/// results are accumulated locally and promoted to shared atomics once per
/// chunk to keep contention off the shared state.
pub(crate) const BLOCK_SIZE: usize = 1024;

/// The builder's view of a primitive bounding box. Implemented for the 2-D,
/// 3-D and 4-D `Float` boxes; the associated point type selects the Morton
/// key layout.
pub trait BuildBounds: Copy + Send + Sync + Sized {
    /// The corner/center point type.
    type Point: MortonCode;

    /// Returns the empty box (+∞ lower, -∞ upper corners).
    fn empty() -> Self;

    /// Assemble a box from its corners without reordering them, so empty
    /// boxes survive the round trip.
    ///
    /// * `lower` - Lower corner.
    /// * `upper` - Upper corner.
    fn from_corners(lower: Self::Point, upper: Self::Point) -> Self;

    /// Returns true if any component of the upper corner is below the
    /// corresponding component of the lower corner.
    fn is_empty(&self) -> bool;

    /// Returns the center point.
    fn center(&self) -> Self::Point;

    /// Returns the lower corner.
    fn lower(&self) -> Self::Point;

    /// Returns the upper corner.
    fn upper(&self) -> Self::Point;

    /// Returns the box grown to contain a point.
    ///
    /// * `p` - The point.
    fn grow(&self, p: &Self::Point) -> Self;

    /// Returns the box grown to contain another box.
    ///
    /// * `other` - The other box.
    fn merge(&self, other: &Self) -> Self;
}

impl BuildBounds for Bounds2f {
    type Point = Point2f;

    fn empty() -> Self {
        Self::EMPTY
    }

    fn from_corners(lower: Point2f, upper: Point2f) -> Self {
        Self {
            p_min: lower,
            p_max: upper,
        }
    }

    fn is_empty(&self) -> bool {
        Bounds2::is_empty(self)
    }

    fn center(&self) -> Point2f {
        Bounds2f::center(self)
    }

    fn lower(&self) -> Point2f {
        self.p_min
    }

    fn upper(&self) -> Point2f {
        self.p_max
    }

    fn grow(&self, p: &Point2f) -> Self {
        self.union(p)
    }

    fn merge(&self, other: &Self) -> Self {
        self.union(other)
    }
}

impl BuildBounds for Bounds3f {
    type Point = Point3f;

    fn empty() -> Self {
        Self::EMPTY
    }

    fn from_corners(lower: Point3f, upper: Point3f) -> Self {
        Self {
            p_min: lower,
            p_max: upper,
        }
    }

    fn is_empty(&self) -> bool {
        Bounds3::is_empty(self)
    }

    fn center(&self) -> Point3f {
        Bounds3f::center(self)
    }

    fn lower(&self) -> Point3f {
        self.p_min
    }

    fn upper(&self) -> Point3f {
        self.p_max
    }

    fn grow(&self, p: &Point3f) -> Self {
        self.union(p)
    }

    fn merge(&self, other: &Self) -> Self {
        self.union(other)
    }
}

impl BuildBounds for Bounds4f {
    type Point = Point4f;

    fn empty() -> Self {
        Self::EMPTY
    }

    fn from_corners(lower: Point4f, upper: Point4f) -> Self {
        Self {
            p_min: lower,
            p_max: upper,
        }
    }

    fn is_empty(&self) -> bool {
        Bounds4::is_empty(self)
    }

    fn center(&self) -> Point4f {
        Bounds4f::center(self)
    }

    fn lower(&self) -> Point4f {
        self.p_min
    }

    fn upper(&self) -> Point4f {
        self.p_max
    }

    fn grow(&self, p: &Point4f) -> Self {
        self.union(p)
    }

    fn merge(&self, other: &Self) -> Self {
        self.union(other)
    }
}

/// Configuration for a BVH build.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BuildConfig {
    /// Ranges at or below this size become leaves without trying to split.
    /// 0 means "use the default of 1" (split all the way down to singletons).
    pub leaf_threshold: u32,

    /// Upper clamp applied to `leaf_threshold`. A range whose keys are all
    /// identical still becomes a single leaf regardless of this cap, since
    /// no split can separate it.
    pub max_allowed_leaf_size: u32,
}

impl Default for BuildConfig {
    /// Returns the "default value" for `BuildConfig`: singleton leaves.
    fn default() -> Self {
        Self {
            leaf_threshold: 1,
            max_allowed_leaf_size: Node::MAX_LEAF_COUNT,
        }
    }
}

impl BuildConfig {
    /// Sets the leaf threshold.
    ///
    /// * `n` - Largest range size finalized as a leaf without splitting.
    pub fn with_leaf_threshold(mut self, n: u32) -> Self {
        self.leaf_threshold = n;
        self
    }

    /// Sets the upper clamp on the leaf threshold.
    ///
    /// * `n` - Largest allowed leaf size.
    pub fn with_max_allowed_leaf_size(mut self, n: u32) -> Self {
        self.max_allowed_leaf_size = n;
        self
    }

    /// The threshold the build actually uses:
    /// `min(leaf_threshold, max_allowed_leaf_size)` when a threshold was
    /// requested, 1 otherwise.
    pub(crate) fn effective_leaf_threshold(&self) -> u32 {
        let max_allowed = self.max_allowed_leaf_size.max(1);
        if self.leaf_threshold > 0 {
            min(self.leaf_threshold, max_allowed)
        } else {
            1
        }
    }
}

/// Reusable temporary buffers for a build: the unsorted key/index pairs, the
/// radix sort's double buffers, and the temp-node array. Reusing one
/// `BuildScratch` across builds avoids re-allocating them each time; all
/// growth goes through `try_reserve` so exhaustion reports instead of
/// aborting.
#[derive(Default)]
pub struct BuildScratch {
    /// Morton keys, one per primitive; truncated to the valid count.
    pub(crate) keys: Vec<u64>,

    /// Primitive indices paired with `keys`.
    pub(crate) prim_ids: Vec<u32>,

    /// Temp nodes, stored as their raw bits so parallel tasks can publish
    /// children without aliasing a mutable slice.
    pub(crate) nodes: Vec<AtomicU64>,

    /// Double buffers for the pair sorter.
    pub(crate) sort: SortScratch,
}

impl BuildScratch {
    /// Create an empty `BuildScratch`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Size the key/index buffers for `n` primitives.
    ///
    /// * `n` - Primitive count.
    pub(crate) fn prepare_pairs(&mut self, n: usize) -> Result<(), String> {
        grow_cleared(&mut self.keys, n, || 0)?;
        grow_cleared(&mut self.prim_ids, n, || 0)
    }

    /// Size the temp-node buffer for `n` nodes, all cleared to zero bits.
    ///
    /// * `n` - Node capacity.
    pub(crate) fn prepare_nodes(&mut self, n: usize) -> Result<(), String> {
        grow_cleared(&mut self.nodes, n, || AtomicU64::new(TempNode::default().to_bits()))
    }
}

/// Clears a buffer and regrows it to `n` elements, surfacing allocation
/// failure instead of aborting.
///
/// * `v`    - The buffer.
/// * `n`    - Requested length.
/// * `fill` - Element initializer.
pub(crate) fn grow_cleared<T>(
    v: &mut Vec<T>,
    n: usize,
    fill: impl FnMut() -> T,
) -> Result<(), String> {
    v.clear();
    v.try_reserve(n)
        .map_err(|e| format!("failed to allocate {} temp elements: {}", n, e))?;
    v.resize_with(n, fill);
    Ok(())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{bounds3, point3};

    #[test]
    fn effective_leaf_threshold_clamps_to_max_allowed() {
        let config = BuildConfig::default()
            .with_leaf_threshold(16)
            .with_max_allowed_leaf_size(8);
        assert_eq!(config.effective_leaf_threshold(), 8);
    }

    #[test]
    fn zero_leaf_threshold_defaults_to_one() {
        let config = BuildConfig::default().with_leaf_threshold(0);
        assert_eq!(config.effective_leaf_threshold(), 1);
    }

    #[test]
    fn large_leaf_sizes_pass_through() {
        let config = BuildConfig::default()
            .with_leaf_threshold(300)
            .with_max_allowed_leaf_size(100_000);
        assert_eq!(config.effective_leaf_threshold(), 300);

        let config = BuildConfig::default()
            .with_leaf_threshold(100_000)
            .with_max_allowed_leaf_size(100_000);
        assert_eq!(config.effective_leaf_threshold(), 100_000);
    }

    #[test]
    fn from_corners_keeps_empty_boxes_empty() {
        let b = Bounds3f::from_corners(point3(1.0, 1.0, 1.0), point3(0.0, 0.0, 0.0));
        assert!(BuildBounds::is_empty(&b));
    }

    #[test]
    fn grow_and_merge_delegate_to_union() {
        let b = bounds3(point3(0.0, 0.0, 0.0), point3(1.0, 1.0, 1.0));
        let grown = b.grow(&point3(2.0, 0.5, -1.0));
        assert_eq!(grown.p_max.x, 2.0);
        assert_eq!(grown.p_min.z, -1.0);

        let merged = b.merge(&bounds3(point3(-1.0, 0.0, 0.0), point3(0.5, 3.0, 1.0)));
        assert_eq!(merged.p_min.x, -1.0);
        assert_eq!(merged.p_max.y, 3.0);
    }
}
