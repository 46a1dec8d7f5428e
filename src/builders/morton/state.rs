//! Build-state accumulator: the centroid bounds grown atomically across the
//! fill pass, the valid-primitive count, and the node-allocation counter.

use super::codes::{MortonCode, Quantizer};
use crate::builders::{BuildBounds, BLOCK_SIZE};
use crate::core::common::INFINITY;
use crate::core::parallel::AtomicFloat;
use rayon::prelude::*;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

/// A bounding box whose corners can be grown concurrently. Four slots per
/// corner cover every supported dimension; only the first
/// `B::Point::DIM` are used.
pub(crate) struct AtomicBounds<B: BuildBounds> {
    /// Per-axis lower corner.
    lower: [AtomicFloat; 4],

    /// Per-axis upper corner.
    upper: [AtomicFloat; 4],

    _marker: PhantomData<B>,
}

impl<B: BuildBounds> AtomicBounds<B> {
    /// Create a new `AtomicBounds` cleared to the empty box.
    pub fn new() -> Self {
        let bounds = Self {
            lower: Default::default(),
            upper: Default::default(),
            _marker: PhantomData,
        };
        bounds.clear();
        bounds
    }

    /// Reset to the empty box (+∞ lower, -∞ upper).
    pub fn clear(&self) {
        for axis in 0..<B::Point as MortonCode>::DIM {
            self.lower[axis].store(INFINITY);
            self.upper[axis].store(-INFINITY);
        }
    }

    /// Atomically grow the box to contain another box.
    ///
    /// * `other` - The box to include.
    pub fn grow(&self, other: &B) {
        let lo = other.lower();
        let hi = other.upper();
        for axis in 0..<B::Point as MortonCode>::DIM {
            self.lower[axis].fetch_min(lo[axis]);
            self.upper[axis].fetch_max(hi[axis]);
        }
    }

    /// Convert to a plain box, which is cheaper to read from here on.
    pub fn make_box(&self) -> B {
        let mut lo = B::Point::default();
        let mut hi = B::Point::default();
        for axis in 0..<B::Point as MortonCode>::DIM {
            lo[axis] = self.lower[axis].load();
            hi[axis] = self.upper[axis].load();
        }
        B::from_corners(lo, hi)
    }
}

/// High-level summary of a build in flight.
pub(crate) struct BuildState<B: BuildBounds> {
    /// Bounds of the valid primitives' centers, relative to which the Morton
    /// keys are quantized.
    cent_bounds: AtomicBounds<B>,

    /// Number of valid primitives. Starts at the input count; the fill pass
    /// subtracts one per empty primitive, so after `finish` it holds the
    /// length of the compacted key range.
    num_valid: AtomicI64,

    /// Number of temp nodes allocated so far by the tree expansion.
    pub(crate) nodes_alloced: AtomicU32,
}

impl<B: BuildBounds> BuildState<B> {
    /// Create a cleared build state.
    ///
    /// * `num_prims` - Total input primitive count, empties included.
    pub fn new(num_prims: usize) -> Self {
        Self {
            cent_bounds: AtomicBounds::new(),
            num_valid: AtomicI64::new(num_prims as i64),
            nodes_alloced: AtomicU32::new(0),
        }
    }

    /// Grow the centroid bounds by the center of every non-empty primitive
    /// and discount the empty ones from the valid count. Each chunk
    /// accumulates locally and touches the shared state once.
    ///
    /// * `prims` - The input boxes.
    pub fn fill(&self, prims: &[B]) {
        prims.par_chunks(BLOCK_SIZE).for_each(|chunk| {
            let mut local = B::empty();
            let mut num_empty = 0i64;
            for prim in chunk {
                if prim.is_empty() {
                    num_empty += 1;
                } else {
                    local = local.grow(&prim.center());
                }
            }
            if !local.is_empty() {
                self.cent_bounds.grow(&local);
            }
            if num_empty > 0 {
                self.num_valid.fetch_sub(num_empty, Ordering::SeqCst);
            }
        });
    }

    /// Convert the accumulator into a plain box and the quantizer
    /// coefficients derived from it.
    pub fn finish(&self) -> (B, Quantizer<B::Point>) {
        let cent_bounds = self.cent_bounds.make_box();
        let quantizer = Quantizer::new(&cent_bounds.lower(), &cent_bounds.upper());
        (cent_bounds, quantizer)
    }

    /// Number of valid primitives, clamped at zero.
    pub fn num_valid_prims(&self) -> usize {
        self.num_valid.load(Ordering::SeqCst).max(0) as usize
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
