//! Morton-code linear BVH builder.
//!
//! The build runs in four phases over the input boxes:
//!
//! 1. accumulate the centroid bounds of the valid primitives and derive the
//!    fixed-point quantizer from them;
//! 2. produce one (Morton key, primitive id) pair per valid primitive,
//!    compacting empties out, and sort the pairs by key;
//! 3. grow the temporary node array breadth-first, one level per pass,
//!    splitting each range on the longest common prefix of its keys;
//! 4. pack the finished temp nodes into the final layout and refit the
//!    per-node bounds bottom-up.
//!
//! Phases 1–3 run as data-parallel passes; the driver only joins between
//! passes to read the shared counters.

pub mod codes;
pub(crate) mod expand;
pub(crate) mod keys;
pub(crate) mod state;

use self::expand::TempNode;
use self::state::BuildState;
use super::{refit, BuildBounds, BuildConfig, BuildScratch, PairSorter, RadixPairSorter};
use crate::bvh::{BinaryBvh, Node};
use std::mem;
use std::sync::atomic::Ordering;

/// Build a binary BVH over the given boxes with scratch buffers allocated
/// for this call only. See [`build_with`].
///
/// * `prims`  - The input boxes; one primitive per box, identified by index.
/// * `config` - Leaf sizing configuration.
pub fn build<B: BuildBounds>(prims: &[B], config: &BuildConfig) -> Result<BinaryBvh<B>, String> {
    let mut scratch = BuildScratch::new();
    build_with(prims, config, &mut scratch, &RadixPairSorter)
}

/// Build a binary BVH over the given boxes.
///
/// Primitives with empty boxes are filtered out; the remaining ones appear
/// in exactly one leaf each, in Morton order along the quantized centroid
/// curve. On success the returned hierarchy has its topology, per-node
/// bounds and primitive permutation fully populated.
///
/// * `prims`   - The input boxes; one primitive per box, identified by index.
/// * `config`  - Leaf sizing configuration.
/// * `scratch` - Reusable temporary buffers.
/// * `sorter`  - Sorts the (key, id) pairs by ascending key.
pub fn build_with<B, S>(
    prims: &[B],
    config: &BuildConfig,
    scratch: &mut BuildScratch,
    sorter: &S,
) -> Result<BinaryBvh<B>, String>
where
    B: BuildBounds,
    S: PairSorter,
{
    let leaf_threshold = config.effective_leaf_threshold();
    let num_prims = prims.len();

    // ------------------------------------------------------------------
    // Phase 1: centroid bounds of the valid primitives, quantizer
    // coefficients derived from them, and the valid-primitive count.
    // ------------------------------------------------------------------
    let state = BuildState::<B>::new(num_prims);
    state.fill(prims);
    let (_cent_bounds, quantizer) = state.finish();
    let num_valid = state.num_valid_prims();

    if 2 * (num_valid as u64) > Node::MAX_OFFSET as u64 + 1 {
        return Err(format!(
            "{} valid primitives exceed the packed node offset range",
            num_valid
        ));
    }
    debug!(
        "computing morton keys for {} of {} prims",
        num_valid, num_prims
    );

    // ------------------------------------------------------------------
    // Phase 2: unsorted (key, id) pairs with empties compacted out, then
    // the pair sort that puts them in Morton order.
    // ------------------------------------------------------------------
    scratch.prepare_pairs(num_prims)?;
    keys::compute_unsorted_pairs(
        &quantizer,
        prims,
        num_valid,
        &mut scratch.keys,
        &mut scratch.prim_ids,
    );
    scratch.keys.truncate(num_valid);
    scratch.prim_ids.truncate(num_valid);
    sorter.sort_pairs(&mut scratch.keys, &mut scratch.prim_ids, &mut scratch.sort)?;

    // ------------------------------------------------------------------
    // Phase 3: breadth-first node expansion. The root opens the whole
    // range; every pass processes the nodes created by the previous one
    // until no new nodes appear. A binary tree over `num_valid` leaves
    // holds at most `2 * num_valid` nodes.
    // ------------------------------------------------------------------
    scratch.prepare_nodes(2 * num_valid.max(1))?;
    scratch.nodes[0].store(
        TempNode::open(0, num_valid as u32).to_bits(),
        Ordering::SeqCst,
    );
    state.nodes_alloced.store(1, Ordering::SeqCst);

    let mut num_done = 0usize;
    let mut num_alloced = 1usize;
    while num_done < num_alloced {
        expand::create_nodes(
            &state.nodes_alloced,
            leaf_threshold,
            &scratch.nodes,
            num_done,
            num_alloced,
            &scratch.keys,
        );
        num_done = num_alloced;
        num_alloced = state.nodes_alloced.load(Ordering::SeqCst) as usize;
    }

    // ------------------------------------------------------------------
    // Phase 4: pack the finished temp nodes into the final layout; the
    // sorted ids become the hierarchy's primitive order, and refit fills
    // the per-node bounds.
    // ------------------------------------------------------------------
    let mut nodes = Vec::new();
    nodes
        .try_reserve(num_alloced)
        .map_err(|e| format!("failed to allocate {} nodes: {}", num_alloced, e))?;
    nodes.extend(scratch.nodes[..num_alloced].iter().map(|bits| {
        let temp = TempNode::from_bits(bits.load(Ordering::SeqCst));
        Node::new(temp.offset(), temp.count())
    }));

    let mut bounds = Vec::new();
    bounds
        .try_reserve(num_alloced)
        .map_err(|e| format!("failed to allocate {} node bounds: {}", num_alloced, e))?;
    bounds.resize(num_alloced, B::empty());

    let mut bvh = BinaryBvh {
        nodes,
        bounds,
        prim_ids: mem::take(&mut scratch.prim_ids),
    };
    refit::refit(&mut bvh, prims);

    info!(
        "built BVH with {} nodes over {} of {} prims",
        num_alloced, num_valid, num_prims
    );
    Ok(bvh)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::codes::Quantizer;
    use super::state::BuildState;
    use super::*;
    use crate::core::geometry::*;
    use float_cmp::approx_eq;
    use itertools::Itertools;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn point_box(x: f32, y: f32, z: f32) -> Bounds3f {
        bounds3(point3(x, y, z), point3(x, y, z))
    }

    fn unit_box_at(x: f32, y: f32, z: f32) -> Bounds3f {
        bounds3(
            point3(x - 0.5, y - 0.5, z - 0.5),
            point3(x + 0.5, y + 0.5, z + 0.5),
        )
    }

    fn empty_box() -> Bounds3f {
        Bounds3f {
            p_min: point3(1.0, 1.0, 1.0),
            p_max: point3(0.0, 0.0, 0.0),
        }
    }

    /// Leaf (offset, count) pairs reachable from the root.
    fn collect_leaves<B: BuildBounds>(bvh: &BinaryBvh<B>) -> Vec<(u32, u32)> {
        let mut leaves = vec![];
        if bvh.num_prims() == 0 {
            return leaves;
        }
        let mut stack = vec![0usize];
        while let Some(node_id) = stack.pop() {
            let node = bvh.nodes[node_id];
            if node.is_leaf() {
                leaves.push((node.offset(), node.count()));
            } else {
                stack.push(node.offset() as usize);
                stack.push(node.offset() as usize + 1);
            }
        }
        leaves.sort_unstable();
        leaves
    }

    /// The sorted keys implied by the output permutation.
    fn output_keys(bvh: &BinaryBvh<Bounds3f>, prims: &[Bounds3f]) -> Vec<u64> {
        let state = BuildState::new(prims.len());
        state.fill(prims);
        let (_, quantizer) = state.finish();
        bvh.prim_ids
            .iter()
            .map(|&id| quantizer.encode(&prims[id as usize].center()))
            .collect()
    }

    /// Checks the structural invariants every build must satisfy.
    fn check_invariants(prims: &[Bounds3f], bvh: &BinaryBvh<Bounds3f>, config: &BuildConfig) {
        // Every valid primitive appears in the output exactly once.
        let mut expected: Vec<u32> = (0..prims.len())
            .filter(|&i| !prims[i].is_empty())
            .map(|i| i as u32)
            .collect();
        let mut got = bvh.prim_ids.clone();
        expected.sort_unstable();
        got.sort_unstable();
        assert_eq!(got, expected);

        // Reachable leaves tile the primitive range exactly.
        let leaves = collect_leaves(bvh);
        let mut next = 0u32;
        for &(offset, count) in &leaves {
            assert_eq!(offset, next);
            assert!(count > 0);
            next += count;
        }
        assert_eq!(next as usize, bvh.num_prims());

        // Children are contiguous and follow their parent.
        for (node_id, node) in bvh.nodes.iter().enumerate() {
            if !node.is_leaf() {
                assert!((node.offset() as usize) > node_id);
                assert!((node.offset() as usize + 1) < bvh.num_nodes());
            }
        }

        // Keys are non-decreasing along the output permutation, and a leaf
        // only exceeds the threshold when all its keys collide.
        let keys = output_keys(bvh, prims);
        for (a, b) in keys.iter().tuple_windows() {
            assert!(a <= b);
        }
        let threshold = config.effective_leaf_threshold();
        for &(offset, count) in &leaves {
            if count > threshold {
                let range = &keys[offset as usize..(offset + count) as usize];
                assert!(range.iter().all(|&k| k == range[0]));
            }
        }

        // Node bounds contain their children's bounds and primitives.
        for (node_id, node) in bvh.nodes.iter().enumerate() {
            if bvh.num_prims() == 0 {
                break;
            }
            if node.is_leaf() {
                let mut expected = Bounds3f::EMPTY;
                for &prim_id in
                    &bvh.prim_ids[node.offset() as usize..(node.offset() + node.count()) as usize]
                {
                    expected = expected.merge(&prims[prim_id as usize]);
                }
                assert_eq!(bvh.bounds[node_id], expected);
            } else {
                let child = node.offset() as usize;
                assert_eq!(
                    bvh.bounds[node_id],
                    bvh.bounds[child].merge(&bvh.bounds[child + 1])
                );
            }
        }
    }

    #[test]
    fn singleton() {
        let prims = vec![bounds3(point3(0.0, 0.0, 0.0), point3(1.0, 1.0, 1.0))];
        let bvh = build(&prims, &BuildConfig::default()).unwrap();

        assert_eq!(bvh.num_prims(), 1);
        assert_eq!(bvh.num_nodes(), 1);
        assert_eq!(bvh.nodes[0], Node::new(0, 1));
        assert_eq!(bvh.prim_ids, vec![0]);
        assert_eq!(bvh.bounds[0], prims[0]);
    }

    #[test]
    fn two_well_separated_points() {
        let prims = vec![point_box(0.0, 0.0, 0.0), point_box(1.0, 1.0, 1.0)];
        let bvh = build(&prims, &BuildConfig::default().with_leaf_threshold(1)).unwrap();

        assert_eq!(bvh.num_prims(), 2);
        assert_eq!(bvh.num_nodes(), 3);
        assert_eq!(bvh.nodes[0], Node::new(1, 0));
        assert_eq!(bvh.nodes[1], Node::new(0, 1));
        assert_eq!(bvh.nodes[2], Node::new(1, 1));

        // The point with the smaller Morton code comes first.
        assert_eq!(bvh.prim_ids, vec![0, 1]);
        check_invariants(&prims, &bvh, &BuildConfig::default());
    }

    #[test]
    fn two_points_swap_into_morton_order() {
        let prims = vec![point_box(1.0, 1.0, 1.0), point_box(0.0, 0.0, 0.0)];
        let bvh = build(&prims, &BuildConfig::default()).unwrap();
        assert_eq!(bvh.prim_ids, vec![1, 0]);
    }

    #[test]
    fn empty_prims_are_filtered_out() {
        let prims = vec![point_box(0.0, 0.0, 0.0), empty_box(), point_box(1.0, 1.0, 1.0)];
        let bvh = build(&prims, &BuildConfig::default()).unwrap();

        assert_eq!(bvh.num_prims(), 2);
        assert!(!bvh.prim_ids.contains(&1));
        check_invariants(&prims, &bvh, &BuildConfig::default());
    }

    #[test]
    fn no_prims_yields_an_empty_leaf_root() {
        let bvh = build::<Bounds3f>(&[], &BuildConfig::default()).unwrap();
        assert_eq!(bvh.num_nodes(), 1);
        assert_eq!(bvh.num_prims(), 0);
        assert_eq!(bvh.nodes[0], Node::new(0, 0));
        assert!(bvh.nodes[0].is_leaf());
        assert!(bvh.bounds[0].is_empty());
    }

    #[test]
    fn all_empty_prims_yield_an_empty_leaf_root() {
        let prims = vec![empty_box(); 9];
        let bvh = build(&prims, &BuildConfig::default()).unwrap();
        assert_eq!(bvh.num_nodes(), 1);
        assert_eq!(bvh.num_prims(), 0);
        assert!(bvh.nodes[0].is_leaf());
        assert!(bvh.bounds[0].is_empty());
    }

    #[test]
    fn identical_centers_stop_at_the_root() {
        // Equal centers collapse every key to the same value, so rule B
        // finalizes the root as one big leaf.
        let prims: Vec<Bounds3f> = (1..=8)
            .map(|i| {
                let h = i as f32 * 0.25;
                bounds3(point3(-h, -h, -h), point3(h, h, h))
            })
            .collect();
        let config = BuildConfig::default()
            .with_leaf_threshold(2)
            .with_max_allowed_leaf_size(8);
        let bvh = build(&prims, &config).unwrap();

        assert_eq!(bvh.num_nodes(), 1);
        assert_eq!(bvh.nodes[0], Node::new(0, 8));
        check_invariants(&prims, &bvh, &config);
    }

    #[test]
    fn identical_centers_form_one_leaf_at_any_size() {
        // Identical centers collapse every key, so the whole input becomes a
        // single root leaf however large it is and whatever the caps say.
        let prims: Vec<Bounds3f> = (1..=300)
            .map(|i| {
                let h = i as f32 * 0.125;
                bounds3(point3(-h, -h, -h), point3(h, h, h))
            })
            .collect();

        let config = BuildConfig::default()
            .with_leaf_threshold(300)
            .with_max_allowed_leaf_size(100_000);
        let bvh = build(&prims, &config).unwrap();
        assert_eq!(bvh.num_nodes(), 1);
        assert_eq!(bvh.nodes[0], Node::new(0, 300));
        check_invariants(&prims, &bvh, &config);

        // Rule B applies past the cap too; no split can separate the keys.
        let config = BuildConfig::default()
            .with_leaf_threshold(2)
            .with_max_allowed_leaf_size(8);
        let bvh = build(&prims, &config).unwrap();
        assert_eq!(bvh.num_nodes(), 1);
        assert_eq!(bvh.nodes[0], Node::new(0, 300));
        check_invariants(&prims, &bvh, &config);
    }

    #[test]
    fn regular_grid() {
        let mut prims = vec![];
        for z in 0..4 {
            for y in 0..4 {
                for x in 0..4 {
                    prims.push(unit_box_at(x as f32, y as f32, z as f32));
                }
            }
        }
        let config = BuildConfig::default();
        let bvh = build(&prims, &config).unwrap();

        assert_eq!(bvh.num_prims(), 64);
        assert!(bvh.num_nodes() <= 127);
        check_invariants(&prims, &bvh, &config);

        // Root bounds span the whole grid.
        assert!(approx_eq!(f32, bvh.bounds[0].p_min.x, -0.5, ulps = 2));
        assert!(approx_eq!(f32, bvh.bounds[0].p_max.x, 3.5, ulps = 2));
        assert!(approx_eq!(f32, bvh.bounds[0].p_max.z, 3.5, ulps = 2));
    }

    #[test]
    fn degenerate_axis_reduces_to_planar_ordering() {
        // Sixteen points in the plane z = 0; the z scale bottoms out at the
        // extent floor and the ordering reduces to the (y, x) interleave.
        let mut prims = vec![];
        for y in 0..4 {
            for x in 0..4 {
                prims.push(point_box(x as f32, y as f32, 0.0));
            }
        }
        let config = BuildConfig::default();
        let bvh = build(&prims, &config).unwrap();

        assert_eq!(bvh.num_prims(), 16);
        check_invariants(&prims, &bvh, &config);

        let expected: Vec<u32> = vec![0, 1, 4, 5, 2, 3, 6, 7, 8, 9, 12, 13, 10, 11, 14, 15];
        assert_eq!(bvh.prim_ids, expected);
    }

    #[test]
    fn repeated_builds_are_identical() {
        let prims: Vec<Bounds3f> = (0..300)
            .map(|i| {
                let f = i as f32;
                unit_box_at(f.sin() * 20.0, f.cos() * 15.0, (f * 0.37).sin() * 5.0)
            })
            .collect();
        let config = BuildConfig::default().with_leaf_threshold(3);

        let a = build(&prims, &config).unwrap();
        let b = build(&prims, &config).unwrap();
        assert_eq!(a.nodes, b.nodes);
        assert_eq!(a.prim_ids, b.prim_ids);
        assert_eq!(a.bounds, b.bounds);
    }

    #[test]
    fn scratch_survives_reuse() {
        let mut scratch = BuildScratch::new();
        let config = BuildConfig::default();

        let prims = vec![point_box(0.0, 0.0, 0.0), point_box(1.0, 1.0, 1.0)];
        let a = build_with(&prims, &config, &mut scratch, &RadixPairSorter).unwrap();

        let more: Vec<Bounds3f> = (0..50)
            .map(|i| unit_box_at(i as f32, (i % 3) as f32, (i % 5) as f32))
            .collect();
        let b = build_with(&more, &config, &mut scratch, &RadixPairSorter).unwrap();

        assert_eq!(a.num_prims(), 2);
        assert_eq!(b.num_prims(), 50);
        check_invariants(&more, &b, &config);
    }

    #[test]
    fn random_boxes_hold_the_invariants() {
        let mut rng = StdRng::seed_from_u64(0x00b1_57ac);
        let prims: Vec<Bounds3f> = (0..1500)
            .map(|i| {
                if i % 20 == 7 {
                    empty_box()
                } else {
                    let c = point3(
                        rng.gen_range(-10.0f32..10.0),
                        rng.gen_range(-10.0f32..10.0),
                        rng.gen_range(-10.0f32..10.0),
                    );
                    let h = rng.gen_range(0.0f32..0.5);
                    bounds3(
                        point3(c.x - h, c.y - h, c.z - h),
                        point3(c.x + h, c.y + h, c.z + h),
                    )
                }
            })
            .collect();

        for threshold in [1, 4] {
            let config = BuildConfig::default().with_leaf_threshold(threshold);
            let bvh = build(&prims, &config).unwrap();
            check_invariants(&prims, &bvh, &config);
        }
    }

    #[test]
    fn builds_in_two_dimensions() {
        let prims = vec![
            Bounds2f::from(point2(0.0, 0.0)),
            Bounds2f::from(point2(5.0, 1.0)),
            Bounds2f::from(point2(1.0, 4.0)),
        ];
        let bvh = build(&prims, &BuildConfig::default()).unwrap();

        assert_eq!(bvh.num_prims(), 3);
        let mut ids = bvh.prim_ids.clone();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(bvh.prim_ids[0], 0);
        assert!(!bvh.bounds[0].is_empty());
    }

    #[test]
    fn builds_in_four_dimensions() {
        let prims = vec![
            Bounds4f::from(point4(0.0, 0.0, 0.0, 0.0)),
            Bounds4f::from(point4(1.0, 0.5, 2.0, 3.0)),
            Bounds4f::from(point4(4.0, 4.0, 4.0, 4.0)),
            Bounds4f::from(point4(2.0, 3.0, 1.0, 0.5)),
        ];
        let bvh = build(&prims, &BuildConfig::default()).unwrap();

        assert_eq!(bvh.num_prims(), 4);
        let mut ids = bvh.prim_ids.clone();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(bvh.prim_ids[0], 0);
    }

    #[test]
    fn leaf_threshold_groups_prims() {
        let prims: Vec<Bounds3f> = (0..32)
            .map(|i| point_box(i as f32, 0.0, 0.0))
            .collect();
        let config = BuildConfig::default().with_leaf_threshold(4);
        let bvh = build(&prims, &config).unwrap();

        check_invariants(&prims, &bvh, &config);
        for (_, count) in collect_leaves(&bvh) {
            assert!(count <= 4);
        }
        assert!(bvh.num_nodes() < 63);
    }

    #[test]
    fn quantizer_orders_grid_points_along_the_curve() {
        // The curve visits the 2x2x2 grid corners in key order 0..8.
        let q = Quantizer::new(&point3(0.0, 0.0, 0.0), &point3(1.0, 1.0, 1.0));
        let mut keys = vec![];
        for z in 0..2 {
            for y in 0..2 {
                for x in 0..2 {
                    keys.push(q.encode(&point3(x as f32, y as f32, z as f32)));
                }
            }
        }
        for (a, b) in keys.iter().tuple_windows() {
            assert!(a < b);
        }
    }
}
