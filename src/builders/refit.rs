//! Bottom-up refit of per-node bounds.

use super::BuildBounds;
use crate::bvh::BinaryBvh;

/// Fill `bvh.bounds` from the primitive boxes: leaves take the union of
/// their primitives, internal nodes the union of their two children.
/// Children always follow their parents in the node array, so a single
/// reverse sweep sees every child before its parent. The empty root of a
/// build with no valid primitives unions nothing and stays the empty box.
///
/// * `bvh`   - The hierarchy whose topology is final; its `bounds` array is
///             overwritten.
/// * `prims` - The input boxes the hierarchy was built over.
pub fn refit<B: BuildBounds>(bvh: &mut BinaryBvh<B>, prims: &[B]) {
    debug_assert_eq!(bvh.nodes.len(), bvh.bounds.len());

    for node_id in (0..bvh.nodes.len()).rev() {
        let node = bvh.nodes[node_id];
        let bounds = if node.is_leaf() {
            let offset = node.offset() as usize;
            let mut leaf_bounds = B::empty();
            for &prim_id in &bvh.prim_ids[offset..offset + node.count() as usize] {
                leaf_bounds = leaf_bounds.merge(&prims[prim_id as usize]);
            }
            leaf_bounds
        } else {
            let child = node.offset() as usize;
            bvh.bounds[child].merge(&bvh.bounds[child + 1])
        };
        bvh.bounds[node_id] = bounds;
    }
}
