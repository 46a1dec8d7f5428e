//! Production of the unsorted (key, primitive-index) pairs, compacting out
//! primitives with empty boxes.

use super::codes::Quantizer;
use crate::builders::{BuildBounds, BLOCK_SIZE};
use rayon::prelude::*;
use std::sync::atomic::{AtomicI64, Ordering};

/// Writes one Morton key and primitive id per input slot. A slot inside the
/// compacted range whose own primitive is empty claims a replacement from the
/// back instead: it post-decrements the shared tail cursor and retries until
/// it lands on a non-empty primitive. Slots past the compacted range are left
/// alone. After the pass the first `num_valid` entries of both outputs are
/// dense; the compaction is valid but not order-preserving.
///
/// * `quantizer` - Maps centers to Morton keys.
/// * `prims`     - The input boxes.
/// * `num_valid` - Number of non-empty primitives, as counted by the fill
///                 pass.
/// * `keys`      - Output keys, one slot per input primitive.
/// * `prim_ids`  - Output primitive indices paired with `keys`.
pub(crate) fn compute_unsorted_pairs<B: BuildBounds>(
    quantizer: &Quantizer<B::Point>,
    prims: &[B],
    num_valid: usize,
    keys: &mut [u64],
    prim_ids: &mut [u32],
) {
    debug_assert_eq!(keys.len(), prims.len());
    debug_assert_eq!(prim_ids.len(), prims.len());

    let tail = AtomicI64::new(prims.len() as i64);

    keys.par_chunks_mut(BLOCK_SIZE)
        .zip(prim_ids.par_chunks_mut(BLOCK_SIZE))
        .enumerate()
        .for_each(|(chunk, (key_chunk, id_chunk))| {
            let base = chunk * BLOCK_SIZE;
            for i in 0..key_chunk.len() {
                let tid = (base + i) as i64;

                let mut prim_id = tid;
                let mut prim = prims[prim_id as usize];
                if prim.is_empty() && tid >= num_valid as i64 {
                    // The slot gets truncated anyway; stealing from here
                    // would starve a slot that survives.
                    continue;
                }

                let mut claimed = true;
                while prim.is_empty() {
                    // Post-decrement, then re-check; the termination test
                    // must see the value after every decrement.
                    prim_id = tail.fetch_sub(1, Ordering::SeqCst) - 1;
                    if tid >= prim_id {
                        claimed = false;
                        break;
                    }
                    prim = prims[prim_id as usize];
                }
                if !claimed {
                    continue;
                }

                id_chunk[i] = prim_id as u32;
                key_chunk[i] = quantizer.encode(&prim.center());
            }
        });
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
