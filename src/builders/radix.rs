//! Sorting of (key, primitive-index) pairs.

use crate::builders::grow_cleared;

/// The pair-sort seam of the builder: rearrange `keys` into non-decreasing
/// order and carry `ids` along so the pairing survives. No stability beyond
/// keeping the two arrays paired is required of implementations.
pub trait PairSorter {
    /// Sort the pairs by ascending key.
    ///
    /// * `keys`    - The keys; sorted in place.
    /// * `ids`     - The values carried along; same length as `keys`.
    /// * `scratch` - Caller-provided temporary buffers.
    fn sort_pairs(
        &self,
        keys: &mut Vec<u64>,
        ids: &mut Vec<u32>,
        scratch: &mut SortScratch,
    ) -> Result<(), String>;
}

/// Double buffers used by [`RadixPairSorter`]; reusable across sorts.
#[derive(Default)]
pub struct SortScratch {
    keys: Vec<u64>,
    ids: Vec<u32>,
}

const BITS_PER_PASS: u32 = 8;
const N_PASSES: u32 = 64 / BITS_PER_PASS;
const N_BUCKETS: usize = 1 << BITS_PER_PASS;
const BIT_MASK: u64 = (N_BUCKETS - 1) as u64;

/// Least-significant-digit radix sort over the full 64-bit keys, 8 bits per
/// pass. The input and scratch buffers swap roles each pass; the pass count
/// is even, so the result lands back in the input buffers.
#[derive(Default)]
pub struct RadixPairSorter;

impl PairSorter for RadixPairSorter {
    fn sort_pairs(
        &self,
        keys: &mut Vec<u64>,
        ids: &mut Vec<u32>,
        scratch: &mut SortScratch,
    ) -> Result<(), String> {
        debug_assert_eq!(keys.len(), ids.len());
        grow_cleared(&mut scratch.keys, keys.len(), || 0)?;
        grow_cleared(&mut scratch.ids, ids.len(), || 0)?;

        for pass in 0..N_PASSES {
            let low_bit = pass * BITS_PER_PASS;
            let (k_in, i_in, k_out, i_out): (&[u64], &[u32], &mut [u64], &mut [u32]) =
                if pass & 1 == 0 {
                    (&keys[..], &ids[..], &mut scratch.keys[..], &mut scratch.ids[..])
                } else {
                    (&scratch.keys[..], &scratch.ids[..], &mut keys[..], &mut ids[..])
                };

            // Count occupancy per bucket for this digit.
            let mut bucket_count = [0usize; N_BUCKETS];
            for key in k_in.iter() {
                bucket_count[((key >> low_bit) & BIT_MASK) as usize] += 1;
            }

            // Compute starting index in the output for each bucket.
            let mut out_index = [0usize; N_BUCKETS];
            for i in 1..N_BUCKETS {
                out_index[i] = out_index[i - 1] + bucket_count[i - 1];
            }

            // Scatter pairs to their buckets.
            for (key, id) in k_in.iter().zip(i_in.iter()) {
                let bucket = ((key >> low_bit) & BIT_MASK) as usize;
                k_out[out_index[bucket]] = *key;
                i_out[out_index[bucket]] = *id;
                out_index[bucket] += 1;
            }
        }

        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
