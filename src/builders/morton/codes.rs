//! Morton codes: fixed-point quantization of points and bit interleaving of
//! the quantized cells into 64-bit keys.

use crate::core::common::{max, Float};
use crate::core::geometry::{Point2f, Point3f, Point4f};
use std::ops::{Index, IndexMut};

/// Floor applied to each axis extent of the quantization range so the scale
/// stays finite when the range collapses along an axis.
pub const MIN_AXIS_EXTENT: Float = 1e-20;

/// Point types that can be quantized and interleaved into a Morton key. The
/// per-axis bit width is chosen so `DIM * AXIS_BITS` fits a 64-bit key.
pub trait MortonCode:
    Copy + Send + Sync + Default + Index<usize, Output = Float> + IndexMut<usize>
{
    /// Number of axes.
    const DIM: usize;

    /// Bits of fixed-point resolution per axis.
    const AXIS_BITS: u32;

    /// Quantize the point with `(p - bias) * scale` per axis and interleave
    /// the resulting cells into a key.
    ///
    /// * `bias`  - Per-axis offset subtracted before scaling.
    /// * `scale` - Per-axis scale to cell units.
    fn morton_code(&self, bias: &Self, scale: &Self) -> u64;
}

/// Maps world-space points into the fixed-point lattice spanned by a bounding
/// range: `bias` is the range's lower corner and `scale` per axis is
/// `2^AXIS_BITS / max(extent, MIN_AXIS_EXTENT)`.
#[derive(Copy, Clone, Debug)]
pub struct Quantizer<P> {
    /// Per-axis offset (the range's lower corner).
    bias: P,

    /// Per-axis scale to cell units.
    scale: P,
}

impl<P: MortonCode> Quantizer<P> {
    /// Derive the quantizer coefficients from a bounding range.
    ///
    /// * `lower` - Lower corner of the range.
    /// * `upper` - Upper corner of the range.
    pub fn new(lower: &P, upper: &P) -> Self {
        let mut bias = P::default();
        let mut scale = P::default();
        for axis in 0..P::DIM {
            bias[axis] = lower[axis];
            let extent = max(upper[axis] - lower[axis], MIN_AXIS_EXTENT);
            scale[axis] = (1u64 << P::AXIS_BITS) as Float / extent;
        }
        Self { bias, scale }
    }

    /// Returns the Morton key of a point.
    ///
    /// * `p` - The point; keys are monotone in each axis for points inside
    ///         the quantization range.
    pub fn encode(&self, p: &P) -> u64 {
        p.morton_code(&self.bias, &self.scale)
    }

    /// Returns the per-axis bias.
    pub fn bias(&self) -> &P {
        &self.bias
    }

    /// Returns the per-axis scale.
    pub fn scale(&self) -> &P {
        &self.scale
    }
}

/// Clamp a scaled coordinate to a cell index in `[0, 2^bits - 1]`. The
/// float-to-int conversion saturates, which floors negative values (and NaN)
/// to cell 0; the upper clamp catches the point sitting exactly on the
/// range's upper corner, whose scaled value lands on `2^bits`.
///
/// * `v`    - The scaled coordinate.
/// * `bits` - Cell resolution in bits.
fn quantize(v: Float, bits: u32) -> u64 {
    let cell = v as u64;
    cell.min((1u64 << bits) - 1)
}

/// Move the masked bits left by `shift`, keeping the rest in place.
///
/// * `x`     - The value.
/// * `mask`  - Bits to move.
/// * `shift` - How far to move them.
fn shift_bits(x: u64, mask: u64, shift: u32) -> u64 {
    ((x & mask) << shift) | (x & !mask)
}

/// Spread a 21-bit value so bit i lands at bit 3i, in five stages that move
/// progressively smaller groups into place.
///
/// * `x` - The 21-bit value.
fn bit_interleave21(x: u64) -> u64 {
    let x = shift_bits(x, 0x0000_0000_001f_0000, 32);
    let x = shift_bits(x, 0x0000_0000_0000_ff00, 16);
    let x = shift_bits(x, 0x00f0_0000_f000_00f0, 8);
    let x = shift_bits(x, 0x000c_00c0_0c00_c00c, 4);
    shift_bits(x, 0x0082_0420_8204_2082, 2)
}

/// Spread a 32-bit value so bit i lands at bit 2i.
///
/// * `x` - The 32-bit value.
fn bit_interleave32(x: u64) -> u64 {
    let x = (x | (x << 16)) & 0x0000_ffff_0000_ffff;
    let x = (x | (x << 8)) & 0x00ff_00ff_00ff_00ff;
    let x = (x | (x << 4)) & 0x0f0f_0f0f_0f0f_0f0f;
    let x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    (x | (x << 1)) & 0x5555_5555_5555_5555
}

/// Spread a 16-bit value so bit i lands at bit 4i.
///
/// * `x` - The 16-bit value.
fn bit_interleave16(x: u64) -> u64 {
    let x = (x | (x << 24)) & 0x0000_00ff_0000_00ff;
    let x = (x | (x << 12)) & 0x000f_000f_000f_000f;
    let x = (x | (x << 6)) & 0x0303_0303_0303_0303;
    (x | (x << 3)) & 0x1111_1111_1111_1111
}

impl MortonCode for Point2f {
    const DIM: usize = 2;
    const AXIS_BITS: u32 = 32;

    /// X occupies the even bits and y the odd bits of the 64-bit key.
    fn morton_code(&self, bias: &Self, scale: &Self) -> u64 {
        let x = quantize((self.x - bias.x) * scale.x, Self::AXIS_BITS);
        let y = quantize((self.y - bias.y) * scale.y, Self::AXIS_BITS);
        (bit_interleave32(y) << 1) | bit_interleave32(x)
    }
}

impl MortonCode for Point3f {
    const DIM: usize = 3;
    const AXIS_BITS: u32 = 21;

    /// X occupies bits 0,3,6,..., y bits 1,4,7,... and z bits 2,5,8,... of
    /// the 63-bit key; the top bit of the word stays clear.
    fn morton_code(&self, bias: &Self, scale: &Self) -> u64 {
        let x = quantize((self.x - bias.x) * scale.x, Self::AXIS_BITS);
        let y = quantize((self.y - bias.y) * scale.y, Self::AXIS_BITS);
        let z = quantize((self.z - bias.z) * scale.z, Self::AXIS_BITS);
        (bit_interleave21(z) << 2) | (bit_interleave21(y) << 1) | bit_interleave21(x)
    }
}

impl MortonCode for Point4f {
    const DIM: usize = 4;
    const AXIS_BITS: u32 = 16;

    /// The four axes take every fourth bit of the key, x starting at bit 0.
    fn morton_code(&self, bias: &Self, scale: &Self) -> u64 {
        let x = quantize((self.x - bias.x) * scale.x, Self::AXIS_BITS);
        let y = quantize((self.y - bias.y) * scale.y, Self::AXIS_BITS);
        let z = quantize((self.z - bias.z) * scale.z, Self::AXIS_BITS);
        let w = quantize((self.w - bias.w) * scale.w, Self::AXIS_BITS);
        (bit_interleave16(w) << 3)
            | (bit_interleave16(z) << 2)
            | (bit_interleave16(y) << 1)
            | bit_interleave16(x)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
