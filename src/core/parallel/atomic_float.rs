//! AtomicFloat

use crate::core::common::Float;
use std::sync::atomic::{AtomicU32, Ordering};

/// Implement atomic floating point value using `AtomicU32`.
pub struct AtomicFloat {
    /// Bit representation of floating point value.
    bits: AtomicU32, // Use AtomicU64 when Float = f64
}

impl AtomicFloat {
    /// Create a new `AtomicFloat`.
    ///
    /// * `v` - The value.
    pub fn new(v: Float) -> Self {
        Self {
            bits: AtomicU32::new(v.to_bits()),
        }
    }

    /// Returns the current value.
    pub fn load(&self) -> Float {
        Float::from_bits(self.bits.load(Ordering::SeqCst))
    }

    /// Replace the current value.
    ///
    /// * `v` - The value to store.
    pub fn store(&self, v: Float) {
        self.bits.store(v.to_bits(), Ordering::SeqCst);
    }

    /// Lower the stored value to `v` if `v` is smaller.
    ///
    /// * `v` - The candidate minimum.
    pub fn fetch_min(&self, v: Float) {
        let mut old_bits = self.bits.load(Ordering::Relaxed);
        loop {
            if v >= Float::from_bits(old_bits) {
                break;
            }
            let result = self.bits.compare_exchange_weak(
                old_bits,
                v.to_bits(),
                Ordering::SeqCst,
                Ordering::Relaxed,
            );
            match result {
                Ok(_) => break,
                Err(x) => {
                    old_bits = x;
                }
            }
        }
    }

    /// Raise the stored value to `v` if `v` is larger.
    ///
    /// * `v` - The candidate maximum.
    pub fn fetch_max(&self, v: Float) {
        let mut old_bits = self.bits.load(Ordering::Relaxed);
        loop {
            if v <= Float::from_bits(old_bits) {
                break;
            }
            let result = self.bits.compare_exchange_weak(
                old_bits,
                v.to_bits(),
                Ordering::SeqCst,
                Ordering::Relaxed,
            );
            match result {
                Ok(_) => break,
                Err(x) => {
                    old_bits = x;
                }
            }
        }
    }
}

impl Default for AtomicFloat {
    /// Returns the "default value" for `AtomicFloat`.
    fn default() -> Self {
        Self {
            bits: AtomicU32::new(0),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
