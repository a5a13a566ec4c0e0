//! Twiddle-factor tables for half-complex butterflies.

use std::sync::Arc;

use crate::direct::cis_frac;

/// Layout of the twiddle factors a butterfly kernel consumes per index.
///
/// Row `k - 1` of the table holds `(cos, sin)` of `exp(2 pi i j k / n)` for
/// `j = 1..radix`, so each row has `2 * (radix - 1)` reals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TwiddleDesc {
    pub radix: usize,
}

impl TwiddleDesc {
    pub const fn new(radix: usize) -> Self {
        Self { radix }
    }

    /// Number of reals per table row (the twiddle stride).
    #[inline]
    pub fn length(&self) -> usize {
        2 * (self.radix - 1)
    }

    /// Compute rows for butterfly indices `1..=rows` of a size-`n` transform.
    pub fn compute(&self, n: usize, rows: usize) -> Twiddles {
        let stride = self.length();
        let mut table = Vec::with_capacity(rows * stride);
        for k in 1..=rows {
            for j in 1..self.radix {
                let w = cis_frac(j * k, n);
                table.push(w.re);
                table.push(w.im);
            }
        }
        Twiddles {
            table: table.into(),
            stride,
        }
    }
}

/// An immutable twiddle table, shared read-only by every sweep worker.
#[derive(Debug, Clone)]
pub struct Twiddles {
    table: Arc<[f64]>,
    stride: usize,
}

impl Twiddles {
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.table
    }

    /// Number of butterfly rows in the table.
    pub fn rows(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.table.len() / self.stride
        }
    }
}
