//! Transform kinds and the storage extent each kind implies.

use std::fmt;

use crate::tensor::{IoDim, Tensor};

/// Real-data transform kind of one dimension.
///
/// Half-complex layout of length `n` is `r0, r1, .., r(n/2), i((n+1)/2-1), .., i1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RdftKind {
    /// Real input, half-complex output (forward).
    R2hc,
    /// Half-complex input, real output (unnormalized backward).
    Hc2r,
    /// Discrete Hartley transform.
    Dht,
    /// Half-complex input shifted by half a frequency bin, real output.
    ///
    /// Input `u[t]` encodes the Hermitian sequence `X_t = conj(X_(r-1-t))`;
    /// output is `y_j = sum_t X_t exp(i pi j (2t + 1) / r)`.
    Hc2rIII,
}

impl RdftKind {
    /// Short lowercase name used in plan descriptions.
    pub fn name(self) -> &'static str {
        match self {
            RdftKind::R2hc => "r2hc",
            RdftKind::Hc2r => "hc2r",
            RdftKind::Dht => "dht",
            RdftKind::Hc2rIII => "hc2r3",
        }
    }
}

impl fmt::Display for RdftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Number of real elements stored for a logical transform of extent `n`.
#[inline]
pub fn real_n(kind: RdftKind, n: usize) -> usize {
    match kind {
        RdftKind::R2hc | RdftKind::Hc2r | RdftKind::Dht | RdftKind::Hc2rIII => n,
    }
}

/// Geometry of the real storage occupied by `sz`, dimension by dimension.
///
/// Used to turn the transform dimensions of one stage into vector (loop)
/// dimensions of another.
pub fn real_sz(kinds: &[RdftKind], sz: &Tensor) -> Tensor {
    assert_eq!(
        kinds.len(),
        sz.rank(),
        "one transform kind is required per dimension"
    );
    Tensor::from_valid(
        sz.dims()
            .iter()
            .zip(kinds.iter())
            .map(|(d, &k)| IoDim::new(real_n(k, d.n), d.is, d.os)),
    )
}
