//! Operation-count cost algebra.
//!
//! Plans carry an [`Ops`] estimate. Sequential composition adds counts and
//! repetition over a vector loop scales them. Counts are integers so that
//! totals do not depend on the order in which a plan tree is assembled.

use std::ops::{Add, AddAssign, Mul};

/// Estimated operation counts of a plan or kernel call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Ops {
    pub flops: u64,
    pub loads: u64,
    pub stores: u64,
    pub other: u64,
}

impl Ops {
    pub const ZERO: Ops = Ops {
        flops: 0,
        loads: 0,
        stores: 0,
        other: 0,
    };

    pub const fn new(flops: u64, loads: u64, stores: u64, other: u64) -> Self {
        Self {
            flops,
            loads,
            stores,
            other,
        }
    }

    /// Cost of running `self` and then `other`.
    #[must_use]
    pub fn combine_sequential(self, other: Ops) -> Ops {
        Ops {
            flops: self.flops + other.flops,
            loads: self.loads + other.loads,
            stores: self.stores + other.stores,
            other: self.other + other.other,
        }
    }

    /// Cost of running `self` `times` times.
    #[must_use]
    pub fn scale_by_repetition(self, times: u64) -> Ops {
        Ops {
            flops: self.flops * times,
            loads: self.loads * times,
            stores: self.stores * times,
            other: self.other * times,
        }
    }

    /// Scalar used to rank candidate plans (lower is better).
    pub fn cost(&self) -> u64 {
        self.flops + self.loads + self.stores + self.other
    }
}

impl Add for Ops {
    type Output = Ops;

    fn add(self, rhs: Ops) -> Ops {
        self.combine_sequential(rhs)
    }
}

impl AddAssign for Ops {
    fn add_assign(&mut self, rhs: Ops) {
        *self = self.combine_sequential(rhs);
    }
}

impl Mul<u64> for Ops {
    type Output = Ops;

    fn mul(self, rhs: u64) -> Ops {
        self.scale_by_repetition(rhs)
    }
}

impl std::iter::Sum for Ops {
    fn sum<I: Iterator<Item = Ops>>(iter: I) -> Ops {
        iter.fold(Ops::ZERO, Add::add)
    }
}
