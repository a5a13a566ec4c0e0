//! Scaffolding shared by half-complex Cooley-Tukey solvers.
//!
//! A backward transform of size `n = radix * m` is computed by decimation in
//! frequency. With the half-complex input viewed as `radix` rows of length
//! `m` (row stride `m * is`):
//!
//! 1. butterfly index 0 is a size-`radix` backward transform down the
//!    column at offset 0;
//! 2. for even `m`, index `m/2` is a half-sample-shifted transform down the
//!    column at offset `(m/2) * is`;
//! 3. indices `0 < k < m/2` are twiddled radix butterflies;
//! 4. each row now holds a half-complex sequence of length `m`, and a
//!    vector of `radix` backward transforms of size `m` writes output
//!    element `j + radix * q` from row `j`.
//!
//! Steps 1-3 work in place on the input buffer.

pub mod thr;

use parking_lot::Mutex;
use rdft_kernel::{Genus, GenusQuery, TwiddleDesc, Twiddles};
use rdft_tensor::{RdftKind, Tensor};

use crate::problem::Problem;
use crate::Result;

/// Factorization of a rank-1 backward problem as `radix * m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifGeometry {
    pub n: usize,
    pub radix: usize,
    pub m: usize,
    pub is: isize,
    pub os: isize,
}

impl DifGeometry {
    /// `Some` when `p` is a rank-1 `Hc2r` problem whose size `radix` splits
    /// into at least two butterfly rows.
    pub fn of(p: &Problem, radix: usize) -> Option<Self> {
        if p.sz().rank() != 1 || p.kind()[0] != RdftKind::Hc2r || radix < 2 {
            return None;
        }
        let d = p.sz().dims()[0];
        if d.n % radix != 0 || d.n / radix < 2 {
            return None;
        }
        Some(Self {
            n: d.n,
            radix,
            m: d.n / radix,
            is: d.is,
            os: d.os,
        })
    }

    /// Offsets the butterfly kernel would be started with.
    pub fn genus_query(&self) -> GenusQuery {
        GenusQuery {
            radix: self.radix,
            ri: self.is,
            ii: (self.radix * self.m - 1) as isize * self.is,
            ios: self.m as isize * self.is,
            vs: 0,
            m: self.m,
            is: self.is,
        }
    }

    /// Butterfly indices strictly between 0 and `m/2`.
    #[inline]
    pub fn butterflies(&self) -> usize {
        (self.m - 1) / 2
    }

    /// Kernel steps needed to cover [`butterflies`](Self::butterflies).
    #[inline]
    pub fn sweep_len(&self, genus: &Genus) -> usize {
        self.butterflies() / genus.vl
    }
}

/// Child problems of a DIF decomposition.
#[derive(Debug, Clone)]
pub struct DifChildren {
    /// Butterfly index 0, in place on the input.
    pub pre: Problem,
    /// Butterfly index `m/2`, in place on the input; only for even `m`.
    pub mid: Option<Problem>,
    /// `radix` transforms of size `m`, input to output.
    pub combine: Problem,
}

pub fn dif_children(g: &DifGeometry, p: &Problem) -> Result<DifChildren> {
    let row = g.m as isize * g.is;
    let input = p.input();

    let pre = Problem::new(
        Tensor::dim1(g.radix, row, row),
        Tensor::rank0(),
        input,
        input,
        vec![RdftKind::Hc2r],
    )?;

    let mid = if g.m % 2 == 0 {
        let at = input.offset_by(g.is * (g.m / 2) as isize);
        Some(Problem::new(
            Tensor::dim1(g.radix, row, row),
            Tensor::rank0(),
            at,
            at,
            vec![RdftKind::Hc2rIII],
        )?)
    } else {
        None
    };

    let combine = Problem::new(
        Tensor::dim1(g.m, g.is, g.radix as isize * g.os),
        Tensor::dim1(g.radix, row, g.os),
        input,
        p.output(),
        vec![RdftKind::Hc2r],
    )?;

    Ok(DifChildren { pre, mid, combine })
}

#[derive(Debug, Default)]
struct TwiddleState {
    refs: usize,
    table: Option<Twiddles>,
}

/// Twiddle table armed and released by nested `awake` calls.
#[derive(Debug)]
pub(crate) struct TwiddleSlot {
    desc: TwiddleDesc,
    n: usize,
    rows: usize,
    state: Mutex<TwiddleState>,
}

impl TwiddleSlot {
    pub(crate) fn new(desc: TwiddleDesc, n: usize, rows: usize) -> Self {
        Self {
            desc,
            n,
            rows,
            state: Mutex::new(TwiddleState::default()),
        }
    }

    pub(crate) fn awake(&self, flag: bool) {
        let mut st = self.state.lock();
        if flag {
            st.refs += 1;
            if st.table.is_none() {
                st.table = Some(self.desc.compute(self.n, self.rows));
            }
        } else {
            st.refs = st.refs.saturating_sub(1);
            if st.refs == 0 {
                st.table = None;
            }
        }
    }

    /// The armed table, or a freshly computed one for a dormant plan.
    pub(crate) fn get(&self) -> Twiddles {
        if let Some(table) = &self.state.lock().table {
            return table.clone();
        }
        tracing::debug!(n = self.n, "twiddles not armed; computing for this call");
        self.desc.compute(self.n, self.rows)
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.state.lock().table.is_some()
    }
}
