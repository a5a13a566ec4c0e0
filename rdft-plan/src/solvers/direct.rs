//! Leaf solver: O(n^2) transform of every vector entry.
//!
//! The whole input (all vector entries) is gathered into scratch before
//! anything is written, so the plan is correct for any aliasing between
//! input and output.

use rdft_kernel::direct::{ops_estimate, transform_1d};
use rdft_kernel::Ops;
use rdft_tensor::RdftKind;
use std::sync::Arc;

use crate::plan::{Plan, PlanRef, PlanToken, Printer};
use crate::planner::Planner;
use crate::problem::Problem;
use crate::solver::Solver;
use crate::{PlanError, Result};

/// Handles any rank-1 problem of any kind and vector geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSolver;

impl Solver for DirectSolver {
    fn name(&self) -> String {
        "rdft-direct".to_string()
    }

    fn applicable(&self, p: &Problem, _plnr: &Planner) -> bool {
        p.sz().rank() == 1
    }

    fn make_plan(&self, p: &Problem, plnr: &Planner) -> Result<PlanRef> {
        if !self.applicable(p, plnr) {
            return Err(PlanError::NotApplicable {
                solver: self.name(),
                problem: p.to_string(),
            });
        }
        let d = p.sz().dims()[0];
        let offsets = p.vecsz().offsets();
        let ops = ops_estimate(d.n) * offsets.len() as u64;
        Ok(Arc::new(DirectPlan {
            kind: p.kind()[0],
            n: d.n,
            is: d.is,
            os: d.os,
            offsets,
            ops,
            _token: plnr.token(),
        }))
    }
}

#[derive(Debug)]
struct DirectPlan {
    kind: RdftKind,
    n: usize,
    is: isize,
    os: isize,
    /// `(input, output)` start of each vector entry.
    offsets: Vec<(isize, isize)>,
    ops: Ops,
    _token: PlanToken,
}

impl Plan for DirectPlan {
    unsafe fn apply(&self, input: *mut f64, output: *mut f64) {
        let n = self.n;
        let mut src = Vec::with_capacity(n * self.offsets.len());
        for &(ioff, _) in &self.offsets {
            for j in 0..n {
                src.push(*input.offset(ioff + j as isize * self.is));
            }
        }

        let mut dst = vec![0.0; src.len()];
        for (x, y) in src.chunks_exact(n).zip(dst.chunks_exact_mut(n)) {
            transform_1d(self.kind, x, y);
        }

        for (&(_, ooff), y) in self.offsets.iter().zip(dst.chunks_exact(n)) {
            for (j, &v) in y.iter().enumerate() {
                *output.offset(ooff + j as isize * self.os) = v;
            }
        }
    }

    fn ops(&self) -> Ops {
        self.ops
    }

    fn print(&self, p: &mut Printer) {
        if self.offsets.len() > 1 {
            p.open(
                format_args!("rdft-direct-{}-{}-x{}", self.kind, self.n, self.offsets.len()),
                self.ops,
            );
        } else {
            p.open(format_args!("rdft-direct-{}-{}", self.kind, self.n), self.ops);
        }
        p.close();
    }
}
