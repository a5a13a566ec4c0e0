//! Decimation in frequency with the butterfly sweep divided among threads.

use std::sync::Arc;

use rdft_kernel::{
    hb_generic, spawn_loop, ButterflyCursor, Hc2hcDesc, Hc2hcKernel, Ops, SendPtr,
};

use super::{dif_children, DifGeometry, TwiddleSlot};
use crate::plan::{Plan, PlanRef, PlanToken, Printer};
use crate::planner::Planner;
use crate::problem::Problem;
use crate::solver::{Score, Solver};
use crate::{PlanError, Result};

/// Threaded DIF solver for one radix / kernel pairing.
#[derive(Debug, Clone, Copy)]
pub struct Hc2hcDifThr {
    desc: Hc2hcDesc,
    kernel: Hc2hcKernel,
}

impl Hc2hcDifThr {
    pub fn new(desc: Hc2hcDesc, kernel: Hc2hcKernel) -> Self {
        Self { desc, kernel }
    }

    /// The generic butterfly at `radix`.
    pub fn generic(radix: usize) -> Self {
        Self::new(Hc2hcDesc::generic(radix), hb_generic)
    }

    pub fn desc(&self) -> &Hc2hcDesc {
        &self.desc
    }

    fn geometry(&self, p: &Problem, plnr: &Planner) -> Option<DifGeometry> {
        if plnr.threads() <= 1 {
            return None;
        }
        let g = DifGeometry::of(p, self.desc.radix)?;
        let ok = p.vecsz().rank() == 0
            && (p.is_inplace() || plnr.destroy_input())
            && (self.desc.genus.okp)(&g.genus_query());
        ok.then_some(g)
    }
}

impl Solver for Hc2hcDifThr {
    fn name(&self) -> String {
        format!("rdft-dif-thr-{}", self.desc.radix)
    }

    fn applicable(&self, p: &Problem, plnr: &Planner) -> bool {
        self.geometry(p, plnr).is_some()
    }

    fn score(&self, p: &Problem, plnr: &Planner) -> Score {
        let Some(g) = self.geometry(p, plnr) else {
            return Score::Reject;
        };
        // too small for the sweep to pay for its threads
        if g.n <= 16 || g.m <= 4 {
            return Score::Reject;
        }
        Score::Favorable
    }

    fn make_plan(&self, p: &Problem, plnr: &Planner) -> Result<PlanRef> {
        let g = self.geometry(p, plnr).ok_or_else(|| PlanError::NotApplicable {
            solver: self.name(),
            problem: p.to_string(),
        })?;
        let children = dif_children(&g, p)?;

        let child = |stage: &'static str, source: PlanError| PlanError::ChildPlanFailed {
            solver: self.name(),
            stage,
            source: Box::new(source),
        };
        let cld0 = plnr.make_plan(&children.pre).map_err(|e| child("pre", e))?;
        let cldm = children
            .mid
            .as_ref()
            .map(|q| plnr.make_plan(q))
            .transpose()
            .map_err(|e| child("mid", e))?;
        let cld = plnr.make_plan(&children.combine).map_err(|e| child("combine", e))?;

        let vl = self.desc.genus.vl;
        let mloop = g.sweep_len(self.desc.genus);
        let ends = cld0.ops() + cldm.as_ref().map_or(Ops::ZERO, |c| c.ops());
        let ops = cld.ops() + ends + self.desc.ops * mloop as u64;

        Ok(Arc::new(DifThrPlan {
            g,
            nthr: plnr.threads(),
            mloop,
            vl,
            kernel: self.kernel,
            twiddles: TwiddleSlot::new(self.desc.twiddle, g.n, mloop * vl),
            cld0,
            cldm,
            cld,
            ops,
            _token: plnr.token(),
        }))
    }
}

#[derive(Debug)]
struct DifThrPlan {
    g: DifGeometry,
    nthr: usize,
    /// Kernel steps in the sweep.
    mloop: usize,
    /// Butterflies per kernel step.
    vl: usize,
    kernel: Hc2hcKernel,
    twiddles: TwiddleSlot,
    cld0: PlanRef,
    cldm: Option<PlanRef>,
    cld: PlanRef,
    ops: Ops,
    _token: PlanToken,
}

impl DifThrPlan {
    /// Butterflies `1..m/2` of the buffer at `buf`, split among `nthr` workers.
    unsafe fn sweep(&self, buf: *mut f64) {
        let tw = self.twiddles.get();
        let buf = SendPtr(buf);
        let cursor = ButterflyCursor::new(self.g.radix, self.g.m, self.g.is);
        let (kernel, radix, vl) = (self.kernel, self.g.radix, self.vl);

        spawn_loop(self.mloop, self.nthr, move |r| {
            // SAFETY: butterfly k touches only offsets k + m t and
            // m - k + m t, which are disjoint across the slices.
            unsafe {
                kernel(
                    buf.as_ptr(),
                    cursor.at(r.min * vl),
                    tw.as_slice(),
                    radix,
                    r.len() * vl,
                )
            }
        });
    }
}

impl Plan for DifThrPlan {
    unsafe fn apply(&self, input: *mut f64, output: *mut f64) {
        self.cld0.apply(input, input);
        if let Some(cldm) = &self.cldm {
            let mid = input.offset(self.g.is * (self.g.m / 2) as isize);
            cldm.apply(mid, mid);
        }
        self.sweep(input);
        self.cld.apply(input, output);
    }

    fn awake(&self, flag: bool) {
        self.twiddles.awake(flag);
        self.cld0.awake(flag);
        if let Some(cldm) = &self.cldm {
            cldm.awake(flag);
        }
        self.cld.awake(flag);
    }

    fn ops(&self) -> Ops {
        self.ops
    }

    fn print(&self, p: &mut Printer) {
        p.open(
            format_args!("rdft-dif-thr-{}/{}", self.g.radix, self.nthr),
            self.ops,
        );
        p.child(self.cld0.as_ref());
        if let Some(cldm) = &self.cldm {
            p.child(cldm.as_ref());
        }
        p.child(self.cld.as_ref());
        p.close();
    }
}
