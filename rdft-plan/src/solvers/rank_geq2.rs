//! Multi-dimensional transforms as two lower-rank stages.
//!
//! A rank >= 2 problem is split after `s` dimensions. The first stage
//! transforms the trailing dimensions for every point of the leading ones,
//! reading the input and writing the output. The second stage transforms
//! the leading dimensions in place in the output buffer.

use std::sync::Arc;

use rdft_kernel::Ops;
use rdft_tensor::{pickdim, real_sz, InplaceKind, Tensor};

use crate::plan::{Plan, PlanRef, PlanToken, Printer};
use crate::planner::Planner;
use crate::problem::Problem;
use crate::solver::{Score, Solver};
use crate::{PlanError, Result};

/// Split preference of one solver instance plus the buddies it competes with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankGeq2Config {
    /// Preferred split dimension, resolved through [`pickdim`].
    pub spltrnk: isize,
    /// Every preference registered alongside this one, in priority order.
    pub buddies: Arc<[isize]>,
}

#[derive(Debug, Clone)]
pub struct RankGeq2 {
    config: RankGeq2Config,
}

impl RankGeq2 {
    pub fn new(spltrnk: isize, buddies: Arc<[isize]>) -> Self {
        Self {
            config: RankGeq2Config { spltrnk, buddies },
        }
    }

    /// One solver per entry of `buddies`.
    pub fn family(buddies: &Arc<[isize]>) -> Vec<RankGeq2> {
        buddies
            .iter()
            .map(|&b| RankGeq2::new(b, Arc::clone(buddies)))
            .collect()
    }

    pub fn config(&self) -> &RankGeq2Config {
        &self.config
    }

    /// Number of leading dimensions kept by the second stage, if `sz` can
    /// be split at this solver's preference.
    ///
    /// The result always satisfies `1 <= s < sz.rank()`.
    pub fn split_rank(&self, sz: &Tensor) -> Option<usize> {
        if sz.rank() <= 1 {
            return None;
        }
        let d = pickdim(self.config.spltrnk, &self.config.buddies, sz, true)?;
        let s = d + 1;
        (s < sz.rank()).then_some(s)
    }

    /// Split rank to use for `p`, or `None` when the solver does not apply.
    pub fn applicable_rank(&self, p: &Problem) -> Option<usize> {
        let s = self.split_rank(p.sz())?;
        // Uniform strides suffice for in-place operation: both stages then
        // read and write every element through the same offset.
        (!p.is_inplace() || p.sz().inplace_strides()).then_some(s)
    }
}

impl Solver for RankGeq2 {
    fn name(&self) -> String {
        format!("rdft-rank>=2/{}", self.config.spltrnk)
    }

    fn applicable(&self, p: &Problem, _plnr: &Planner) -> bool {
        self.applicable_rank(p).is_some()
    }

    fn score(&self, p: &Problem, plnr: &Planner) -> Score {
        if !self.applicable(p, plnr) {
            return Score::Reject;
        }
        if plnr.no_rank_splits() && self.config.buddies.first() != Some(&self.config.spltrnk) {
            return Score::Reject;
        }
        // Prefer looping over the vector first when it is the outer loop.
        if p.vecsz().rank() > 0 && p.vecsz().min_stride() > p.sz().max_index() {
            return Score::LowQuality;
        }
        Score::Favorable
    }

    fn make_plan(&self, p: &Problem, plnr: &Planner) -> Result<PlanRef> {
        let s = self.applicable_rank(p).ok_or_else(|| PlanError::NotApplicable {
            solver: self.name(),
            problem: p.to_string(),
        })?;

        let (sz1, sz2) = p.sz().split(s);
        let vecszi = p.vecsz().copy_inplace(InplaceKind::Os);
        let sz2i = sz2.copy_inplace(InplaceKind::Os);
        let rsz1 = real_sz(&p.kind()[..s], &sz1);
        let rsz2i = real_sz(&p.kind()[s..], &sz2i);

        let child = |stage: &'static str, source: PlanError| PlanError::ChildPlanFailed {
            solver: self.name(),
            stage,
            source: Box::new(source),
        };

        let p1 = Problem::new(
            sz2,
            p.vecsz().append(&rsz1),
            p.input(),
            p.output(),
            &p.kind()[s..],
        )?;
        let cld1 = plnr.make_plan(&p1).map_err(|e| child("1", e))?;

        let p2 = Problem::new(
            sz1.copy_inplace(InplaceKind::Os),
            vecszi.append(&rsz2i),
            p.output(),
            p.output(),
            &p.kind()[..s],
        )?;
        // on failure cld1 is dropped here along with the geometries
        let cld2 = plnr.make_plan(&p2).map_err(|e| child("2", e))?;

        let ops = cld1.ops() + cld2.ops();
        Ok(Arc::new(RankGeq2Plan {
            spltrnk: self.config.spltrnk,
            cld2,
            cld1,
            ops,
            _token: plnr.token(),
        }))
    }
}

#[derive(Debug)]
struct RankGeq2Plan {
    spltrnk: isize,
    // fields drop in declaration order: second stage first
    cld2: PlanRef,
    cld1: PlanRef,
    ops: Ops,
    _token: PlanToken,
}

impl Plan for RankGeq2Plan {
    unsafe fn apply(&self, input: *mut f64, output: *mut f64) {
        self.cld1.apply(input, output);
        self.cld2.apply(output, output);
    }

    fn awake(&self, flag: bool) {
        self.cld1.awake(flag);
        self.cld2.awake(flag);
    }

    fn ops(&self) -> Ops {
        self.ops
    }

    fn print(&self, p: &mut Printer) {
        p.open(format_args!("rdft-rank>=2/{}", self.spltrnk), self.ops);
        p.child(self.cld1.as_ref());
        p.child(self.cld2.as_ref());
        p.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{PlannerConfig, DEFAULT_BUDDIES};
    use crate::problem::BufferRef;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use rdft_tensor::{IoDim, RdftKind};

    type Log = Arc<Mutex<Vec<(&'static str, u8)>>>;

    /// Leaf that records awake and drop events.
    #[derive(Debug)]
    struct Recorder {
        id: u8,
        log: Log,
    }

    impl Plan for Recorder {
        unsafe fn apply(&self, _input: *mut f64, _output: *mut f64) {}

        fn awake(&self, flag: bool) {
            self.log.lock().push((if flag { "awake" } else { "sleep" }, self.id));
        }

        fn ops(&self) -> Ops {
            Ops::ZERO
        }

        fn print(&self, p: &mut Printer) {
            p.open(format_args!("rec-{}", self.id), Ops::ZERO);
            p.close();
        }
    }

    impl Drop for Recorder {
        fn drop(&mut self) {
            self.log.lock().push(("drop", self.id));
        }
    }

    fn buddies() -> Arc<[isize]> {
        Arc::from(&DEFAULT_BUDDIES[..])
    }

    fn problem(sz: Tensor, vecsz: Tensor, inplace: bool) -> Problem {
        let kinds = vec![RdftKind::R2hc; sz.rank()];
        let out = if inplace {
            BufferRef::new(0, 0)
        } else {
            BufferRef::new(1, 0)
        };
        Problem::new(sz, vecsz, BufferRef::new(0, 0), out, kinds).unwrap()
    }

    #[test]
    fn test_split_rank_8x8() {
        let sz = Tensor::row_major(&[8, 8]).unwrap();
        let solvers = RankGeq2::family(&buddies());
        let ranks: Vec<Option<usize>> = solvers.iter().map(|s| s.split_rank(&sz)).collect();
        assert_eq!(ranks, vec![Some(1), None, None]);
    }

    #[test]
    fn test_rank_one_rejected() {
        let plnr = Planner::new(PlannerConfig::default());
        let p = problem(Tensor::dim1(16, 1, 1), Tensor::rank0(), false);
        for s in RankGeq2::family(&buddies()) {
            assert_eq!(s.score(&p, &plnr), Score::Reject);
        }
    }

    #[test]
    fn test_in_place_requires_uniform_strides() {
        let plnr = Planner::new(PlannerConfig::default());
        let s = RankGeq2::new(0, buddies());
        let uniform = problem(Tensor::row_major(&[4, 4]).unwrap(), Tensor::rank0(), true);
        assert!(s.applicable(&uniform, &plnr));

        let transposed =
            Tensor::new([IoDim::new(4, 4, 1), IoDim::new(4, 1, 4)]).unwrap();
        assert!(!s.applicable(&problem(transposed.clone(), Tensor::rank0(), true), &plnr));
        assert!(s.applicable(&problem(transposed, Tensor::rank0(), false), &plnr));
    }

    #[test]
    fn test_no_rank_splits_keeps_first_buddy_only() {
        let plnr = Planner::new(PlannerConfig::default().with_no_rank_splits(true));
        let p = problem(Tensor::row_major(&[2, 3, 4, 5]).unwrap(), Tensor::rank0(), false);
        let scores: Vec<Score> = RankGeq2::family(&buddies())
            .iter()
            .map(|s| s.score(&p, &plnr))
            .collect();
        assert_eq!(scores, vec![Score::Favorable, Score::Reject, Score::Reject]);

        let relaxed = Planner::new(PlannerConfig::default());
        assert!(RankGeq2::family(&buddies())
            .iter()
            .all(|s| s.score(&p, &relaxed) == Score::Favorable));
    }

    #[test]
    fn test_outer_vector_loop_is_low_quality() {
        let plnr = Planner::new(PlannerConfig::default());
        let s = RankGeq2::new(0, buddies());
        // transform spans indices 0..=15, vector stride 16
        let p = problem(
            Tensor::row_major(&[4, 4]).unwrap(),
            Tensor::dim1(3, 16, 16),
            false,
        );
        assert_eq!(s.score(&p, &plnr), Score::LowQuality);

        let inner = problem(
            Tensor::new([IoDim::new(4, 12, 12), IoDim::new(4, 3, 3)]).unwrap(),
            Tensor::dim1(3, 1, 1),
            false,
        );
        assert_eq!(s.score(&inner, &plnr), Score::Favorable);
    }

    #[test]
    fn test_children_awake_in_order_and_drop_in_reverse() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let plnr = Planner::new(PlannerConfig::default());
        let plan = RankGeq2Plan {
            spltrnk: 0,
            cld2: Arc::new(Recorder {
                id: 2,
                log: Arc::clone(&log),
            }),
            cld1: Arc::new(Recorder {
                id: 1,
                log: Arc::clone(&log),
            }),
            ops: Ops::ZERO,
            _token: plnr.token(),
        };

        plan.awake(true);
        plan.awake(false);
        assert_eq!(
            std::mem::take(&mut *log.lock()),
            vec![("awake", 1), ("awake", 2), ("sleep", 1), ("sleep", 2)]
        );

        drop(plan);
        assert_eq!(*log.lock(), vec![("drop", 2), ("drop", 1)]);
        assert_eq!(plnr.live_plans(), 0);
    }

    proptest! {
        #[test]
        fn prop_split_rank_strictly_reduces(
            ns in proptest::collection::vec(1usize..6, 2..6),
            which in -5isize..5,
        ) {
            let sz = Tensor::row_major(&ns).unwrap();
            let s = RankGeq2::new(which, Arc::from(vec![which]));
            if let Some(r) = s.split_rank(&sz) {
                prop_assert!(r >= 1 && r < sz.rank());
            }
        }
    }
}
