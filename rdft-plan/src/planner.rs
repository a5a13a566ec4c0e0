//! Solver registry, plan memo and the knobs solvers consult.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::hc2hc::thr::Hc2hcDifThr;
use crate::plan::{describe, describe_verbose, PlanRef, PlanToken};
use crate::problem::{Problem, ProblemKey};
use crate::solver::{Score, Solver};
use crate::solvers::direct::DirectSolver;
use crate::solvers::rank_geq2::RankGeq2;
use crate::{PlanError, Result};

/// Split preferences tried by the rank-splitting solvers: the middle
/// dimension, the first dimension, and the second-to-last dimension.
pub const DEFAULT_BUDDIES: [isize; 3] = [0, 1, -2];

/// Radices the threaded DIF solver is registered with by default.
pub const DEFAULT_RADICES: [usize; 5] = [2, 3, 4, 5, 8];

#[inline]
fn trace_enabled() -> bool {
    matches!(std::env::var("STRIDED_RDFT_TRACE"), Ok(ref v) if v == "1")
}

fn default_threads() -> usize {
    #[cfg(feature = "parallel")]
    {
        rayon::current_num_threads()
    }
    #[cfg(not(feature = "parallel"))]
    {
        1
    }
}

/// Global knobs read by solvers while planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Workers available to threaded solvers.
    pub threads: usize,
    /// Plans may overwrite their input buffer.
    pub destroy_input: bool,
    /// Only the first buddy's rank split is allowed.
    pub no_rank_splits: bool,
    /// Split preferences handed to the rank-splitting solvers.
    pub buddies: Arc<[isize]>,
    /// Log the full plan tree whenever a plan is picked.
    pub trace: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            destroy_input: false,
            no_rank_splits: false,
            buddies: Arc::from(&DEFAULT_BUDDIES[..]),
            trace: false,
        }
    }
}

impl PlannerConfig {
    /// Defaults overridden by `STRIDED_RDFT_THREADS` and `STRIDED_RDFT_TRACE=1`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("STRIDED_RDFT_THREADS") {
            match v.trim().parse::<usize>() {
                Ok(n) => config = config.with_threads(n),
                Err(_) => tracing::warn!(value = %v, "ignoring invalid STRIDED_RDFT_THREADS"),
            }
        }
        config.trace = trace_enabled();
        config
    }

    /// Worker count, clamped to at least one.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_destroy_input(mut self, yes: bool) -> Self {
        self.destroy_input = yes;
        self
    }

    pub fn with_no_rank_splits(mut self, yes: bool) -> Self {
        self.no_rank_splits = yes;
        self
    }

    pub fn with_buddies(mut self, buddies: impl Into<Arc<[isize]>>) -> Self {
        self.buddies = buddies.into();
        self
    }

    pub fn with_trace(mut self, yes: bool) -> Self {
        self.trace = yes;
        self
    }
}

type FailureHook = Box<dyn Fn(&Problem) -> bool + Send + Sync>;

/// Registry of solvers plus a memo from problem signature to plan.
///
/// A failed search is memoized too, so a problem no solver handles is not
/// searched again until [`forget`](Planner::forget).
pub struct Planner {
    config: PlannerConfig,
    solvers: Vec<Box<dyn Solver>>,
    memo: Mutex<HashMap<ProblemKey, Option<PlanRef>>>,
    live: Arc<AtomicUsize>,
    failure_hook: Option<FailureHook>,
}

impl Planner {
    /// A planner with no solvers registered.
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            solvers: Vec::new(),
            memo: Mutex::new(HashMap::new()),
            live: Arc::new(AtomicUsize::new(0)),
            failure_hook: None,
        }
    }

    /// A planner with the direct solver, one rank-splitting solver per
    /// configured buddy, and the threaded DIF solver for [`DEFAULT_RADICES`].
    pub fn with_default_solvers(config: PlannerConfig) -> Self {
        let mut planner = Self::new(config);
        planner.register(DirectSolver);
        for solver in RankGeq2::family(&planner.config.buddies) {
            planner.register(solver);
        }
        for radix in DEFAULT_RADICES {
            planner.register(Hc2hcDifThr::generic(radix));
        }
        planner
    }

    pub fn register(&mut self, solver: impl Solver + 'static) {
        self.solvers.push(Box::new(solver));
    }

    /// Make every problem for which `hook` returns true fail to plan.
    pub fn set_failure_hook(&mut self, hook: impl Fn(&Problem) -> bool + Send + Sync + 'static) {
        self.failure_hook = Some(Box::new(hook));
    }

    #[inline]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    #[inline]
    pub fn threads(&self) -> usize {
        self.config.threads
    }

    #[inline]
    pub fn destroy_input(&self) -> bool {
        self.config.destroy_input
    }

    #[inline]
    pub fn no_rank_splits(&self) -> bool {
        self.config.no_rank_splits
    }

    /// Register a new plan with this planner's live count.
    pub fn token(&self) -> PlanToken {
        PlanToken::new(&self.live)
    }

    /// Number of plans built by this planner that are still alive.
    pub fn live_plans(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    /// Number of memoized signatures, failures included.
    pub fn memo_len(&self) -> usize {
        self.memo.lock().len()
    }

    /// Drop every memoized plan and failure.
    pub fn forget(&self) {
        let drained: Vec<Option<PlanRef>> = self.memo.lock().drain().map(|(_, v)| v).collect();
        tracing::debug!(entries = drained.len(), "planner memo cleared");
        // plans are released outside the lock
        drop(drained);
    }

    /// Best plan for `p`, from the memo when possible.
    pub fn make_plan(&self, p: &Problem) -> Result<PlanRef> {
        let key = p.signature();
        if let Some(entry) = self.memo.lock().get(&key) {
            tracing::debug!(problem = %key, hit = entry.is_some(), "memo hit");
            return entry.clone().ok_or_else(|| PlanError::NoPlan {
                problem: key.to_string(),
            });
        }

        let result = self.search(p, &key);
        self.memo.lock().insert(key, result.as_ref().ok().cloned());
        result
    }

    /// Plan `p` and arm the result for execution.
    pub fn plan(&self, p: &Problem) -> Result<PlanHandle> {
        let plan = self.make_plan(p)?;
        plan.awake(true);
        Ok(PlanHandle {
            plan,
            problem: p.clone(),
        })
    }

    fn search(&self, p: &Problem, key: &ProblemKey) -> Result<PlanRef> {
        if let Some(hook) = &self.failure_hook {
            if hook(p) {
                tracing::trace!(problem = %key, "failure hook refused problem");
                return Err(PlanError::Injected {
                    problem: key.to_string(),
                });
            }
        }

        let scored: Vec<(&dyn Solver, Score)> = self
            .solvers
            .iter()
            .map(|s| (s.as_ref(), s.score(p, self)))
            .collect();

        let mut last_err = None;
        for tier in [Score::Favorable, Score::LowQuality] {
            let mut best: Option<(PlanRef, String)> = None;
            for &(solver, score) in &scored {
                if score != tier {
                    continue;
                }
                match solver.make_plan(p, self) {
                    Ok(plan) => {
                        let cost = plan.ops().cost();
                        tracing::trace!(problem = %key, solver = %solver.name(), cost, "candidate");
                        if best.as_ref().map_or(true, |(b, _)| cost < b.ops().cost()) {
                            best = Some((plan, solver.name()));
                        }
                    }
                    Err(err) => {
                        tracing::trace!(problem = %key, solver = %solver.name(), error = %err, "candidate failed");
                        last_err = Some(err);
                    }
                }
            }

            if let Some((plan, name)) = best {
                tracing::debug!(
                    problem = %key,
                    solver = %name,
                    score = ?tier,
                    cost = plan.ops().cost(),
                    "picked plan"
                );
                if self.config.trace {
                    tracing::debug!(plan = %describe_verbose(plan.as_ref()), "plan tree");
                }
                return Ok(plan);
            }
        }

        Err(last_err.unwrap_or_else(|| PlanError::NoPlan {
            problem: key.to_string(),
        }))
    }
}

/// An armed plan together with the problem it was planned for.
///
/// The plan stays armed for the lifetime of the handle. Execution checks the
/// caller's slices against the problem's geometry before touching them.
#[derive(Debug)]
pub struct PlanHandle {
    plan: PlanRef,
    problem: Problem,
}

impl PlanHandle {
    #[inline]
    pub fn plan(&self) -> &PlanRef {
        &self.plan
    }

    #[inline]
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn describe(&self) -> String {
        describe(self.plan.as_ref())
    }

    /// Run an out-of-place problem from `input` into `output`.
    ///
    /// Offsets are relative to the start of each slice, shifted by the
    /// problem's buffer offsets. `input` may be overwritten when the planner
    /// allowed destroying inputs.
    pub fn execute(&self, input: &mut [f64], output: &mut [f64]) -> Result<()> {
        if self.problem.is_inplace() {
            return Err(PlanError::InPlaceMismatch { inplace: true });
        }
        let full = self.problem.sz().append(self.problem.vecsz());
        let ibase = self.problem.input().offset;
        let obase = self.problem.output().offset;
        check_bounds("input", ibase, full.input_span()?, input.len())?;
        check_bounds("output", obase, full.output_span()?, output.len())?;

        // SAFETY: both spans were checked against the slices, and the two
        // slices cannot overlap.
        unsafe {
            self.plan.apply(
                input.as_mut_ptr().offset(ibase),
                output.as_mut_ptr().offset(obase),
            );
        }
        Ok(())
    }

    /// Run an in-place problem on `data`.
    pub fn execute_in_place(&self, data: &mut [f64]) -> Result<()> {
        if !self.problem.is_inplace() {
            return Err(PlanError::InPlaceMismatch { inplace: false });
        }
        let full = self.problem.sz().append(self.problem.vecsz());
        let base = self.problem.input().offset;
        check_bounds("input", base, full.input_span()?, data.len())?;
        check_bounds("output", base, full.output_span()?, data.len())?;

        // SAFETY: both spans were checked against `data`.
        unsafe {
            let ptr = data.as_mut_ptr().offset(base);
            self.plan.apply(ptr, ptr);
        }
        Ok(())
    }
}

impl Drop for PlanHandle {
    fn drop(&mut self) {
        self.plan.awake(false);
    }
}

fn check_bounds(which: &'static str, base: isize, span: (isize, isize), len: usize) -> Result<()> {
    let lo = base + span.0;
    let hi = base + span.1;
    if lo < 0 || hi >= len as isize {
        return Err(PlanError::BufferTooSmall { which, lo, hi, len });
    }
    Ok(())
}
