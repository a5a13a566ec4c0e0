//! Decomposition strategies.

use crate::plan::PlanRef;
use crate::planner::Planner;
use crate::problem::Problem;
use crate::Result;

/// How much a solver likes a problem.
///
/// Ordered from worst to best so the planner can take the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Score {
    /// The solver cannot or should not handle the problem.
    Reject,
    /// Usable, but only if nothing favorable succeeds.
    LowQuality,
    Favorable,
}

/// A policy that turns problems into plans.
///
/// `applicable` and `score` are pure and total. `make_plan` may recurse into
/// the planner for child problems and fails as a whole when any child fails.
pub trait Solver: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> String;

    fn applicable(&self, p: &Problem, plnr: &Planner) -> bool;

    fn score(&self, p: &Problem, plnr: &Planner) -> Score {
        if self.applicable(p, plnr) {
            Score::Favorable
        } else {
            Score::Reject
        }
    }

    fn make_plan(&self, p: &Problem, plnr: &Planner) -> Result<PlanRef>;
}
