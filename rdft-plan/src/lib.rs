//! Plan construction and execution for real-data transforms.
//!
//! A [`Problem`] describes one transform: its geometry, the kind of each
//! transform dimension and the buffers it reads and writes. A [`Planner`]
//! asks every registered [`Solver`] to rate the problem, builds the
//! candidates, and keeps the cheapest [`Plan`] by its [`Ops`] estimate.
//! Solvers decompose problems into child problems and ask the planner for
//! their plans in turn, so the result is a tree of plans whose leaves are
//! directly executable kernels. Repeated sub-problems are memoized and
//! shared, which makes the tree a DAG.
//!
//! Solvers shipped here:
//!
//! - [`DirectSolver`]: O(n^2) leaf for any rank-1 problem
//! - [`RankGeq2`]: splits a rank >= 2 problem into two lower-rank stages
//!   chained through the output buffer
//! - [`Hc2hcDifThr`]: Cooley-Tukey decimation in frequency for backward
//!   transforms, with the butterfly sweep split among threads
//!
//! # Example
//!
//! ```rust
//! use rdft_plan::{BufferRef, Planner, PlannerConfig, Problem};
//! use rdft_tensor::{RdftKind, Tensor};
//!
//! let planner = Planner::with_default_solvers(PlannerConfig::default().with_threads(1));
//! let sz = Tensor::row_major(&[4, 4]).unwrap();
//! let problem = Problem::new(
//!     sz,
//!     Tensor::rank0(),
//!     BufferRef::new(0, 0),
//!     BufferRef::new(1, 0),
//!     vec![RdftKind::R2hc; 2],
//! )
//! .unwrap();
//!
//! let handle = planner.plan(&problem).unwrap();
//! let mut input = vec![1.0; 16];
//! let mut output = vec![0.0; 16];
//! handle.execute(&mut input, &mut output).unwrap();
//! assert!((output[0] - 16.0).abs() < 1e-12);
//! ```

pub mod hc2hc;
pub mod plan;
pub mod planner;
pub mod problem;
pub mod solver;
pub mod solvers;

pub use hc2hc::thr::Hc2hcDifThr;
pub use plan::{describe, describe_verbose, Plan, PlanRef, PlanToken, Printer};
pub use planner::{PlanHandle, Planner, PlannerConfig, DEFAULT_BUDDIES, DEFAULT_RADICES};
pub use problem::{BufferRef, Problem, ProblemKey};
pub use rdft_kernel::Ops;
pub use solver::{Score, Solver};
pub use solvers::direct::DirectSolver;
pub use solvers::rank_geq2::{RankGeq2, RankGeq2Config};

use rdft_tensor::TensorError;

/// Errors raised while building or executing plans.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The number of transform kinds differs from the transform rank.
    #[error("{kinds} transform kinds given for a rank-{rank} geometry")]
    KindRankMismatch { kinds: usize, rank: usize },

    /// A solver was asked to build a plan for a problem it does not handle.
    #[error("solver {solver} is not applicable to {problem}")]
    NotApplicable { solver: String, problem: String },

    /// A child plan could not be built; nothing built so far survives.
    #[error("{solver}: child plan {stage} failed")]
    ChildPlanFailed {
        solver: String,
        stage: &'static str,
        #[source]
        source: Box<PlanError>,
    },

    /// No registered solver produced a plan.
    #[error("no plan for {problem}")]
    NoPlan { problem: String },

    /// The planner's failure hook refused the problem.
    #[error("plan construction refused by failure hook for {problem}")]
    Injected { problem: String },

    /// A user buffer does not cover every offset the problem reaches.
    #[error("{which} buffer too small: offsets [{lo}, {hi}] against length {len}")]
    BufferTooSmall {
        which: &'static str,
        lo: isize,
        hi: isize,
        len: usize,
    },

    /// The entry point does not match the problem's in-place flag.
    #[error("entry point does not match problem (in-place = {inplace})")]
    InPlaceMismatch { inplace: bool },

    #[error(transparent)]
    Tensor(#[from] TensorError),
}

/// Result type for planning operations.
pub type Result<T> = std::result::Result<T, PlanError>;
