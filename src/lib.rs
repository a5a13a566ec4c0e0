//! Planned real-data Fourier-family transforms over strided buffers.
//!
//! This crate re-exports the planning workspace behind one import:
//!
//! - geometry: [`Tensor`], [`IoDim`], [`RdftKind`]
//! - problems and plans: [`Problem`], [`BufferRef`], [`Plan`], [`PlanHandle`]
//! - planning: [`Planner`], [`PlannerConfig`], and the solvers
//!   [`DirectSolver`], [`RankGeq2`], [`Hc2hcDifThr`]
//!
//! # Primary API
//!
//! - [`contiguous_problem`]: a row-major problem over whole buffers
//! - [`execute`] / [`execute_in_place`]: run a planned transform on slices,
//!   after checking every offset the problem reaches
//!
//! # Example
//!
//! ```rust
//! use strided_rdft::{contiguous_problem, execute_in_place, Planner, PlannerConfig, RdftKind};
//!
//! let planner = Planner::with_default_solvers(PlannerConfig::default());
//! let problem = contiguous_problem(&[4, 8], &[RdftKind::R2hc, RdftKind::R2hc], true).unwrap();
//! let handle = planner.plan(&problem).unwrap();
//!
//! let mut data = vec![0.0; 32];
//! data[0] = 1.0;
//! execute_in_place(&handle, &mut data).unwrap();
//! // the transform of an impulse is flat in every real component
//! assert!((data[0] - 1.0).abs() < 1e-12);
//! ```
//!
//! # Environment
//!
//! [`PlannerConfig::from_env`] reads `STRIDED_RDFT_THREADS` (worker count)
//! and `STRIDED_RDFT_TRACE=1` (log every picked plan tree at debug level).

pub use rdft_kernel::{partition, spawn_loop, Ops, SpawnRange};
pub use rdft_plan::{
    describe, describe_verbose, BufferRef, DirectSolver, Hc2hcDifThr, Plan, PlanError,
    PlanHandle, PlanRef, Planner, PlannerConfig, Problem, ProblemKey, RankGeq2, RankGeq2Config,
    Score, Solver, DEFAULT_BUDDIES, DEFAULT_RADICES,
};
pub use rdft_tensor::{InplaceKind, IoDim, RdftKind, Tensor, TensorError};

/// Result type for the facade entry points.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Problem over a contiguous row-major array of `shape`.
///
/// In-place problems read and write buffer 0; out-of-place problems read
/// buffer 0 and write buffer 1, both starting at offset 0.
pub fn contiguous_problem(shape: &[usize], kinds: &[RdftKind], inplace: bool) -> Result<Problem> {
    let sz = Tensor::row_major(shape)?;
    let input = BufferRef::new(0, 0);
    let output = if inplace { input } else { BufferRef::new(1, 0) };
    Problem::new(sz, Tensor::rank0(), input, output, kinds)
}

/// Run an out-of-place plan from `input` into `output`.
pub fn execute(handle: &PlanHandle, input: &mut [f64], output: &mut [f64]) -> Result<()> {
    handle.execute(input, output)
}

/// Run an in-place plan on `data`.
pub fn execute_in_place(handle: &PlanHandle, data: &mut [f64]) -> Result<()> {
    handle.execute_in_place(data)
}
