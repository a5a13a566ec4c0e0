//! Numeric leaf kernels for real-data transform plans.
//!
//! Everything in this crate operates on raw buffers handed down by a plan:
//!
//! - [`direct`]: O(n^2) reference transforms for every [`RdftKind`](rdft_tensor::RdftKind)
//! - [`hc2hc`]: the half-complex decimation-in-frequency butterfly, its
//!   [`ButterflyCursor`] and kernel capability predicates ([`Genus`])
//! - [`twiddle`]: twiddle-factor tables consumed by the butterfly
//! - [`spawn`]: the fork-join loop that splits a butterfly sweep among workers
//! - [`ops`]: the operation-count cost algebra attached to every plan
//!
//! # Features
//!
//! - `parallel` (default): run [`spawn_loop`] slices on rayon's thread pool.

pub mod direct;
pub mod hc2hc;
pub mod ops;
pub mod spawn;
pub mod twiddle;

pub use hc2hc::{
    hb_generic, ButterflyCursor, Genus, GenusQuery, Hc2hcDesc, Hc2hcKernel, SCALAR_GENUS,
};
pub use ops::Ops;
pub use spawn::{partition, spawn_loop, SendPtr, SpawnRange, SweepShare};
pub use twiddle::{TwiddleDesc, Twiddles};
