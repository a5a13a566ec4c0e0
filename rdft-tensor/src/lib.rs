//! Geometry algebra for real-data transform planning.
//!
//! A transform's shape is described by a [`Tensor`]: an ordered list of
//! [`IoDim`] records `(n, is, os)` giving the extent of a dimension and its
//! input and output strides (in elements). Planning works by carving these
//! geometries into smaller ones, so every operation here returns a fresh
//! value and never aliases its source.
//!
//! # Dependency graph
//!
//! ```text
//! rdft-tensor -> rdft-kernel -> rdft-plan -> strided-rdft
//! ```
//!
//! # Example
//!
//! ```rust
//! use rdft_tensor::{InplaceKind, Tensor};
//!
//! // An 8 x 8 row-major geometry, split after the first dimension.
//! let sz = Tensor::row_major(&[8, 8]).unwrap();
//! let (outer, inner) = sz.split(1);
//! assert_eq!(outer.dims()[0].is, 8);
//! assert_eq!(inner.dims()[0].is, 1);
//! assert!(sz.copy_inplace(InplaceKind::Os).inplace_strides());
//! ```

pub mod kind;
pub mod pickdim;
pub mod tensor;

pub use kind::{real_n, real_sz, RdftKind};
pub use pickdim::pickdim;
pub use tensor::{row_major_strides, InplaceKind, IoDim, Tensor};

/// Errors raised while building geometries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TensorError {
    /// A dimension was given extent zero.
    #[error("zero extent in dim {dim}")]
    ZeroExtent { dim: usize },

    /// Extents and strides were supplied with different lengths.
    #[error("stride and dims length mismatch: {dims} dims, {strides} strides")]
    StrideLengthMismatch { dims: usize, strides: usize },

    /// Integer overflow while computing an offset span.
    #[error("offset overflow while computing tensor span")]
    OffsetOverflow,
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, TensorError>;
