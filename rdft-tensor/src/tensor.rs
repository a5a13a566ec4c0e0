//! Dimension records and the tensor geometry built from them.

use std::fmt;

use smallvec::SmallVec;

use crate::{Result, TensorError};

/// Inline storage for dimension lists; plans rarely exceed rank 4.
type DimVec = SmallVec<[IoDim; 4]>;

/// One dimension of a transform: extent plus input and output strides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IoDim {
    /// Extent (always at least 1).
    pub n: usize,
    /// Input stride in elements.
    pub is: isize,
    /// Output stride in elements.
    pub os: isize,
}

impl IoDim {
    #[inline]
    pub const fn new(n: usize, is: isize, os: isize) -> Self {
        Self { n, is, os }
    }
}

/// Which side's strides survive [`Tensor::copy_inplace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InplaceKind {
    /// Input strides are overwritten by output strides.
    Os,
    /// Output strides are overwritten by input strides.
    Is,
}

/// Ordered list of [`IoDim`] records.
///
/// A tensor of rank 0 describes a single point (one transform, or a vector
/// loop of length one).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Tensor {
    dims: DimVec,
}

/// Compute row-major strides (last index varies fastest).
pub fn row_major_strides(dims: &[usize]) -> Vec<isize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * dims[i + 1] as isize;
    }
    strides
}

impl Tensor {
    /// Build a tensor from dimension records, rejecting zero extents.
    pub fn new(dims: impl IntoIterator<Item = IoDim>) -> Result<Self> {
        let dims: DimVec = dims.into_iter().collect();
        if let Some(dim) = dims.iter().position(|d| d.n == 0) {
            return Err(TensorError::ZeroExtent { dim });
        }
        Ok(Self { dims })
    }

    /// Build a tensor from parallel extent and stride lists.
    pub fn from_parts(ns: &[usize], is: &[isize], os: &[isize]) -> Result<Self> {
        if ns.len() != is.len() || ns.len() != os.len() {
            return Err(TensorError::StrideLengthMismatch {
                dims: ns.len(),
                strides: is.len().min(os.len()),
            });
        }
        Self::new(
            ns.iter()
                .zip(is.iter().zip(os.iter()))
                .map(|(&n, (&is, &os))| IoDim::new(n, is, os)),
        )
    }

    /// Dense row-major geometry with identical input and output strides.
    pub fn row_major(ns: &[usize]) -> Result<Self> {
        let strides = row_major_strides(ns);
        Self::from_parts(ns, &strides, &strides)
    }

    /// Build from records already known to have positive extents.
    pub(crate) fn from_valid(dims: impl IntoIterator<Item = IoDim>) -> Self {
        let dims: DimVec = dims.into_iter().collect();
        debug_assert!(dims.iter().all(|d| d.n > 0));
        Self { dims }
    }

    /// The rank-0 tensor.
    pub fn rank0() -> Self {
        Self::default()
    }

    /// A rank-1 tensor. Panics when `n == 0`.
    pub fn dim1(n: usize, is: isize, os: isize) -> Self {
        assert!(n > 0, "tensor extent must be positive");
        let mut dims = DimVec::new();
        dims.push(IoDim::new(n, is, os));
        Self { dims }
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn dims(&self) -> &[IoDim] {
        &self.dims
    }

    /// Number of points covered (product of extents; 1 for rank 0).
    pub fn total(&self) -> usize {
        self.dims.iter().map(|d| d.n).product()
    }

    /// Split into the first `rank` dimensions and the remainder.
    ///
    /// Splitting past the end is a contract violation and panics.
    pub fn split(&self, rank: usize) -> (Tensor, Tensor) {
        assert!(
            rank <= self.rank(),
            "cannot split rank-{} tensor at {}",
            self.rank(),
            rank
        );
        let head = Tensor {
            dims: self.dims[..rank].iter().copied().collect(),
        };
        let tail = Tensor {
            dims: self.dims[rank..].iter().copied().collect(),
        };
        (head, tail)
    }

    /// Copy with one side's strides forced onto the other.
    pub fn copy_inplace(&self, which: InplaceKind) -> Tensor {
        let dims = self
            .dims
            .iter()
            .map(|d| match which {
                InplaceKind::Os => IoDim::new(d.n, d.os, d.os),
                InplaceKind::Is => IoDim::new(d.n, d.is, d.is),
            })
            .collect();
        Tensor { dims }
    }

    /// Concatenate `self` followed by `other`.
    pub fn append(&self, other: &Tensor) -> Tensor {
        let mut dims = self.dims.clone();
        dims.extend(other.dims.iter().copied());
        Tensor { dims }
    }

    /// True when every dimension reads and writes with the same stride.
    pub fn inplace_strides(&self) -> bool {
        self.dims.iter().all(|d| d.is == d.os)
    }

    /// Smallest absolute stride over both sides (0 for rank 0).
    pub fn min_stride(&self) -> usize {
        self.dims
            .iter()
            .map(|d| d.is.unsigned_abs().min(d.os.unsigned_abs()))
            .min()
            .unwrap_or(0)
    }

    /// Largest index spanned, counting the wider stride of each dimension.
    pub fn max_index(&self) -> usize {
        self.dims
            .iter()
            .map(|d| (d.n - 1) * d.is.unsigned_abs().max(d.os.unsigned_abs()))
            .sum()
    }

    /// `(input, output)` offsets of every point, last dimension fastest.
    ///
    /// A rank-0 tensor yields the single offset pair `(0, 0)`.
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let mut out = Vec::with_capacity(self.total());
        out.push((0isize, 0isize));
        for d in self.dims.iter() {
            let prev = std::mem::take(&mut out);
            out.reserve(prev.len() * d.n);
            for (i0, o0) in prev {
                for k in 0..d.n as isize {
                    out.push((i0 + k * d.is, o0 + k * d.os));
                }
            }
        }
        out
    }

    /// `(min, max)` offsets reached through the input strides.
    pub fn input_span(&self) -> Result<(isize, isize)> {
        span(self.dims.iter().map(|d| (d.n, d.is)))
    }

    /// `(min, max)` offsets reached through the output strides.
    pub fn output_span(&self) -> Result<(isize, isize)> {
        span(self.dims.iter().map(|d| (d.n, d.os)))
    }
}

fn span(dims: impl Iterator<Item = (usize, isize)>) -> Result<(isize, isize)> {
    let mut lo = 0isize;
    let mut hi = 0isize;
    for (n, stride) in dims {
        if n > 1 {
            let end = stride
                .checked_mul(n as isize - 1)
                .ok_or(TensorError::OffsetOverflow)?;
            if end >= 0 {
                hi = hi.checked_add(end).ok_or(TensorError::OffsetOverflow)?;
            } else {
                lo = lo.checked_add(end).ok_or(TensorError::OffsetOverflow)?;
            }
        }
    }
    Ok((lo, hi))
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "({} {} {})", d.n, d.is, d.os)?;
        }
        f.write_str("]")
    }
}
