//! Transform problems and the signature used to memoize their plans.

use std::fmt;

use rdft_tensor::{RdftKind, Tensor};

use crate::{PlanError, Result};

/// Abstract identity of a buffer position.
///
/// Plans never see user memory while being built; `array` names a buffer
/// and `offset` the element a problem starts at. Two problems alias exactly
/// when their `BufferRef`s compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferRef {
    pub array: u32,
    pub offset: isize,
}

impl BufferRef {
    pub const fn new(array: u32, offset: isize) -> Self {
        Self { array, offset }
    }

    /// The same buffer, `delta` elements further along.
    #[must_use]
    pub const fn offset_by(self, delta: isize) -> Self {
        Self {
            array: self.array,
            offset: self.offset + delta,
        }
    }
}

/// One transform instance: geometry, per-dimension kinds, and buffers.
///
/// `sz` holds the transform dimensions and `vecsz` the loop (batch)
/// dimensions the transform is repeated over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    sz: Tensor,
    vecsz: Tensor,
    kind: Vec<RdftKind>,
    input: BufferRef,
    output: BufferRef,
}

impl Problem {
    /// Build a problem; fails unless there is one kind per transform dimension.
    pub fn new(
        sz: Tensor,
        vecsz: Tensor,
        input: BufferRef,
        output: BufferRef,
        kind: impl Into<Vec<RdftKind>>,
    ) -> Result<Self> {
        let kind = kind.into();
        if kind.len() != sz.rank() {
            return Err(PlanError::KindRankMismatch {
                kinds: kind.len(),
                rank: sz.rank(),
            });
        }
        Ok(Self {
            sz,
            vecsz,
            kind,
            input,
            output,
        })
    }

    #[inline]
    pub fn sz(&self) -> &Tensor {
        &self.sz
    }

    #[inline]
    pub fn vecsz(&self) -> &Tensor {
        &self.vecsz
    }

    #[inline]
    pub fn kind(&self) -> &[RdftKind] {
        &self.kind
    }

    #[inline]
    pub fn input(&self) -> BufferRef {
        self.input
    }

    #[inline]
    pub fn output(&self) -> BufferRef {
        self.output
    }

    #[inline]
    pub fn is_inplace(&self) -> bool {
        self.input == self.output
    }

    /// Memo key: everything a plan depends on except buffer identity.
    pub fn signature(&self) -> ProblemKey {
        ProblemKey {
            sz: self.sz.clone(),
            vecsz: self.vecsz.clone(),
            kind: self.kind.clone(),
            inplace: self.is_inplace(),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.signature(), f)
    }
}

/// Canonical problem signature used by the planner's memo.
///
/// Plans receive their buffers at apply time, so two problems that differ
/// only in where their buffers live can share one plan. Whether input and
/// output alias does change which plans are valid, so it is part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProblemKey {
    pub sz: Tensor,
    pub vecsz: Tensor,
    pub kind: Vec<RdftKind>,
    pub inplace: bool,
}

impl fmt::Display for ProblemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("rdft")?;
        for k in &self.kind {
            write!(f, "-{k}")?;
        }
        write!(f, " sz={} vecsz={}", self.sz, self.vecsz)?;
        if self.inplace {
            f.write_str(" in-place")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem(input: BufferRef, output: BufferRef) -> Problem {
        Problem::new(
            Tensor::row_major(&[8, 8]).unwrap(),
            Tensor::rank0(),
            input,
            output,
            vec![RdftKind::R2hc; 2],
        )
        .unwrap()
    }

    #[test]
    fn test_kind_rank_mismatch() {
        let err = Problem::new(
            Tensor::row_major(&[8, 8]).unwrap(),
            Tensor::rank0(),
            BufferRef::new(0, 0),
            BufferRef::new(1, 0),
            vec![RdftKind::R2hc],
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::KindRankMismatch { kinds: 1, rank: 2 }));
    }

    #[test]
    fn test_inplace_is_buffer_identity() {
        let a = BufferRef::new(0, 4);
        assert!(problem(a, a).is_inplace());
        assert!(!problem(a, a.offset_by(1)).is_inplace());
        assert!(!problem(a, BufferRef::new(1, 4)).is_inplace());
    }

    #[test]
    fn test_signature_ignores_buffer_identity() {
        let p = problem(BufferRef::new(0, 0), BufferRef::new(1, 0));
        let q = problem(BufferRef::new(2, 16), BufferRef::new(3, 0));
        let r = problem(BufferRef::new(2, 0), BufferRef::new(2, 0));
        assert_eq!(p.signature(), q.signature());
        assert_ne!(p.signature(), r.signature());
    }

    #[test]
    fn test_display() {
        let p = problem(BufferRef::new(0, 0), BufferRef::new(0, 0));
        assert_eq!(
            p.to_string(),
            "rdft-r2hc-r2hc sz=[(8 8 8) (8 1 1)] vecsz=[] in-place"
        );
    }
}
