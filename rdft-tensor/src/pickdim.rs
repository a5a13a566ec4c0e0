//! Resolution of a preferred split dimension against a concrete geometry.
//!
//! A split preference `which` names a dimension relative to the geometry:
//! `which > 0` is the `which`-th qualifying dimension from the front
//! (1-based), `which < 0` the `|which|`-th from the back, and `0` the middle
//! dimension. A dimension qualifies when the transform is out-of-place or the
//! dimension has equal input and output strides.

use crate::tensor::Tensor;

fn qualifies(sz: &Tensor, i: usize, oop: bool) -> bool {
    let d = sz.dims()[i];
    oop || d.is == d.os
}

fn really_pickdim(which: isize, sz: &Tensor, oop: bool) -> Option<usize> {
    let rank = sz.rank();
    if which > 0 {
        (0..rank)
            .filter(|&i| qualifies(sz, i, oop))
            .nth(which as usize - 1)
    } else if which < 0 {
        (0..rank)
            .rev()
            .filter(|&i| qualifies(sz, i, oop))
            .nth(which.unsigned_abs() - 1)
    } else if rank > 0 {
        let i = (rank - 1) / 2;
        qualifies(sz, i, oop).then_some(i)
    } else {
        None
    }
}

/// Resolve `which` to a dimension index of `sz`.
///
/// Returns `None` when `which` does not resolve, or when a buddy listed
/// before `which` in `buddies` resolves to the same dimension: among
/// equivalent preferences only the first one is applicable.
pub fn pickdim(which: isize, buddies: &[isize], sz: &Tensor, oop: bool) -> Option<usize> {
    let d = really_pickdim(which, sz, oop)?;
    for &buddy in buddies {
        if buddy == which {
            break;
        }
        if really_pickdim(buddy, sz, oop) == Some(d) {
            return None;
        }
    }
    Some(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::IoDim;
    use proptest::prelude::*;

    const BUDDIES: [isize; 3] = [0, 1, -2];

    #[test]
    fn test_pickdim_rank2_only_first_buddy_survives() {
        let sz = Tensor::row_major(&[8, 8]).unwrap();
        assert_eq!(pickdim(0, &BUDDIES, &sz, true), Some(0));
        // 1 -> dim 0, already claimed by buddy 0
        assert_eq!(pickdim(1, &BUDDIES, &sz, true), None);
        // -2 -> dim 0, already claimed by buddy 0
        assert_eq!(pickdim(-2, &BUDDIES, &sz, true), None);
    }

    #[test]
    fn test_pickdim_rank4() {
        let sz = Tensor::row_major(&[2, 3, 4, 5]).unwrap();
        assert_eq!(pickdim(0, &BUDDIES, &sz, true), Some(1));
        assert_eq!(pickdim(1, &BUDDIES, &sz, true), Some(0));
        assert_eq!(pickdim(-2, &BUDDIES, &sz, true), Some(2));
    }

    #[test]
    fn test_pickdim_in_place_skips_mismatched_strides() {
        let sz = Tensor::new([
            IoDim::new(4, 8, 2),
            IoDim::new(4, 2, 2),
            IoDim::new(2, 1, 1),
        ])
        .unwrap();
        assert_eq!(really_pickdim(1, &sz, false), Some(1));
        assert_eq!(really_pickdim(1, &sz, true), Some(0));
        assert_eq!(really_pickdim(-3, &sz, false), None);
    }

    #[test]
    fn test_zero_takes_middle_dim_only_if_it_qualifies() {
        let sz = Tensor::new([
            IoDim::new(4, 1, 1),
            IoDim::new(4, 8, 2),
            IoDim::new(2, 3, 3),
        ])
        .unwrap();
        assert_eq!(really_pickdim(0, &sz, true), Some(1));
        // no fallback to another dimension when the middle one fails
        assert_eq!(really_pickdim(0, &sz, false), None);
    }

    #[test]
    fn test_pickdim_rank0() {
        assert_eq!(pickdim(0, &BUDDIES, &Tensor::rank0(), true), None);
    }

    proptest! {
        #[test]
        fn prop_pickdim_in_range(rank in 1usize..6, which in -6isize..6) {
            let ns: Vec<usize> = (0..rank).map(|i| i + 2).collect();
            let sz = Tensor::row_major(&ns).unwrap();
            if let Some(d) = pickdim(which, &[which], &sz, true) {
                prop_assert!(d < rank);
            }
        }
    }
}
