//! Half-complex decimation-in-frequency butterflies.
//!
//! For a backward (half-complex to real) transform of size `n = radix * m`,
//! butterfly index `k` (`0 < k < m/2`) reads the `radix` spectrum values
//! `X_(k + m t)` and writes the `radix` twiddled partial sums
//! `Z_j(k) = W(j k) * sum_t X_(k + m t) exp(2 pi i j t / radix)`, each stored
//! in half-complex form inside block `j` of length `m`. The set of offsets a
//! butterfly touches,
//!
//! ```text
//! { k + m t, m - k + m t : t in 0..radix }   (times the element stride)
//! ```
//!
//! is the same for reads and writes and disjoint across distinct `k`, which
//! is what allows a sweep over `k` to be split among threads.

use num_complex::Complex64;
use num_traits::Zero;
use smallvec::SmallVec;

use crate::direct::cis_frac;
use crate::ops::Ops;
use crate::twiddle::TwiddleDesc;

/// Stack buffer for per-butterfly values; covers radices up to 16 inline.
type RVec<T> = SmallVec<[T; 16]>;

/// Butterfly kernel entry point.
///
/// Processes `count` consecutive butterfly indices starting at `cursor`.
///
/// # Safety
/// `buf` offset by every `cursor.real(t)` / `cursor.imag(t)` of the covered
/// indices must be valid for reads and writes, and no other thread may access
/// those offsets during the call.
pub type Hc2hcKernel =
    unsafe fn(buf: *mut f64, cursor: ButterflyCursor, twiddles: &[f64], radix: usize, count: usize);

/// Offsets a kernel is about to be invoked with, as seen by a capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenusQuery {
    pub radix: usize,
    /// Offset of the first real element (`is` for butterfly 1).
    pub ri: isize,
    /// Offset of the first imaginary element (`(radix*m - 1) * is`).
    pub ii: isize,
    /// Stride between the `radix` rows.
    pub ios: isize,
    /// Vector stride (0 when there is no vector loop).
    pub vs: isize,
    pub m: usize,
    pub is: isize,
}

/// Family of kernels sharing a vector width and a capability predicate.
#[derive(Debug)]
pub struct Genus {
    pub name: &'static str,
    /// Butterflies processed per kernel step.
    pub vl: usize,
    pub okp: fn(&GenusQuery) -> bool,
}

fn scalar_okp(q: &GenusQuery) -> bool {
    q.is != 0
        && q.m >= 2
        && q.vs == 0
        && q.ios == q.m as isize * q.is
        && q.ri == q.is
        && q.ii == (q.radix * q.m - 1) as isize * q.is
}

/// Scalar genus: one butterfly per step, any non-zero element stride.
pub static SCALAR_GENUS: Genus = Genus {
    name: "scalar",
    vl: 1,
    okp: scalar_okp,
};

/// Static description of one radix / kernel pairing.
#[derive(Debug, Clone, Copy)]
pub struct Hc2hcDesc {
    pub radix: usize,
    pub twiddle: TwiddleDesc,
    pub genus: &'static Genus,
    /// Cost of one kernel step.
    pub ops: Ops,
}

impl Hc2hcDesc {
    /// Descriptor for [`hb_generic`] at the given radix.
    pub fn generic(radix: usize) -> Self {
        assert!(radix >= 2, "butterfly radix must be at least 2");
        let r = radix as u64;
        Self {
            radix,
            twiddle: TwiddleDesc::new(radix),
            genus: &SCALAR_GENUS,
            ops: Ops::new(8 * r * r + 6 * (r - 1), 2 * r + 2 * (r - 1), 2 * r, 0),
        }
    }
}

/// Position of a butterfly inside the buffer and the twiddle table.
///
/// The real offset moves up by `is` per butterfly index and the imaginary
/// offset moves down by `is`, so both walk inward from the ends of the
/// size-`n` array. Offsets are checked against the array span in debug
/// builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButterflyCursor {
    ri: isize,
    ii: isize,
    ios: isize,
    is: isize,
    tw: usize,
    tw_stride: usize,
    lo: isize,
    hi: isize,
}

impl ButterflyCursor {
    /// Cursor at butterfly index 1 of a size `radix * m` array with stride `is`.
    pub fn new(radix: usize, m: usize, is: isize) -> Self {
        let n = (radix * m) as isize;
        let end = (n - 1) * is;
        Self {
            ri: is,
            ii: end,
            ios: m as isize * is,
            is,
            tw: 0,
            tw_stride: TwiddleDesc::new(radix).length(),
            lo: end.min(0),
            hi: end.max(0),
        }
    }

    /// The cursor advanced by `i` butterfly indices.
    #[must_use]
    pub fn at(self, i: usize) -> Self {
        let di = i as isize * self.is;
        Self {
            ri: self.ri + di,
            ii: self.ii - di,
            tw: self.tw + i * self.tw_stride,
            ..self
        }
    }

    #[inline]
    fn step(&mut self) {
        self.ri += self.is;
        self.ii -= self.is;
        self.tw += self.tw_stride;
    }

    /// Offset of the real part in row `t`.
    #[inline]
    pub fn real(&self, t: usize) -> isize {
        let off = self.ri + t as isize * self.ios;
        debug_assert!(
            off >= self.lo && off <= self.hi,
            "real offset {off} outside [{}, {}]",
            self.lo,
            self.hi
        );
        off
    }

    /// Offset of the imaginary part in row `t`.
    #[inline]
    pub fn imag(&self, t: usize) -> isize {
        let off = self.ii - t as isize * self.ios;
        debug_assert!(
            off >= self.lo && off <= self.hi,
            "imag offset {off} outside [{}, {}]",
            self.lo,
            self.hi
        );
        off
    }

    /// Start of this butterfly's twiddle row.
    #[inline]
    pub fn twiddle(&self) -> usize {
        self.tw
    }
}

/// Backward half-complex DIF butterfly for any radix.
///
/// # Safety
/// See [`Hc2hcKernel`].
pub unsafe fn hb_generic(
    buf: *mut f64,
    cursor: ButterflyCursor,
    twiddles: &[f64],
    radix: usize,
    count: usize,
) {
    let roots: RVec<Complex64> = (0..radix).map(|q| cis_frac(q, radix)).collect();
    let mut x: RVec<Complex64> = SmallVec::from_elem(Complex64::zero(), radix);
    let mut z: RVec<Complex64> = SmallVec::from_elem(Complex64::zero(), radix);
    let mut c = cursor;

    for _ in 0..count {
        for (t, xt) in x.iter_mut().enumerate() {
            let a = *buf.offset(c.real(t));
            let b = *buf.offset(c.imag(t));
            // rows past the midpoint hold the conjugate partner
            *xt = if 2 * t < radix {
                Complex64::new(a, b)
            } else {
                Complex64::new(b, -a)
            };
        }

        let w = &twiddles[c.twiddle()..c.twiddle() + 2 * (radix - 1)];
        for (j, zj) in z.iter_mut().enumerate() {
            let s = x
                .iter()
                .enumerate()
                .fold(Complex64::zero(), |acc, (t, &xt)| {
                    acc + xt * roots[(j * t) % radix]
                });
            *zj = if j == 0 {
                s
            } else {
                s * Complex64::new(w[2 * (j - 1)], w[2 * (j - 1) + 1])
            };
        }

        for (j, zj) in z.iter().enumerate() {
            *buf.offset(c.real(j)) = zj.re;
            *buf.offset(c.imag(radix - 1 - j)) = zj.im;
        }
        c.step();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direct::hc_get;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use rand_distr::StandardNormal;

    #[test]
    fn test_cursor_walks_inward() {
        let c = ButterflyCursor::new(4, 16, 1);
        assert_eq!((c.real(0), c.imag(0)), (1, 63));
        assert_eq!((c.real(3), c.imag(3)), (49, 15));
        let c3 = c.at(2);
        assert_eq!((c3.real(0), c3.imag(0)), (3, 61));
        assert_eq!(c3.twiddle(), 12);
    }

    #[test]
    fn test_cursor_negative_stride() {
        let c = ButterflyCursor::new(2, 4, -1);
        assert_eq!((c.real(0), c.imag(0)), (-1, -7));
        assert_eq!((c.real(1), c.imag(1)), (-5, -3));
    }

    #[test]
    fn test_scalar_genus_predicate() {
        let ok = GenusQuery {
            radix: 4,
            ri: 2,
            ii: 126,
            ios: 32,
            vs: 0,
            m: 16,
            is: 2,
        };
        assert!((SCALAR_GENUS.okp)(&ok));
        assert!(!(SCALAR_GENUS.okp)(&GenusQuery { vs: 64, ..ok }));
        assert!(!(SCALAR_GENUS.okp)(&GenusQuery { ios: 31, ..ok }));
    }

    #[test]
    fn test_butterfly_touches_only_its_index_set() {
        let (radix, m) = (3usize, 10usize);
        let n = radix * m;
        let mut buf: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let tw = TwiddleDesc::new(radix).compute(n, (m - 1) / 2);
        let k = 3;
        let cursor = ButterflyCursor::new(radix, m, 1).at(k - 1);
        unsafe { hb_generic(buf.as_mut_ptr(), cursor, tw.as_slice(), radix, 1) };
        for (i, &v) in buf.iter().enumerate() {
            let in_set = (0..radix).any(|t| i == k + m * t || i == m - k + m * t);
            if !in_set {
                assert_eq!(v, i as f64, "offset {i} was modified");
            }
        }
    }

    #[test]
    fn test_butterfly_matches_definition() {
        let (radix, m) = (4usize, 8usize);
        let n = radix * m;
        let mut rng = StdRng::seed_from_u64(42);
        let hc: Vec<f64> = (0..n).map(|_| rng.sample(StandardNormal)).collect();
        let tw = TwiddleDesc::new(radix).compute(n, (m - 1) / 2);

        let mut buf = hc.clone();
        let cursor = ButterflyCursor::new(radix, m, 1);
        unsafe { hb_generic(buf.as_mut_ptr(), cursor, tw.as_slice(), radix, (m - 1) / 2) };

        for k in 1..(m + 1) / 2 {
            for j in 0..radix {
                let mut s = Complex64::zero();
                for t in 0..radix {
                    s += hc_get(&hc, k + m * t) * cis_frac(j * t, radix);
                }
                let z = s * cis_frac(j * k, n);
                assert_relative_eq!(buf[j * m + k], z.re, epsilon = 1e-12);
                assert_relative_eq!(buf[j * m + m - k], z.im, epsilon = 1e-12);
            }
        }
    }
}
