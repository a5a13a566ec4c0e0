//! Direct O(n^2) one-dimensional transforms, one per [`RdftKind`].
//!
//! These are the leaf kernels of every plan: slow but exact reference
//! implementations operating on contiguous scratch buffers. Angles are reduced
//! modulo the period in integer arithmetic before evaluating `sin`/`cos`, which
//! keeps results within a few ulps for the sizes planners hand them.

use std::f64::consts::PI;

use num_complex::Complex64;
use num_traits::Zero;
use rdft_tensor::RdftKind;

use crate::ops::Ops;

/// `exp(2 pi i num / den)` with `num` reduced modulo `den`.
#[inline]
pub fn cis_frac(num: usize, den: usize) -> Complex64 {
    let theta = 2.0 * PI * ((num % den) as f64) / den as f64;
    Complex64::new(theta.cos(), theta.sin())
}

/// Complex value `X_k` encoded in a half-complex array of length `u.len()`.
#[inline]
pub fn hc_get(u: &[f64], k: usize) -> Complex64 {
    let n = u.len();
    let k = k % n;
    if k == 0 {
        Complex64::new(u[0], 0.0)
    } else if 2 * k < n {
        Complex64::new(u[k], u[n - k])
    } else if 2 * k == n {
        Complex64::new(u[k], 0.0)
    } else {
        Complex64::new(u[n - k], -u[k])
    }
}

/// Complex value `X_t` encoded in a half-sample-shifted half-complex array.
#[inline]
pub fn hc3_get(u: &[f64], t: usize) -> Complex64 {
    let r = u.len();
    if 2 * t + 1 < r {
        Complex64::new(u[t], u[r - 1 - t])
    } else if 2 * t + 1 == r {
        Complex64::new(u[t], 0.0)
    } else {
        Complex64::new(u[r - 1 - t], -u[t])
    }
}

/// Compute `output = kind(input)` for contiguous buffers of equal length.
pub fn transform_1d(kind: RdftKind, input: &[f64], output: &mut [f64]) {
    assert_eq!(
        input.len(),
        output.len(),
        "direct transform requires equal input/output lengths"
    );
    let n = input.len();
    if n == 0 {
        return;
    }
    match kind {
        RdftKind::R2hc => r2hc(input, output),
        RdftKind::Hc2r => {
            for (j, y) in output.iter_mut().enumerate() {
                let acc = (0..n).fold(Complex64::zero(), |acc, k| {
                    acc + hc_get(input, k) * cis_frac(j * k, n)
                });
                *y = acc.re;
            }
        }
        RdftKind::Dht => {
            for (k, y) in output.iter_mut().enumerate() {
                *y = input
                    .iter()
                    .enumerate()
                    .map(|(j, &x)| {
                        let w = cis_frac(j * k, n);
                        x * (w.re + w.im)
                    })
                    .sum();
            }
        }
        RdftKind::Hc2rIII => {
            for (j, y) in output.iter_mut().enumerate() {
                let acc = (0..n).fold(Complex64::zero(), |acc, t| {
                    acc + hc3_get(input, t) * cis_frac(j * (2 * t + 1), 2 * n)
                });
                *y = acc.re;
            }
        }
    }
}

fn r2hc(input: &[f64], output: &mut [f64]) {
    let n = input.len();
    for k in 0..=n / 2 {
        let acc = input
            .iter()
            .enumerate()
            .fold(Complex64::zero(), |acc, (j, &x)| {
                acc + cis_frac(j * k, n).conj() * x
            });
        output[k] = acc.re;
        if k > 0 && 2 * k < n {
            output[n - k] = acc.im;
        }
    }
}

/// Operation estimate for one direct transform of extent `n`.
pub fn ops_estimate(n: usize) -> Ops {
    let n = n as u64;
    Ops::new(2 * n * n, n, n, 0)
}
