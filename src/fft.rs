//! Fixed-size real FFT engine with Kaldi-style packed output.
//!
//! The spectral stages only ever transform one block size (the frame's
//! padding length), so the engine precomputes its twiddle table once and
//! reuses an owned complex scratch buffer across frames. The packed
//! output layout is the one Kaldi's real FFT uses: the two purely real
//! coefficients (bin 0 and bin n/2) occupy the first two slots, followed
//! by interleaved re/im pairs for the interior bins.

use alloc::vec;
use alloc::vec::Vec;
use core::f32::consts::PI;
use libm::{logf, sincosf, sqrtf};

use crate::EPS;

/// Complex number stored as two `f32`s.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex32 {
    pub re: f32,
    pub im: f32,
}

impl Complex32 {
    #[inline]
    pub fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    #[inline]
    pub fn zero() -> Self {
        Self { re: 0.0, im: 0.0 }
    }

    #[inline]
    pub fn add(self, other: Self) -> Self {
        Self::new(self.re + other.re, self.im + other.im)
    }

    #[inline]
    pub fn sub(self, other: Self) -> Self {
        Self::new(self.re - other.re, self.im - other.im)
    }

    #[inline]
    pub fn mul(self, other: Self) -> Self {
        Self::new(
            self.re * other.re - self.im * other.im,
            self.re * other.im + self.im * other.re,
        )
    }
}

/// Real-input FFT over a fixed, power-of-two block size.
pub struct FftComputer {
    n: usize,
    /// `twiddles[m] = exp(-2*pi*i * m / n)` for `m in 0..n/2`.
    twiddles: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl FftComputer {
    /// Build an engine for blocks of `n` samples.
    ///
    /// # Panics
    /// `n` must be a power of two and at least 2; the frame splitter's
    /// `padding_length()` guarantees this for every configured frame
    /// length.
    pub fn new(n: usize) -> Self {
        assert!(
            n.is_power_of_two() && n >= 2,
            "FFT size must be a power of two >= 2, got {}",
            n
        );
        let mut twiddles = Vec::with_capacity(n / 2);
        for m in 0..n / 2 {
            let (s, c) = sincosf(-2.0 * PI * m as f32 / n as f32);
            twiddles.push(Complex32::new(c, s));
        }
        Self {
            n,
            twiddles,
            scratch: vec![Complex32::zero(); n],
        }
    }

    /// Transform size this engine was built for.
    pub fn size(&self) -> usize {
        self.n
    }

    /// In-place real FFT of `buf`.
    ///
    /// On return `buf` holds the packed non-redundant half-spectrum:
    /// `buf[0] = Re(bin 0)`, `buf[1] = Re(bin n/2)`, and
    /// `buf[2k], buf[2k+1] = Re, Im` of bin `k` for `k in 1..n/2`.
    /// Bins 0 and n/2 have no imaginary part for real input, which is
    /// what lets the full half-spectrum fit in `n` slots.
    ///
    /// # Panics
    /// `buf.len()` must equal [`FftComputer::size`].
    pub fn transform_real(&mut self, buf: &mut [f32]) {
        assert_eq!(
            buf.len(),
            self.n,
            "FFT buffer length {} does not match transform size {}",
            buf.len(),
            self.n
        );
        for (c, &x) in self.scratch.iter_mut().zip(buf.iter()) {
            *c = Complex32::new(x, 0.0);
        }
        fft_inplace(&mut self.scratch, &self.twiddles);
        buf[0] = self.scratch[0].re;
        buf[1] = self.scratch[self.n / 2].re;
        for k in 1..self.n / 2 {
            buf[2 * k] = self.scratch[k].re;
            buf[2 * k + 1] = self.scratch[k].im;
        }
    }
}

/// Iterative radix-2 decimation-in-time FFT.
///
/// `twiddles` must hold `data.len()/2` roots as built by
/// [`FftComputer::new`].
fn fft_inplace(data: &mut [Complex32], twiddles: &[Complex32]) {
    let n = data.len();
    debug_assert!(n.is_power_of_two());
    debug_assert_eq!(twiddles.len(), n / 2);

    // Bit-reversal permutation
    let mut j = 0;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            data.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let step = n / len;
        let half = len / 2;
        for start in (0..n).step_by(len) {
            for k in 0..half {
                let w = twiddles[k * step];
                let u = data[start + k];
                let v = data[start + k + half].mul(w);
                data[start + k] = u.add(v);
                data[start + k + half] = u.sub(v);
            }
        }
        len <<= 1;
    }
}

/// Derive the magnitude or power spectrum from a packed real FFT buffer.
///
/// `realfft` is `2 * (spectrum.len() - 1)` packed coefficients as
/// produced by [`FftComputer::transform_real`]; `spectrum` receives
/// `n/2 + 1` values. With `apply_pow` the squared magnitude is kept,
/// otherwise the square root is taken; with `apply_log` the natural log
/// is applied after flooring at [`EPS`].
pub fn compute_spectrum(realfft: &[f32], spectrum: &mut [f32], apply_pow: bool, apply_log: bool) {
    let dim = spectrum.len();
    assert!(dim >= 2, "spectrum must hold at least 2 bins");
    assert_eq!(
        realfft.len(),
        2 * (dim - 1),
        "packed FFT buffer length {} does not match spectrum dimension {}",
        realfft.len(),
        dim
    );
    for (i, out) in spectrum.iter_mut().enumerate() {
        let mag2 = if i == 0 {
            realfft[0] * realfft[0]
        } else if i == dim - 1 {
            realfft[1] * realfft[1]
        } else {
            realfft[2 * i] * realfft[2 * i] + realfft[2 * i + 1] * realfft[2 * i + 1]
        };
        let mut v = if apply_pow { mag2 } else { sqrtf(mag2) };
        if apply_log {
            v = logf(v.max(EPS));
        }
        *out = v;
    }
}
