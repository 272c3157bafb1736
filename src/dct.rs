//! Truncated orthonormal DCT-II basis and cepstral liftering.

use alloc::vec;
use alloc::vec::Vec;
use core::f32::consts::PI;
use libm::{cosf, sinf, sqrtf};

/// Build the first `num_rows` rows of the orthonormal DCT-II basis over
/// `num_cols` inputs, row-major.
///
/// Row 0 is the constant `sqrt(1/num_cols)` (the mean component); row
/// `r >= 1`, column `c` is
/// `sqrt(2/num_cols) * cos(pi/num_cols * (c + 0.5) * r)`. With this
/// scaling the full matrix is orthonormal, and truncation just drops the
/// high-order rows.
pub fn compute_dct_matrix(num_rows: usize, num_cols: usize) -> Vec<f32> {
    debug_assert!(num_rows >= 1 && num_rows <= num_cols);
    let mut matrix = vec![0.0f32; num_rows * num_cols];
    let normalizer0 = sqrtf(1.0 / num_cols as f32);
    let normalizer = sqrtf(2.0 / num_cols as f32);
    for (r, row) in matrix.chunks_exact_mut(num_cols).enumerate() {
        for (c, value) in row.iter_mut().enumerate() {
            *value = if r == 0 {
                normalizer0
            } else {
                normalizer * cosf(PI / num_cols as f32 * (c as f32 + 0.5) * r as f32)
            };
        }
    }
    matrix
}

/// Per-coefficient cepstral lifter weights:
/// `1 + 0.5 * Q * sin(pi * i / Q)` for lifter parameter `Q`.
///
/// `Q == 0` disables liftering (all ones). Index 0 is always exactly 1,
/// so energy substitution commutes with liftering.
pub fn compute_lifter_coeffs(num_ceps: usize, cepstral_lifter: f32) -> Vec<f32> {
    let mut coeffs = vec![1.0f32; num_ceps];
    if cepstral_lifter != 0.0 {
        for (i, c) in coeffs.iter_mut().enumerate() {
            *c = 1.0 + 0.5 * cepstral_lifter * sinf(PI * i as f32 / cepstral_lifter);
        }
    }
    coeffs
}
