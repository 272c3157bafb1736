//! Triangular mel filter-bank construction.
//!
//! Filters are spaced uniformly on the mel scale between the configured
//! lower and upper frequency bounds and sampled at each FFT bin's center
//! frequency. Each filter is returned as a full-length weight vector
//! over the spectrum index range; weights outside the triangle's support
//! are zero, so the vectors are effectively sparse.

use alloc::vec;
use alloc::vec::Vec;
use libm::{expf, logf};

use crate::config::ConfigError;

/// Map a frequency in Hz to the mel scale.
///
/// `1127 * ln(1 + f/700)`, the natural-log form of the familiar
/// `2595 * log10(1 + f/700)`.
pub fn mel_scale(freq: f32) -> f32 {
    1127.0 * logf(1.0 + freq / 700.0)
}

/// Inverse of [`mel_scale`].
pub fn inverse_mel_scale(mel: f32) -> f32 {
    700.0 * (expf(mel / 1127.0) - 1.0)
}

/// Build `num_mel_bins` triangular filters over `num_fft_bins` spectrum
/// bins (`num_fft_bins = padding_length/2 + 1`).
///
/// `[lower_bound, upper_bound]` is partitioned into `num_mel_bins + 2`
/// equally spaced mel points; filter `k` rises from point `k` to peak 1
/// at point `k+1` and falls back to zero at point `k+2`.
///
/// Fails with [`ConfigError::BadFrequencyBounds`] when the bounds are
/// degenerate for this sample rate or when some filter collapses onto
/// zero FFT bins (too few bins for the requested resolution).
pub fn compute_mel_filters(
    num_fft_bins: usize,
    num_mel_bins: usize,
    sample_rate: f32,
    lower_bound: f32,
    upper_bound: f32,
) -> Result<Vec<Vec<f32>>, ConfigError> {
    let nyquist = sample_rate / 2.0;
    if lower_bound < 0.0 || upper_bound <= lower_bound || upper_bound > nyquist {
        return Err(ConfigError::BadFrequencyBounds);
    }
    let mel_low = mel_scale(lower_bound);
    let mel_high = mel_scale(upper_bound);
    let mel_delta = (mel_high - mel_low) / (num_mel_bins + 1) as f32;

    // Center frequency of each spectrum bin. The FFT block has
    // 2 * (num_fft_bins - 1) samples, so bins are spaced
    // sample_rate / (2 * (num_fft_bins - 1)) Hz apart.
    let bin_width = sample_rate / (2 * (num_fft_bins - 1)) as f32;

    let mut weights = Vec::with_capacity(num_mel_bins);
    for k in 0..num_mel_bins {
        let left = mel_low + k as f32 * mel_delta;
        let center = left + mel_delta;
        let right = center + mel_delta;

        let mut filter = vec![0.0f32; num_fft_bins];
        let mut nonzero = false;
        for (bin, w) in filter.iter_mut().enumerate() {
            let mel = mel_scale(bin as f32 * bin_width);
            if mel > left && mel < right {
                *w = if mel <= center {
                    (mel - left) / (center - left)
                } else {
                    (right - mel) / (right - center)
                };
                nonzero = nonzero || *w > 0.0;
            }
        }
        if !nonzero {
            // The triangle fell between two FFT bins; the configuration
            // asks for more mel resolution than the FFT provides.
            return Err(ConfigError::BadFrequencyBounds);
        }
        weights.push(filter);
    }
    Ok(weights)
}
