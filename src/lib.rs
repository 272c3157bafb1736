//! # melfront - streaming acoustic front-end
//!
//! Turns a raw audio sample stream into frame-synchronous feature vectors
//! (linear/log spectrogram, log-mel filterbank, MFCC) following Kaldi's
//! numeric conventions. Works on whole utterances and chunk-by-chunk
//! (e.g. microphone streaming): the frame splitter carries unconsumed
//! trailing samples across calls, so incremental extraction produces the
//! same frames as one batch call over the full signal.
//!
//! ## Layout
//!
//! - [`config`]: typed option structs with validation and text dumps
//! - [`window`]: window coefficient generation and pre-emphasis
//! - [`fft`]: fixed-size real FFT engine with Kaldi-style packed output
//! - [`mel`]: triangular mel filter-bank construction
//! - [`dct`]: truncated orthonormal DCT-II basis and cepstral liftering
//! - [`frame`]: stateful online/batch frame splitter
//! - [`feature`]: the three feature computers and the generic driver
//!
//! ## Example
//!
//! ```
//! use melfront::{compute_feature, Computer, FbankComputer, FbankOpts};
//!
//! let opts = FbankOpts::default();
//! let mut fbank = FbankComputer::new(&opts).unwrap();
//! let signal = vec![0.0f32; 16000];
//! let dim = fbank.feature_dim();
//! let mut feats = vec![0.0f32; fbank.num_frames(signal.len()) * dim];
//! let frames = compute_feature(&mut fbank, &signal, &mut feats, dim);
//! assert_eq!(frames * dim, feats.len());
//! ```
//!
//! ## Cargo features
//!
//! - `std` (default): standard library support. Without it the crate is
//!   `no_std` + `alloc`; all transcendental math goes through `libm`
//!   either way, so results are identical across targets.

#![no_std]
extern crate alloc;

pub mod config;
pub mod dct;
pub mod feature;
pub mod fft;
pub mod frame;
pub mod mel;
pub mod window;

pub use config::{ConfigError, FbankOpts, FrameOpts, MfccOpts, SpectrogramOpts};
pub use feature::{
    compute_feature, Computer, FbankComputer, MfccComputer, SpectrogramComputer,
};
pub use frame::FrameSplitter;
pub use window::WindowType;

/// Floor applied before every logarithm in the pipeline.
///
/// Spectrum values, mel energies, and raw frame energies are clamped to
/// this value prior to `ln`, so an all-zero signal yields `EPS.ln()`
/// everywhere instead of `-inf` or `NaN`.
pub const EPS: f32 = f32::EPSILON;

/// Smallest power of two greater than or equal to `n`.
///
/// This is the FFT transform size a frame of `n` samples is zero-padded
/// into.
pub fn round_up_to_power_of_two(n: usize) -> usize {
    n.next_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_length_of_common_frame_sizes() {
        assert_eq!(round_up_to_power_of_two(400), 512);
        assert_eq!(round_up_to_power_of_two(256), 256);
        assert_eq!(round_up_to_power_of_two(257), 512);
        assert_eq!(round_up_to_power_of_two(1), 1);
    }

    #[test]
    fn log_floor_is_finite() {
        assert!(libm::logf(EPS).is_finite());
    }
}
