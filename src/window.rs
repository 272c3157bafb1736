//! Window functions and pre-emphasis for frame-based feature extraction.
//!
//! Window coefficients use the `N-1` denominator convention so that the
//! taper reaches its endpoints exactly, matching the numeric behaviour of
//! the Kaldi toolchain rather than the periodic `N` variant.

use alloc::vec;
use alloc::vec::Vec;
use core::f32::consts::PI;
use core::str::FromStr;
use libm::cosf;

use crate::config::ConfigError;

/// Named window laws understood by the frame splitter.
///
/// `None` means "no window is applied at all" (the splitter skips the
/// multiply); `Rectangular` is an explicit all-ones window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    None,
    Rectangular,
    #[default]
    Hamming,
    Hanning,
    Blackman,
}

impl WindowType {
    /// Canonical lowercase name, the inverse of [`WindowType::from_str`].
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowType::None => "none",
            WindowType::Rectangular => "rectangular",
            WindowType::Hamming => "hamming",
            WindowType::Hanning => "hanning",
            WindowType::Blackman => "blackman",
        }
    }
}

impl FromStr for WindowType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s {
            "none" => Ok(WindowType::None),
            "rectangular" => Ok(WindowType::Rectangular),
            "hamming" => Ok(WindowType::Hamming),
            "hanning" => Ok(WindowType::Hanning),
            "blackman" => Ok(WindowType::Blackman),
            _ => Err(ConfigError::UnknownWindow),
        }
    }
}

impl core::fmt::Display for WindowType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fill a window of `len` coefficients with the named law.
///
/// `None` and `Rectangular` produce all ones. A window of length 0 or 1
/// is all ones as well (there is no taper to speak of).
pub fn compute_window(len: usize, window_type: WindowType) -> Vec<f32> {
    let mut out = vec![1.0f32; len];
    if len < 2 {
        return out;
    }
    let a = 2.0 * PI / (len - 1) as f32;
    for (i, w) in out.iter_mut().enumerate() {
        let x = i as f32;
        *w = match window_type {
            WindowType::None | WindowType::Rectangular => 1.0,
            WindowType::Hamming => 0.54 - 0.46 * cosf(a * x),
            WindowType::Hanning => 0.5 - 0.5 * cosf(a * x),
            WindowType::Blackman => 0.42 - 0.5 * cosf(a * x) + 0.08 * cosf(2.0 * a * x),
        };
    }
    out
}

/// First-order high-pass filter applied in place to one frame.
///
/// Runs from the top index downward so each sample still sees its
/// unfiltered predecessor; the first sample is filtered against itself
/// (`x[0] -= coeff * x[0]`, the Kaldi convention).
pub fn preemphasize(frame: &mut [f32], coeff: f32) {
    if coeff == 0.0 {
        return;
    }
    for i in (1..frame.len()).rev() {
        frame[i] -= coeff * frame[i - 1];
    }
    if let Some(x0) = frame.first_mut() {
        *x0 -= coeff * *x0;
    }
}
