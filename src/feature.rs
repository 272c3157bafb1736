//! Frame-synchronous feature computers and the generic extraction driver.
//!
//! The three tiers form an explicit composition chain: [`FbankComputer`]
//! owns a concrete [`SpectrogramComputer`] and [`MfccComputer`] owns a
//! concrete [`FbankComputer`]. Inner calls are direct; the [`Computer`]
//! trait exists only so [`compute_feature`] can drive any tier through
//! one monomorphized loop.
//!
//! Each computer owns scratch buffers that are allocated once at
//! construction and mutated on every frame, so a single instance must
//! not be shared across threads without external synchronization. The
//! derived tables (window, mel weights, DCT matrix, lifter) are
//! immutable after construction.

use alloc::vec;
use alloc::vec::Vec;
use libm::logf;

use crate::config::{ConfigError, FbankOpts, MfccOpts, SpectrogramOpts};
use crate::dct::{compute_dct_matrix, compute_lifter_coeffs};
use crate::fft::{compute_spectrum, FftComputer};
use crate::frame::FrameSplitter;
use crate::mel::compute_mel_filters;
use crate::EPS;

/// Capability set shared by all feature computers.
///
/// `compute_frame` writes the feature vector for frame `t` into
/// `dest[..feature_dim()]` and returns the frame's raw energy, which
/// higher tiers use for log-energy substitution. Frames of one call
/// must be computed in increasing order of `t` (the online framing
/// state advances on the last frame; see [`FrameSplitter`]).
pub trait Computer {
    fn compute_frame(&mut self, signal: &[f32], t: usize, dest: &mut [f32]) -> f32;

    /// Length of one feature vector; constant for the instance's lifetime.
    fn feature_dim(&self) -> usize;

    /// Frames available from `num_samples` new samples plus carried state.
    fn num_frames(&self, num_samples: usize) -> usize;

    /// Drop online framing state to start a new stream.
    fn reset(&mut self);
}

/// Walk `computer` across `signal`, writing the feature vector of frame
/// `t` at `dest[stride * t..]`. Returns the number of frames written
/// (0, with a warning from the splitter, when the signal is too short).
///
/// # Panics
/// `stride` must be at least `computer.feature_dim()`, and `dest` must
/// hold `stride * num_frames` values.
pub fn compute_feature<C: Computer>(
    computer: &mut C,
    signal: &[f32],
    dest: &mut [f32],
    stride: usize,
) -> usize {
    let dim = computer.feature_dim();
    assert!(
        stride >= dim,
        "stride {} is smaller than the feature dimension {}",
        stride,
        dim
    );
    let num_frames = computer.num_frames(signal.len());
    for t in 0..num_frames {
        let row = &mut dest[stride * t..stride * t + dim];
        computer.compute_frame(signal, t, row);
    }
    num_frames
}

/// First tier: windowed, pre-emphasized frames through a padded real FFT
/// into a magnitude/power (optionally log) spectrum.
pub struct SpectrogramComputer {
    apply_pow: bool,
    apply_log: bool,
    use_log_raw_energy: bool,
    padding_length: usize,
    splitter: FrameSplitter,
    fft: FftComputer,
    /// Holds the zero-padded frame, then the packed FFT output.
    realfft_cache: Vec<f32>,
}

impl SpectrogramComputer {
    pub fn new(opts: &SpectrogramOpts) -> Result<Self, ConfigError> {
        opts.validate()?;
        let splitter = FrameSplitter::new(opts.frame_opts.clone())?;
        let padding_length = splitter.padding_length();
        Ok(Self {
            apply_pow: opts.apply_pow,
            apply_log: opts.apply_log,
            use_log_raw_energy: opts.use_log_raw_energy,
            padding_length,
            splitter,
            fft: FftComputer::new(padding_length),
            realfft_cache: vec![0.0; padding_length],
        })
    }

    /// FFT transform size (smallest power of two >= frame length).
    pub fn padding_length(&self) -> usize {
        self.padding_length
    }
}

impl Computer for SpectrogramComputer {
    fn compute_frame(&mut self, signal: &[f32], t: usize, dest: &mut [f32]) -> f32 {
        let dim = self.feature_dim();
        assert!(
            dest.len() >= dim,
            "destination of {} values cannot hold a {}-dim spectrum",
            dest.len(),
            dim
        );
        let frame_length = self.splitter.frame_length();
        let mut raw_energy = 0.0f32;
        self.splitter.frame_for_index(
            signal,
            t,
            &mut self.realfft_cache[..frame_length],
            Some(&mut raw_energy),
        );
        for x in self.realfft_cache[frame_length..].iter_mut() {
            *x = 0.0;
        }
        self.fft.transform_real(&mut self.realfft_cache);
        compute_spectrum(
            &self.realfft_cache,
            &mut dest[..dim],
            self.apply_pow,
            self.apply_log,
        );
        if self.use_log_raw_energy {
            dest[0] = logf(raw_energy.max(EPS));
        }
        raw_energy
    }

    fn feature_dim(&self) -> usize {
        self.padding_length / 2 + 1
    }

    fn num_frames(&self, num_samples: usize) -> usize {
        self.splitter.num_frames(num_samples)
    }

    fn reset(&mut self) {
        self.splitter.reset();
    }
}

/// Second tier: mel filter bank over raw power spectra, optionally
/// log-compressed.
pub struct FbankComputer {
    num_bins: usize,
    apply_log: bool,
    /// One weight vector per mel bin over the spectrum index range.
    mel_weights: Vec<Vec<f32>>,
    spectrum_cache: Vec<f32>,
    spectrogram: SpectrogramComputer,
}

impl FbankComputer {
    pub fn new(opts: &FbankOpts) -> Result<Self, ConfigError> {
        opts.validate()?;
        // The inner spectrogram always emits raw, unlogged power spectra.
        let spectrogram = SpectrogramComputer::new(&opts.inner_spectrogram_opts())?;
        let mel_weights = compute_mel_filters(
            spectrogram.feature_dim(),
            opts.num_mel_bins,
            opts.spectrogram_opts.frame_opts.sample_rate as f32,
            opts.lower_bound,
            opts.resolved_upper_bound(),
        )?;
        Ok(Self {
            num_bins: opts.num_mel_bins,
            apply_log: opts.apply_log,
            mel_weights,
            spectrum_cache: vec![0.0; spectrogram.feature_dim()],
            spectrogram,
        })
    }
}

impl Computer for FbankComputer {
    fn compute_frame(&mut self, signal: &[f32], t: usize, dest: &mut [f32]) -> f32 {
        assert!(
            dest.len() >= self.num_bins,
            "destination of {} values cannot hold {} mel bins",
            dest.len(),
            self.num_bins
        );
        let raw_energy = self
            .spectrogram
            .compute_frame(signal, t, &mut self.spectrum_cache);
        for (out, weights) in dest[..self.num_bins].iter_mut().zip(self.mel_weights.iter()) {
            let mut energy = 0.0f32;
            for (w, s) in weights.iter().zip(self.spectrum_cache.iter()) {
                energy += w * s;
            }
            *out = if self.apply_log {
                logf(energy.max(EPS))
            } else {
                energy
            };
        }
        raw_energy
    }

    fn feature_dim(&self) -> usize {
        self.num_bins
    }

    fn num_frames(&self, num_samples: usize) -> usize {
        self.spectrogram.num_frames(num_samples)
    }

    fn reset(&mut self) {
        self.spectrogram.reset();
    }
}

/// Third tier: truncated DCT over log-mel energies, optional log-energy
/// substitution for coefficient 0, cepstral liftering.
pub struct MfccComputer {
    num_ceps: usize,
    use_energy: bool,
    /// Row-major, `num_ceps` rows by `num_mel_bins` columns.
    dct_matrix: Vec<f32>,
    lifter_coeffs: Vec<f32>,
    mel_energy_cache: Vec<f32>,
    fbank: FbankComputer,
}

impl MfccComputer {
    pub fn new(opts: &MfccOpts) -> Result<Self, ConfigError> {
        opts.validate()?;
        // The inner fbank always emits log-mel energies of power spectra.
        let fbank = FbankComputer::new(&opts.inner_fbank_opts())?;
        let num_bins = fbank.feature_dim();
        Ok(Self {
            num_ceps: opts.num_ceps,
            use_energy: opts.use_energy,
            dct_matrix: compute_dct_matrix(opts.num_ceps, num_bins),
            lifter_coeffs: compute_lifter_coeffs(opts.num_ceps, opts.cepstral_lifter),
            mel_energy_cache: vec![0.0; num_bins],
            fbank,
        })
    }
}

impl Computer for MfccComputer {
    fn compute_frame(&mut self, signal: &[f32], t: usize, dest: &mut [f32]) -> f32 {
        assert!(
            dest.len() >= self.num_ceps,
            "destination of {} values cannot hold {} cepstral coefficients",
            dest.len(),
            self.num_ceps
        );
        let raw_energy = self
            .fbank
            .compute_frame(signal, t, &mut self.mel_energy_cache);
        let num_bins = self.mel_energy_cache.len();
        for (r, out) in dest[..self.num_ceps].iter_mut().enumerate() {
            let row = &self.dct_matrix[r * num_bins..(r + 1) * num_bins];
            let mut sum = 0.0f32;
            for (d, m) in row.iter().zip(self.mel_energy_cache.iter()) {
                sum += d * m;
            }
            *out = sum;
        }
        if self.use_energy {
            dest[0] = logf(raw_energy.max(EPS));
        }
        for (x, lifter) in dest[..self.num_ceps].iter_mut().zip(self.lifter_coeffs.iter()) {
            *x *= lifter;
        }
        raw_energy
    }

    fn feature_dim(&self) -> usize {
        self.num_ceps
    }

    fn num_frames(&self, num_samples: usize) -> usize {
        self.fbank.num_frames(num_samples)
    }

    fn reset(&mut self) {
        self.fbank.reset();
    }
}
