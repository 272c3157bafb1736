//! Typed configuration for the feature computers.
//!
//! Each options struct mirrors one tier of the pipeline and embeds the
//! options of the tier below it. Validation is exhaustive: once
//! `validate()` succeeds, constructing the corresponding computer cannot
//! fail with a configuration error.
//!
//! Higher tiers pin some flags of their embedded lower-tier options
//! (fbank always consumes raw power spectra, MFCC always consumes
//! log-mel energies). Those pinned values are *derived* here through
//! `inner_spectrogram_opts()` / `inner_fbank_opts()` instead of mutating
//! the caller's structs in place, so an options value always means what
//! it says.

use alloc::format;
use alloc::string::String;

use crate::window::WindowType;

/// Rejected configuration combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Sample rate must be positive.
    BadSampleRate,
    /// Frame length must be at least 2 samples, frame shift positive and
    /// no larger than the frame length.
    BadFrameGeometry,
    /// Pre-emphasis coefficient must lie in `[0, 1)`.
    BadPreemphCoeff,
    /// At least 3 mel bins are required for a usable filter bank.
    TooFewMelBins,
    /// Lower/upper frequency bounds are degenerate for this sample rate,
    /// or collapse some mel filter onto zero FFT bins.
    BadFrequencyBounds,
    /// Cepstral coefficient count must be in `[1, num_mel_bins]`.
    BadCepstralCount,
    /// Window name does not map to a known window type.
    UnknownWindow,
}

/// Frame segmentation and per-frame preprocessing settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOpts {
    /// Frame length in samples.
    pub frame_length: usize,
    /// Frame shift (hop) in samples.
    pub frame_shift: usize,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Window applied after pre-emphasis.
    pub window_type: WindowType,
    /// Pre-emphasis coefficient, `0.0` disables the filter.
    pub preemph_coeff: f32,
    /// Subtract the frame mean before pre-emphasis.
    pub remove_dc: bool,
}

impl Default for FrameOpts {
    fn default() -> Self {
        Self {
            frame_length: 400,
            frame_shift: 160,
            sample_rate: 16000,
            window_type: WindowType::Hamming,
            preemph_coeff: 0.97,
            remove_dc: true,
        }
    }
}

impl FrameOpts {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::BadSampleRate);
        }
        // A 1-sample frame has no spectrum; the FFT needs at least 2.
        if self.frame_length < 2
            || self.frame_shift == 0
            || self.frame_length < self.frame_shift
        {
            return Err(ConfigError::BadFrameGeometry);
        }
        if !(0.0..1.0).contains(&self.preemph_coeff) {
            return Err(ConfigError::BadPreemphCoeff);
        }
        Ok(())
    }

    /// Dump current settings in `--group.key=value` lines, the format an
    /// external option parser binds and serializes.
    pub fn config_string(&self) -> String {
        format!(
            "--frame.frame_length={}\n--frame.frame_shift={}\n\
             --frame.sample_rate={}\n--frame.preemph_coeff={}\n\
             --frame.remove_dc={}\n--frame.window={}\n",
            self.frame_length,
            self.frame_shift,
            self.sample_rate,
            self.preemph_coeff,
            self.remove_dc,
            self.window_type,
        )
    }
}

/// Spectrogram computer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramOpts {
    /// Emit log-spectrum instead of linear.
    pub apply_log: bool,
    /// Emit power spectrum instead of magnitude.
    pub apply_pow: bool,
    /// Replace coefficient 0 with the log of the raw frame energy.
    pub use_log_raw_energy: bool,
    pub frame_opts: FrameOpts,
}

impl Default for SpectrogramOpts {
    fn default() -> Self {
        Self {
            apply_log: true,
            apply_pow: true,
            use_log_raw_energy: true,
            frame_opts: FrameOpts::default(),
        }
    }
}

impl SpectrogramOpts {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.frame_opts.validate()
    }

    pub fn config_string(&self) -> String {
        format!(
            "{}--spectrogram.apply_log={}\n--spectrogram.apply_pow={}\n\
             --spectrogram.use_log_raw_energy={}\n",
            self.frame_opts.config_string(),
            self.apply_log,
            self.apply_pow,
            self.use_log_raw_energy,
        )
    }
}

/// Mel filterbank (fbank) computer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FbankOpts {
    /// Number of mel bins; this is the feature dimension.
    pub num_mel_bins: usize,
    /// Lower frequency bound in Hz.
    pub lower_bound: f32,
    /// Upper frequency bound in Hz; values `<= 0` mean an offset below
    /// Nyquist (`0` is Nyquist itself).
    pub upper_bound: f32,
    /// Log-compress the mel energies.
    pub apply_log: bool,
    pub spectrogram_opts: SpectrogramOpts,
}

impl Default for FbankOpts {
    fn default() -> Self {
        Self {
            num_mel_bins: 23,
            lower_bound: 20.0,
            upper_bound: 0.0,
            apply_log: true,
            spectrogram_opts: SpectrogramOpts::default(),
        }
    }
}

impl FbankOpts {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.spectrogram_opts.validate()?;
        if self.num_mel_bins < 3 {
            return Err(ConfigError::TooFewMelBins);
        }
        let frame_opts = &self.spectrogram_opts.frame_opts;
        let nyquist = frame_opts.sample_rate as f32 / 2.0;
        let upper = self.resolved_upper_bound();
        if self.lower_bound < 0.0 || upper <= self.lower_bound || upper > nyquist {
            return Err(ConfigError::BadFrequencyBounds);
        }
        // The FFT derived from the frame length must resolve every mel
        // filter onto at least one bin; run the same construction the
        // computer performs so a validated configuration cannot fail it.
        let padding = crate::round_up_to_power_of_two(frame_opts.frame_length);
        crate::mel::compute_mel_filters(
            padding / 2 + 1,
            self.num_mel_bins,
            frame_opts.sample_rate as f32,
            self.lower_bound,
            upper,
        )?;
        Ok(())
    }

    /// Upper bound in Hz with the `<= 0` offset-from-Nyquist rule applied.
    pub fn resolved_upper_bound(&self) -> f32 {
        if self.upper_bound > 0.0 {
            self.upper_bound
        } else {
            self.spectrogram_opts.frame_opts.sample_rate as f32 / 2.0 + self.upper_bound
        }
    }

    /// Options for the internally owned spectrogram computer: fbank
    /// always filters raw power spectra, so logging and energy
    /// substitution are pinned off.
    pub fn inner_spectrogram_opts(&self) -> SpectrogramOpts {
        SpectrogramOpts {
            apply_log: false,
            apply_pow: true,
            use_log_raw_energy: false,
            frame_opts: self.spectrogram_opts.frame_opts.clone(),
        }
    }

    pub fn config_string(&self) -> String {
        format!(
            "{}--fbank.num_mel_bins={}\n--fbank.lower_bound={}\n\
             --fbank.upper_bound={}\n--fbank.apply_log={}\n",
            self.spectrogram_opts.config_string(),
            self.num_mel_bins,
            self.lower_bound,
            self.upper_bound,
            self.apply_log,
        )
    }
}

/// MFCC computer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MfccOpts {
    /// Number of cepstral coefficients; this is the feature dimension.
    pub num_ceps: usize,
    /// Replace coefficient 0 with the log of the raw frame energy.
    pub use_energy: bool,
    /// Cepstral lifter parameter; `0.0` disables liftering.
    pub cepstral_lifter: f32,
    pub fbank_opts: FbankOpts,
}

impl Default for MfccOpts {
    fn default() -> Self {
        Self {
            num_ceps: 13,
            use_energy: true,
            cepstral_lifter: 22.0,
            fbank_opts: FbankOpts::default(),
        }
    }
}

impl MfccOpts {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fbank_opts.validate()?;
        if self.num_ceps < 1 || self.num_ceps > self.fbank_opts.num_mel_bins {
            return Err(ConfigError::BadCepstralCount);
        }
        Ok(())
    }

    /// Options for the internally owned fbank computer: MFCC always
    /// consumes log-mel energies derived from power spectra.
    pub fn inner_fbank_opts(&self) -> FbankOpts {
        let mut opts = self.fbank_opts.clone();
        opts.apply_log = true;
        opts.spectrogram_opts.apply_pow = true;
        opts
    }

    pub fn config_string(&self) -> String {
        format!(
            "{}--mfcc.num_ceps={}\n--mfcc.use_energy={}\n\
             --mfcc.cepstral_lifter={}\n",
            self.fbank_opts.config_string(),
            self.num_ceps,
            self.use_energy,
            self.cepstral_lifter,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(FrameOpts::default().validate(), Ok(()));
        assert_eq!(SpectrogramOpts::default().validate(), Ok(()));
        assert_eq!(FbankOpts::default().validate(), Ok(()));
        assert_eq!(MfccOpts::default().validate(), Ok(()));
    }

    #[test]
    fn bad_frame_geometry_is_rejected() {
        let opts = FrameOpts {
            frame_length: 100,
            frame_shift: 160,
            ..FrameOpts::default()
        };
        assert_eq!(opts.validate(), Err(ConfigError::BadFrameGeometry));
        let opts = FrameOpts {
            frame_shift: 0,
            ..FrameOpts::default()
        };
        assert_eq!(opts.validate(), Err(ConfigError::BadFrameGeometry));
        // A single-sample frame passes the shift ordering but has no
        // spectrum to compute.
        let opts = FrameOpts {
            frame_length: 1,
            frame_shift: 1,
            ..FrameOpts::default()
        };
        assert_eq!(opts.validate(), Err(ConfigError::BadFrameGeometry));
    }

    #[test]
    fn bad_sample_rate_is_rejected() {
        let opts = FrameOpts {
            sample_rate: 0,
            ..FrameOpts::default()
        };
        assert_eq!(opts.validate(), Err(ConfigError::BadSampleRate));
    }

    #[test]
    fn preemph_must_be_below_one() {
        for coeff in [1.0, 1.5, -0.1] {
            let opts = FrameOpts {
                preemph_coeff: coeff,
                ..FrameOpts::default()
            };
            assert_eq!(opts.validate(), Err(ConfigError::BadPreemphCoeff));
        }
        let opts = FrameOpts {
            preemph_coeff: 0.0,
            ..FrameOpts::default()
        };
        assert_eq!(opts.validate(), Ok(()));
    }

    #[test]
    fn mel_bin_count_floor() {
        let opts = FbankOpts {
            num_mel_bins: 2,
            ..FbankOpts::default()
        };
        assert_eq!(opts.validate(), Err(ConfigError::TooFewMelBins));
    }

    #[test]
    fn upper_bound_offsets_from_nyquist() {
        let opts = FbankOpts::default();
        assert_eq!(opts.resolved_upper_bound(), 8000.0);
        let opts = FbankOpts {
            upper_bound: -400.0,
            ..FbankOpts::default()
        };
        assert_eq!(opts.resolved_upper_bound(), 7600.0);
        let opts = FbankOpts {
            upper_bound: 4000.0,
            ..FbankOpts::default()
        };
        assert_eq!(opts.resolved_upper_bound(), 4000.0);
    }

    #[test]
    fn degenerate_bounds_are_rejected() {
        // Upper above Nyquist
        let opts = FbankOpts {
            upper_bound: 9000.0,
            ..FbankOpts::default()
        };
        assert_eq!(opts.validate(), Err(ConfigError::BadFrequencyBounds));
        // Bounds crossed
        let opts = FbankOpts {
            lower_bound: 5000.0,
            upper_bound: 4000.0,
            ..FbankOpts::default()
        };
        assert_eq!(opts.validate(), Err(ConfigError::BadFrequencyBounds));
    }

    #[test]
    fn mel_resolution_must_fit_the_fft() {
        // 8-sample frames give a 5-bin spectrum with 2 kHz bin spacing;
        // 23 mel filters between 20 Hz and Nyquist cannot all land on a
        // bin, so validation rejects what construction would reject.
        let opts = FbankOpts {
            spectrogram_opts: SpectrogramOpts {
                frame_opts: FrameOpts {
                    frame_length: 8,
                    frame_shift: 4,
                    ..FrameOpts::default()
                },
                ..SpectrogramOpts::default()
            },
            ..FbankOpts::default()
        };
        assert_eq!(opts.validate(), Err(ConfigError::BadFrequencyBounds));
    }

    #[test]
    fn cepstral_count_bounds() {
        let opts = MfccOpts {
            num_ceps: 0,
            ..MfccOpts::default()
        };
        assert_eq!(opts.validate(), Err(ConfigError::BadCepstralCount));
        let opts = MfccOpts {
            num_ceps: 24, // more rows than mel bins
            ..MfccOpts::default()
        };
        assert_eq!(opts.validate(), Err(ConfigError::BadCepstralCount));
    }

    #[test]
    fn inner_opts_are_normalized_without_touching_caller_state() {
        let fbank = FbankOpts::default();
        let inner = fbank.inner_spectrogram_opts();
        assert!(!inner.apply_log);
        assert!(!inner.use_log_raw_energy);
        assert!(inner.apply_pow);
        // Caller's embedded opts keep their own values.
        assert!(fbank.spectrogram_opts.apply_log);

        let mfcc = MfccOpts {
            fbank_opts: FbankOpts {
                apply_log: false,
                ..FbankOpts::default()
            },
            ..MfccOpts::default()
        };
        let inner = mfcc.inner_fbank_opts();
        assert!(inner.apply_log);
        assert!(inner.spectrogram_opts.apply_pow);
        assert!(!mfcc.fbank_opts.apply_log);
    }

    #[test]
    fn config_string_nests_all_tiers() {
        let dump = MfccOpts::default().config_string();
        assert!(dump.contains("--frame.frame_length=400"));
        assert!(dump.contains("--frame.window=hamming"));
        assert!(dump.contains("--spectrogram.apply_pow=true"));
        assert!(dump.contains("--fbank.num_mel_bins=23"));
        assert!(dump.contains("--mfcc.num_ceps=13"));
    }
}
