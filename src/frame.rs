//! Stateful online/batch frame splitting.
//!
//! The splitter views the stream as `carried tail ++ current signal` and
//! cuts fixed-length, fixed-shift frames out of it. Samples past the
//! last complete frame are carried into the next call, so repeated
//! incremental calls over a growing stream produce exactly the frames a
//! single batch call over the concatenated signal would.
//!
//! Per-frame processing order (fixed, tested): copy samples, remove DC
//! offset (frame mean), record raw energy, pre-emphasize, window.

use alloc::vec::Vec;
use log::warn;

use crate::config::{ConfigError, FrameOpts};
use crate::window::{compute_window, preemphasize, WindowType};

/// Online/batch framer carrying unconsumed trailing samples across calls.
///
/// Carry-over state advances when the last frame index of a call is
/// fetched, so within one call frame indices must be visited in
/// increasing order (the generic feature driver does). [`reset`] starts
/// a logically new stream.
///
/// [`reset`]: FrameSplitter::reset
pub struct FrameSplitter {
    opts: FrameOpts,
    /// Window coefficients; `None` for [`WindowType::None`].
    window: Option<Vec<f32>>,
    /// Unconsumed samples from previous calls, always shorter than one
    /// frame once at least one frame has been produced.
    tail: Vec<f32>,
}

impl FrameSplitter {
    pub fn new(opts: FrameOpts) -> Result<Self, ConfigError> {
        opts.validate()?;
        let window = match opts.window_type {
            WindowType::None => None,
            other => Some(compute_window(opts.frame_length, other)),
        };
        let capacity = opts.frame_length * 2;
        Ok(Self {
            opts,
            window,
            tail: Vec::with_capacity(capacity),
        })
    }

    /// Discard carried samples; the next call starts a fresh stream.
    pub fn reset(&mut self) {
        self.tail.clear();
    }

    pub fn frame_length(&self) -> usize {
        self.opts.frame_length
    }

    pub fn frame_shift(&self) -> usize {
        self.opts.frame_shift
    }

    pub fn sample_rate(&self) -> u32 {
        self.opts.sample_rate
    }

    /// Smallest power of two >= frame length; the FFT transform size.
    pub fn padding_length(&self) -> usize {
        crate::round_up_to_power_of_two(self.opts.frame_length)
    }

    /// Number of complete frames available from the carried tail plus
    /// `num_samples` new samples.
    ///
    /// Returns 0 (with a warning) when that is less than one frame's
    /// worth; callers must check before indexing.
    pub fn num_frames(&self, num_samples: usize) -> usize {
        let virtual_len = self.tail.len() + num_samples;
        if virtual_len < self.opts.frame_length {
            warn!(
                "number of samples is less than the frame length, {} vs {}",
                virtual_len, self.opts.frame_length
            );
            return 0;
        }
        (virtual_len - self.opts.frame_length) / self.opts.frame_shift + 1
    }

    /// Copy frame `index` of the current call into `frame[..frame_length]`
    /// and apply DC removal, pre-emphasis, and the window.
    ///
    /// `raw_energy`, when present, receives the frame's sum of squared
    /// samples taken after DC removal but before pre-emphasis and
    /// windowing.
    ///
    /// Fetching the last valid index consumes the call's samples and
    /// re-derives the carried tail.
    ///
    /// # Panics
    /// `index` must be below [`num_frames`], and `frame` must hold at
    /// least `frame_length` samples.
    ///
    /// [`num_frames`]: FrameSplitter::num_frames
    pub fn frame_for_index(
        &mut self,
        signal: &[f32],
        index: usize,
        frame: &mut [f32],
        raw_energy: Option<&mut f32>,
    ) {
        let num_frames = self.num_frames(signal.len());
        assert!(
            index < num_frames,
            "frame index {} out of range, only {} frames available",
            index,
            num_frames
        );
        let len = self.opts.frame_length;
        assert!(
            frame.len() >= len,
            "frame buffer of {} samples cannot hold a {}-sample frame",
            frame.len(),
            len
        );
        let start = index * self.opts.frame_shift;

        // Stitch the frame out of the carried tail and the new signal.
        if start >= self.tail.len() {
            let s = start - self.tail.len();
            frame[..len].copy_from_slice(&signal[s..s + len]);
        } else {
            let from_tail = (self.tail.len() - start).min(len);
            frame[..from_tail].copy_from_slice(&self.tail[start..start + from_tail]);
            frame[from_tail..len].copy_from_slice(&signal[..len - from_tail]);
        }

        let frame = &mut frame[..len];
        if self.opts.remove_dc {
            let mean = frame.iter().sum::<f32>() / len as f32;
            for x in frame.iter_mut() {
                *x -= mean;
            }
        }
        if let Some(energy) = raw_energy {
            *energy = frame.iter().map(|x| x * x).sum();
        }
        if self.opts.preemph_coeff > 0.0 {
            preemphasize(frame, self.opts.preemph_coeff);
        }
        if let Some(window) = &self.window {
            for (x, w) in frame.iter_mut().zip(window.iter()) {
                *x *= w;
            }
        }

        if index + 1 == num_frames {
            self.advance(signal, num_frames);
        }
    }

    /// Batch convenience: write every available frame into `dest`, frame
    /// `t` at offset `stride * t`. Returns the number of frames written.
    ///
    /// A chunk too short to produce any frame is absorbed into the
    /// carried tail, so feeding arbitrarily small chunks through this
    /// method loses no samples.
    ///
    /// # Panics
    /// `stride` must be at least the frame length, and `dest` must hold
    /// `stride * num_frames` samples.
    pub fn frame(&mut self, signal: &[f32], dest: &mut [f32], stride: usize) -> usize {
        let len = self.opts.frame_length;
        assert!(
            stride >= len,
            "stride {} is smaller than the frame length {}",
            stride,
            len
        );
        let num_frames = self.num_frames(signal.len());
        if num_frames == 0 {
            self.tail.extend_from_slice(signal);
            return 0;
        }
        for t in 0..num_frames {
            let row = &mut dest[stride * t..stride * t + len];
            self.frame_for_index(signal, t, row, None);
        }
        num_frames
    }

    /// Fold the consumed samples out of the stream and keep the trailing
    /// remainder for the next call.
    fn advance(&mut self, signal: &[f32], num_frames: usize) {
        let consumed = num_frames * self.opts.frame_shift;
        debug_assert!(consumed <= self.tail.len() + signal.len());
        if consumed >= self.tail.len() {
            let s = consumed - self.tail.len();
            self.tail.clear();
            self.tail.extend_from_slice(&signal[s..]);
        } else {
            self.tail.drain(..consumed);
            self.tail.extend_from_slice(signal);
        }
    }
}
