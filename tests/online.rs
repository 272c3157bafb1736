//! Online/incremental extraction must match batch extraction.

use melfront::{
    compute_feature, Computer, FbankComputer, FbankOpts, FrameOpts, FrameSplitter, MfccComputer,
    MfccOpts, SpectrogramOpts, WindowType,
};
use proptest::prelude::*;

fn small_frame_opts() -> FrameOpts {
    FrameOpts {
        frame_length: 64,
        frame_shift: 25,
        sample_rate: 8000,
        window_type: WindowType::Hamming,
        preemph_coeff: 0.97,
        remove_dc: true,
    }
}

fn small_fbank_opts() -> FbankOpts {
    FbankOpts {
        num_mel_bins: 8,
        lower_bound: 20.0,
        upper_bound: 0.0,
        apply_log: true,
        spectrogram_opts: SpectrogramOpts {
            frame_opts: small_frame_opts(),
            ..SpectrogramOpts::default()
        },
    }
}

fn noisy_signal(len: usize, seed: u32) -> Vec<f32> {
    // Deterministic pseudo-noise, enough structure to exercise every path.
    let mut state = seed.wrapping_mul(2654435761).max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

/// Drive a computer chunk-by-chunk, appending each chunk's frames.
fn extract_incrementally<C: Computer>(
    computer: &mut C,
    signal: &[f32],
    chunk_len: usize,
) -> Vec<f32> {
    let dim = computer.feature_dim();
    let mut out = Vec::new();
    for chunk in signal.chunks(chunk_len) {
        let frames = computer.num_frames(chunk.len());
        let mut buf = vec![0.0f32; frames * dim];
        let written = compute_feature(computer, chunk, &mut buf, dim);
        assert_eq!(written, frames);
        out.extend_from_slice(&buf);
    }
    out
}

fn extract_batch<C: Computer>(computer: &mut C, signal: &[f32]) -> Vec<f32> {
    let dim = computer.feature_dim();
    let frames = computer.num_frames(signal.len());
    let mut buf = vec![0.0f32; frames * dim];
    assert_eq!(compute_feature(computer, signal, &mut buf, dim), frames);
    buf
}

#[test]
fn fbank_streaming_matches_batch() {
    let _ = env_logger::builder().is_test(true).try_init();
    let signal = noisy_signal(2000, 7);
    let opts = small_fbank_opts();

    let mut batch = FbankComputer::new(&opts).unwrap();
    let expected = extract_batch(&mut batch, &signal);

    // Chunks at least one frame long, so every call produces frames.
    for chunk_len in [64, 100, 333, 1999] {
        let mut online = FbankComputer::new(&opts).unwrap();
        let got = extract_incrementally(&mut online, &signal, chunk_len);
        assert_eq!(got, expected, "chunk length {}", chunk_len);
    }
}

#[test]
fn mfcc_streaming_matches_batch() {
    let signal = noisy_signal(1500, 42);
    let opts = MfccOpts {
        num_ceps: 8,
        fbank_opts: small_fbank_opts(),
        ..MfccOpts::default()
    };

    let mut batch = MfccComputer::new(&opts).unwrap();
    let expected = extract_batch(&mut batch, &signal);

    let mut online = MfccComputer::new(&opts).unwrap();
    let got = extract_incrementally(&mut online, &signal, 250);
    assert_eq!(got, expected);
}

#[test]
fn reset_restarts_the_stream() {
    let signal = noisy_signal(1000, 3);
    let opts = small_fbank_opts();

    let mut computer = FbankComputer::new(&opts).unwrap();
    let first = extract_batch(&mut computer, &signal);
    // Without reset the carried tail would shift every subsequent frame.
    computer.reset();
    let second = extract_batch(&mut computer, &signal);
    assert_eq!(first, second);

    let mut fresh = FbankComputer::new(&opts).unwrap();
    let from_fresh = extract_batch(&mut fresh, &signal);
    assert_eq!(first, from_fresh);
}

proptest! {
    /// Splitting a signal into two incremental calls yields exactly the
    /// batch frames, sample for sample, for arbitrary split points at
    /// least one frame into the signal.
    #[test]
    fn incremental_framing_matches_batch(
        len in 200usize..1200,
        split_frac in 0.1f64..0.9,
        seed in 0u32..1000,
    ) {
        let opts = small_frame_opts();
        let signal = noisy_signal(len, seed);
        let split = (opts.frame_length as f64
            + split_frac * (len - opts.frame_length) as f64) as usize;
        prop_assume!(split < len);

        let frame_length = opts.frame_length;
        let mut batch = FrameSplitter::new(opts.clone()).unwrap();
        let total = batch.num_frames(len);
        let mut expected = vec![0.0f32; total * frame_length];
        prop_assert_eq!(batch.frame(&signal, &mut expected, frame_length), total);

        let mut online = FrameSplitter::new(opts).unwrap();
        let mut got = vec![0.0f32; total * frame_length];
        let n1 = online.frame(&signal[..split], &mut got, frame_length);
        let n2 = online.frame(
            &signal[split..],
            &mut got[n1 * frame_length..],
            frame_length,
        );
        prop_assert_eq!(n1 + n2, total);
        prop_assert_eq!(got, expected);
    }

    /// The frame-count formula holds across the valid geometry range.
    #[test]
    fn frame_count_formula_holds(
        frame_length in 2usize..200,
        shift_frac in 0.1f64..1.0,
        num_samples in 0usize..2000,
    ) {
        let frame_shift = ((frame_length as f64 * shift_frac) as usize).max(1);
        let opts = FrameOpts {
            frame_length,
            frame_shift,
            sample_rate: 16000,
            window_type: WindowType::None,
            preemph_coeff: 0.0,
            remove_dc: false,
        };
        let splitter = FrameSplitter::new(opts).unwrap();
        let expected = if num_samples < frame_length {
            0
        } else {
            (num_samples - frame_length) / frame_shift + 1
        };
        prop_assert_eq!(splitter.num_frames(num_samples), expected);
    }
}
