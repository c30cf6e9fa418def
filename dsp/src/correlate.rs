//! Fractional-delay cross-correlation: the numerically hardest stage of the pipeline.
//!
//! For each non-reference channel, computes the discrete cross-correlation against channel 0
//! over a bounded lag window, finds the integer-lag peak, refines it to sub-sample precision by
//! parabolic interpolation, and converts the result to nanoseconds.

use crate::sample::{DspError, SampleFrame, NUM_CHANNELS};
use crate::sync::REFERENCE_CHANNEL;

/// Array baseline used only to bound the physically plausible lag search window -- not a
/// precision input to the delay estimate itself. Supplements the distilled spec, which leaves
/// the array geometry unspecified; see DESIGN.md.
pub const ARRAY_BASELINE_M: f64 = 0.25;
pub const SPEED_OF_SOUND_WATER_MPS: f64 = 1480.0;
/// Extra samples of slack added to the geometric bound, since the constants above are nominal.
pub const GUARD_SAMPLES: usize = 8;

/// Number of channels correlated against the reference (all but channel 0).
const NON_REFERENCE_CHANNELS: usize = NUM_CHANNELS - 1;

/// The maximum plausible inter-channel lag, in samples, at a given sampling frequency.
pub fn max_lag_samples(sampling_frequency_hz: u32) -> usize {
    let geometric =
        (sampling_frequency_hz as f64 * ARRAY_BASELINE_M / SPEED_OF_SOUND_WATER_MPS).ceil();
    geometric as usize + GUARD_SAMPLES
}

/// Number of lag bins (`2*max_lag + 1`) produced for a given sampling frequency.
pub fn lag_bin_count(sampling_frequency_hz: u32) -> usize {
    2 * max_lag_samples(sampling_frequency_hz) + 1
}

/// Minimum `xcorr_buf` length (4 channels interleaved per lag bin) for a given sampling frequency.
pub fn required_capacity(sampling_frequency_hz: u32) -> usize {
    NUM_CHANNELS * lag_bin_count(sampling_frequency_hz)
}

/// Per-channel inter-hydrophone delays and bookkeeping metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationResult {
    /// `channel_delay_ns[k-1]` is channel `k`'s delay relative to channel 0, in nanoseconds.
    pub channel_delay_ns: [i32; NON_REFERENCE_CHANNELS],
    /// Sample index of the reference channel's peak magnitude within `ping`.
    pub reference_peak_index: usize,
    pub sampling_frequency_hz: u32,
}

/// Compute the cross-correlation of `ping`'s reference channel against each other channel.
///
/// `xcorr_buf` receives the full correlation buffer: `lag_bin_count(fs)` frames of 4
/// channel-interleaved `f32` values, lag-ordered from `-max_lag` to `+max_lag`. Returns the
/// result record and the number of lag bins written (`m`).
pub fn cross_correlate(
    ping: &[SampleFrame],
    xcorr_buf: &mut [f32],
    sampling_frequency_hz: u32,
) -> Result<(CorrelationResult, usize), DspError> {
    let l = ping.len();
    if l < 2 {
        return Err(DspError::InsufficientSamples);
    }

    let max_lag = max_lag_samples(sampling_frequency_hz) as isize;
    let m = (2 * max_lag + 1) as usize;
    if xcorr_buf.len() < NUM_CHANNELS * m {
        return Err(DspError::CapacityExceeded);
    }

    // Compute C_k[tau] for every channel (0 = reference autocorrelation, 1..=3 = cross-correlation)
    // directly into the caller-provided, lag-ordered/channel-interleaved buffer.
    for (lag_idx, lag) in (-max_lag..=max_lag).enumerate() {
        let mut sums = [0.0f64; NUM_CHANNELS];
        let t_start = if lag < 0 { (-lag) as usize } else { 0 };
        let t_end = if lag > 0 {
            l.saturating_sub(lag as usize)
        } else {
            l
        };

        for t in t_start..t_end {
            let shifted = (t as isize + lag) as usize;
            let reference = ping[t][REFERENCE_CHANNEL] as f64;
            for ch in 0..NUM_CHANNELS {
                sums[ch] += reference * ping[shifted][ch] as f64;
            }
        }

        for ch in 0..NUM_CHANNELS {
            xcorr_buf[lag_idx * NUM_CHANNELS + ch] = sums[ch] as f32;
        }
    }

    let mut channel_delay_ns = [0i32; NON_REFERENCE_CHANNELS];
    for ch in 1..NUM_CHANNELS {
        let peak_idx = (0..m)
            .max_by(|&a, &b| {
                let va = xcorr_buf[a * NUM_CHANNELS + ch];
                let vb = xcorr_buf[b * NUM_CHANNELS + ch];
                va.partial_cmp(&vb).unwrap()
            })
            .unwrap();

        let tau_star = peak_idx as isize - max_lag;

        let delta = if peak_idx == 0 || peak_idx == m - 1 {
            0.0
        } else {
            let c_minus = xcorr_buf[(peak_idx - 1) * NUM_CHANNELS + ch] as f64;
            let c_zero = xcorr_buf[peak_idx * NUM_CHANNELS + ch] as f64;
            let c_plus = xcorr_buf[(peak_idx + 1) * NUM_CHANNELS + ch] as f64;
            let denom = c_minus - 2.0 * c_zero + c_plus;
            if denom == 0.0 {
                0.0
            } else {
                0.5 * (c_minus - c_plus) / denom
            }
        };

        let delay_samples = tau_star as f64 + delta;
        let delay_ns = delay_samples * 1.0e9 / sampling_frequency_hz as f64;
        channel_delay_ns[ch - 1] = delay_ns.round() as i32;
    }

    let reference_peak_index = ping
        .iter()
        .enumerate()
        .max_by_key(|(_, frame)| frame[REFERENCE_CHANNEL].unsigned_abs())
        .map(|(i, _)| i)
        .unwrap_or(0);

    Ok((
        CorrelationResult {
            channel_delay_ns,
            reference_peak_index,
            sampling_frequency_hz,
        },
        m,
    ))
}
