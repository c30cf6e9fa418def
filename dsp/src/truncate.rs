//! Ping-window truncation: locate the pulse in a short (~300ms) post-sync buffer and extract the
//! `[start, end)` window that the correlator will operate on.

use crate::params::RuntimeParams;
use crate::sample::SampleFrame;
use crate::sync::REFERENCE_CHANNEL;

/// Outcome of a truncate call. Locating the ping is allowed to fail (the pulse may simply not be
/// in this buffer) -- that is not an error, just `located: false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TruncateResult {
    pub located: bool,
    pub start: usize,
    pub end: usize,
}

/// Locate the ping pulse in `buf`, sampled at `sampling_frequency_hz`, using `params.ping_threshold`
/// and the pre/post-ping durations to size the window around the crossing.
///
/// Per spec invariant 3: if `located`, then `0 <= start < end <= buf.len()`.
pub fn truncate(
    buf: &[SampleFrame],
    params: &RuntimeParams,
    sampling_frequency_hz: u32,
) -> TruncateResult {
    let n = buf.len();

    let crossing = buf
        .iter()
        .position(|frame| frame[REFERENCE_CHANNEL].unsigned_abs() > params.ping_threshold);

    let Some(i) = crossing else {
        return TruncateResult {
            located: false,
            start: 0,
            end: 0,
        };
    };

    let fs = sampling_frequency_hz as u64;
    let pre_samples = (fs * params.pre_ping_duration.ticks()
        / crate::clock::CPU_CLOCK_HZ) as usize;
    let post_samples = (fs * params.post_ping_duration.ticks()
        / crate::clock::CPU_CLOCK_HZ) as usize;

    let start = i.saturating_sub(pre_samples);
    let end_raw = (i + post_samples).min(n);
    let end = params.round_up_to_packet(end_raw).min(n);

    // Rounding up can only ever grow `end`; if that growth pushed it back up to `n` we're fine,
    // but guard the degenerate case where `start == end` (threshold crossing on the very last
    // sample with no post-window) by reporting not-located rather than an empty window.
    if end <= start {
        return TruncateResult {
            located: false,
            start: 0,
            end: 0,
        };
    }

    TruncateResult {
        located: true,
        start,
        end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Tick;

    fn frame(ref_value: i16) -> SampleFrame {
        [ref_value, 0, 0, 0]
    }

    fn params() -> RuntimeParams {
        let mut p = RuntimeParams::default();
        p.samples_per_packet = 8;
        p
    }

    #[test]
    fn not_located_when_no_crossing() {
        let buf = vec![frame(5); 256];
        let result = truncate(&buf, &params(), 5_000_000);
        assert!(!result.located);
    }

    #[test]
    fn locates_and_bounds_window() {
        let mut buf = vec![frame(5); 2048];
        buf[1000] = frame(2000);
        let result = truncate(&buf, &params(), 5_000_000);

        assert!(result.located);
        assert!(result.start < result.end);
        assert!(result.end <= buf.len());
        assert!(result.start <= 1000 && 1000 < result.end);
        // end is rounded to a multiple of samples_per_packet.
        assert_eq!(result.end % params().samples_per_packet as usize, 0);
    }

    #[test]
    fn start_clamps_at_zero_near_buffer_head() {
        let mut buf = vec![frame(5); 512];
        buf[0] = frame(2000);
        let result = truncate(&buf, &params(), 5_000_000);
        assert!(result.located);
        assert_eq!(result.start, 0);
    }

    #[test]
    fn end_clamps_at_buffer_length() {
        let mut buf = vec![frame(5); 512];
        buf[510] = frame(2000);
        let result = truncate(&buf, &params(), 5_000_000);
        assert!(result.located);
        assert!(result.end <= buf.len());
    }
}
