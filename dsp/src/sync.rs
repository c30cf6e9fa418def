//! Ping-synchronization scan: find the first threshold crossing on the reference channel over a
//! long (~2.1s) buffer, and report the peak magnitude seen regardless of whether one was found.

use crate::clock::{ticks_per_sample, Tick};
use crate::sample::{DspError, SampleFrame};

/// Reference channel used for both synchronization and truncation.
pub const REFERENCE_CHANNEL: usize = 0;

/// Outcome of scanning a buffer for the first ping crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncResult {
    pub found: bool,
    /// Peak |sample| on the reference channel over the whole buffer, for operator feedback.
    pub max_value: u16,
    /// Absolute tick at which the crossing sample was acquired. Meaningless if `!found`.
    pub previous_ping_tick: Tick,
}

/// Scan `buf`'s reference channel for the first sample with `|x| > threshold`, and report the
/// overall peak magnitude. `acquisition_start_tick` is the tick at which `buf[0]` was sampled.
pub fn acquire_sync(
    buf: &[SampleFrame],
    threshold: u16,
    sampling_frequency_hz: u32,
    acquisition_start_tick: Tick,
) -> Result<SyncResult, DspError> {
    if buf.is_empty() {
        return Err(DspError::EmptyBuffer);
    }

    let mut max_value: u16 = 0;
    let mut crossing_index: Option<usize> = None;

    for (i, frame) in buf.iter().enumerate() {
        let magnitude = frame[REFERENCE_CHANNEL].unsigned_abs();
        if magnitude > max_value {
            max_value = magnitude;
        }
        if crossing_index.is_none() && magnitude > threshold {
            crossing_index = Some(i);
        }
    }

    let ticks_per_sample = ticks_per_sample(sampling_frequency_hz);
    let previous_ping_tick = match crossing_index {
        Some(i) => acquisition_start_tick + Tick::from_ticks(i as u64 * ticks_per_sample),
        None => Tick::ZERO,
    };

    Ok(SyncResult {
        found: crossing_index.is_some(),
        max_value,
        previous_ping_tick,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ref_value: i16) -> SampleFrame {
        [ref_value, 0, 0, 0]
    }

    #[test]
    fn empty_buffer_is_rejected() {
        assert_eq!(
            acquire_sync(&[], 100, 5_000_000, Tick::ZERO),
            Err(DspError::EmptyBuffer)
        );
    }

    #[test]
    fn silent_tank_reports_not_found() {
        let buf: Vec<SampleFrame> = (0..4096).map(|_| frame(10)).collect();
        let result = acquire_sync(&buf, 1500, 5_000_000, Tick::ZERO).unwrap();
        assert!(!result.found);
        assert_eq!(result.max_value, 10);
    }

    #[test]
    fn locates_first_crossing_and_computes_tick() {
        let mut buf = vec![frame(5); 4096];
        buf[1000] = frame(2000);
        buf[2000] = frame(3000); // later, larger -- must not be picked over the first crossing

        let start = Tick::from_ticks(1_000_000);
        let result = acquire_sync(&buf, 1500, 5_000_000, start).unwrap();

        assert!(result.found);
        assert_eq!(result.max_value, 3000);
        let expected_offset = 1000 * ticks_per_sample(5_000_000);
        assert_eq!(result.previous_ping_tick, start + Tick::from_ticks(expected_offset));
    }
}
