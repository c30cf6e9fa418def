//! Per-channel DC bias removal.

use crate::sample::{DspError, SampleFrame, NUM_CHANNELS};

/// Subtract the arithmetic mean of each channel from every frame, in place.
///
/// The mean is accumulated in `i64` to avoid overflow over a ~2.2s, 5Msps buffer, then applied as
/// a rounded `i32` offset so the sample type (`i16`) is preserved without promoting to float.
pub fn normalize(buf: &mut [SampleFrame]) -> Result<(), DspError> {
    if buf.is_empty() {
        return Err(DspError::EmptyBuffer);
    }

    let n = buf.len() as i64;
    let mut sums = [0i64; NUM_CHANNELS];
    for frame in buf.iter() {
        for ch in 0..NUM_CHANNELS {
            sums[ch] += frame[ch] as i64;
        }
    }

    let mut means = [0i32; NUM_CHANNELS];
    for ch in 0..NUM_CHANNELS {
        // Round to nearest rather than truncating towards zero.
        let sum = sums[ch];
        let rounded = if sum >= 0 {
            (sum + n / 2) / n
        } else {
            (sum - n / 2) / n
        };
        means[ch] = rounded as i32;
    }

    for frame in buf.iter_mut() {
        for ch in 0..NUM_CHANNELS {
            let centered = frame[ch] as i32 - means[ch];
            frame[ch] = centered.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        }
    }

    Ok(())
}
