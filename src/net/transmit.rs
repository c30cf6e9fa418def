//! Byte encoders for the four outbound UDP streams. All payloads are little-endian, per §6.
//!
//! Grounded on the teacher's `DataBlock::serialize` pattern (`net/data_stream.rs`), adapted from
//! big-endian framed TCP blocks to the flat little-endian UDP datagrams this protocol uses.

use hydrozynq_dsp::correlate::CorrelationResult;
use hydrozynq_dsp::sample::SampleFrame;

/// Maximum datagram this module will build for the data-stream and xcorr-stream ports, sized for
/// one `samples_per_packet`-sized batch rather than a whole capture -- transmitters send in
/// packet-sized chunks so a single UDP datagram never has to hold a multi-megabyte capture.
pub const MAX_STREAM_FRAMES: usize = 512;

/// Encode a batch of raw sample frames for the data-stream port: `i16` samples, channel 0..3
/// interleaved per frame, frames in order.
pub fn encode_data_stream(
    frames: &[SampleFrame],
) -> heapless::Vec<u8, { MAX_STREAM_FRAMES * 4 * 2 }> {
    let mut out = heapless::Vec::new();
    for frame in frames {
        for sample in frame {
            out.extend_from_slice(&sample.to_le_bytes()).ok();
        }
    }
    out
}

/// Encode a batch of correlation frames for the xcorr-stream port: `f32` values, channel 0..3
/// interleaved per lag bin, lag-ordered.
pub fn encode_xcorr_stream(
    xcorr_buf: &[f32],
) -> heapless::Vec<u8, { MAX_STREAM_FRAMES * 4 * 4 }> {
    let mut out = heapless::Vec::new();
    for value in xcorr_buf {
        out.extend_from_slice(&value.to_le_bytes()).ok();
    }
    out
}

/// Encode a silent-running request: `(when_ms, duration_ms)`, both `i32`, relative to the moment
/// of send.
pub fn encode_silent_request(when_ms: i32, duration_ms: i32) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[0..4].copy_from_slice(&when_ms.to_le_bytes());
    out[4..8].copy_from_slice(&duration_ms.to_le_bytes());
    out
}

/// Encode a result record: three signed nanosecond delays, plus the reference peak sample index
/// and the sampling frequency used as the implementation-defined metadata §6 allows.
pub fn encode_result(result: &CorrelationResult) -> [u8; 20] {
    let mut out = [0u8; 20];
    out[0..4].copy_from_slice(&result.channel_delay_ns[0].to_le_bytes());
    out[4..8].copy_from_slice(&result.channel_delay_ns[1].to_le_bytes());
    out[8..12].copy_from_slice(&result.channel_delay_ns[2].to_le_bytes());
    out[12..16].copy_from_slice(&(result.reference_peak_index as u32).to_le_bytes());
    out[16..20].copy_from_slice(&result.sampling_frequency_hz.to_le_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_stream_interleaves_channels_little_endian() {
        let frames = [[1i16, -1, 2, -2]];
        let bytes = encode_data_stream(&frames);
        assert_eq!(
            bytes.as_slice(),
            &[1, 0, 255, 255, 2, 0, 254, 255]
        );
    }

    #[test]
    fn xcorr_stream_encodes_f32_little_endian() {
        let buf = [1.0f32, -1.0];
        let bytes = encode_xcorr_stream(&buf);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &(-1.0f32).to_le_bytes());
    }

    #[test]
    fn silent_request_is_eight_bytes() {
        let bytes = encode_silent_request(-50, 100);
        assert_eq!(&bytes[0..4], &(-50i32).to_le_bytes());
        assert_eq!(&bytes[4..8], &100i32.to_le_bytes());
    }

    #[test]
    fn result_encodes_delays_and_metadata() {
        let result = CorrelationResult {
            channel_delay_ns: [30_000, 60_000, 90_000],
            reference_peak_index: 42,
            sampling_frequency_hz: 5_000_000,
        };
        let bytes = encode_result(&result);
        assert_eq!(&bytes[0..4], &30_000i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &60_000i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &90_000i32.to_le_bytes());
        assert_eq!(&bytes[12..16], &42u32.to_le_bytes());
        assert_eq!(&bytes[16..20], &5_000_000u32.to_le_bytes());
    }
}
