//! The DMA-fed sampling collaborator.

use hydrozynq_dsp::sample::SampleFrame;

use crate::error::DmaFault;

/// Blocks until `n` four-channel frames have been collected into `buf[..n]`.
///
/// Implemented by the board support layer over the ADC+DMA hardware. `record` is the only
/// suspension point in the sampling path: per §5, it blocks the caller but never yields to other
/// work, since the acquisition core has nothing useful to do until the samples arrive.
pub trait SampleSource {
    /// `n` must be a multiple of `samples_per_packet` and `n <= buf.len()`; violating this is a
    /// programming error in the scheduler, not a hardware fault, so it is not part of the
    /// `Result`.
    fn record(&mut self, buf: &mut [SampleFrame], n: usize) -> Result<(), DmaFault>;
}
