//! Error types for the acquisition firmware.
//!
//! Per the error handling design, there are three behavioral categories -- fatal hardware,
//! transient DSP, and ignorable protocol errors -- but they are modeled as control flow in
//! [`crate::scheduler::Scheduler::step`], not as a type hierarchy. This module only carries the
//! data each category needs.

use core::fmt;

/// Raised by the DMA/ADC sampler. There are no retries: a fault here is fatal and propagates to
/// the top-level loop, which reboots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaFault {
    /// The DMA engine reported a transfer error.
    TransferError,
    /// The requested frame count was not a multiple of `samples_per_packet`.
    Misaligned,
}

impl fmt::Display for DmaFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DmaFault::TransferError => write!(f, "DMA transfer error"),
            DmaFault::Misaligned => write!(f, "sample count not aligned to samples_per_packet"),
        }
    }
}

/// Errors fatal to the current acquisition cycle at the firmware boundary (hardware faults and
/// `dsp`-crate numerical errors wrapped for a single error type at the scheduler level).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionError {
    Dma(DmaFault),
    Dsp(hydrozynq_dsp::DspError),
}

impl From<DmaFault> for AcquisitionError {
    fn from(e: DmaFault) -> Self {
        AcquisitionError::Dma(e)
    }
}

impl From<hydrozynq_dsp::DspError> for AcquisitionError {
    fn from(e: hydrozynq_dsp::DspError) -> Self {
        AcquisitionError::Dsp(e)
    }
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionError::Dma(e) => write!(f, "{}", e),
            AcquisitionError::Dsp(e) => write!(f, "dsp error: {:?}", e),
        }
    }
}
