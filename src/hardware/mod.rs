//! Hardware collaborators, abstracted behind trait boundaries.
//!
//! The SPI/ADC register layout, the DMA descriptor ring, and system bring-up are explicitly out
//! of scope (they are board-support-package concerns); what lives here is the contract the
//! acquisition core needs from them, plus the [`Hardware`] aggregate design note 1 asks for in
//! place of a handful of process-wide singletons.

pub mod adc;
pub mod sampler;

pub use adc::AdcConfig;
pub use hydrozynq_dsp::clock::TickSource;
pub use sampler::SampleSource;

/// Triggers a system reboot. Invoked only from the fatal-hardware error path and from the
/// `reset` command; by contract this never returns.
pub trait Reboot {
    fn reboot(&self) -> !;
}

/// The acquisition core's hardware dependencies, bundled into the single aggregate design note 1
/// asks for, constructed once during `init` and owned by the scheduler for the remainder of the
/// program's life.
pub struct Hardware<C, S, R> {
    pub clock: C,
    pub sampler: S,
    pub reboot: R,
    pub adc: AdcConfig,
}

impl<C, S, R> Hardware<C, S, R>
where
    C: TickSource,
    S: SampleSource,
    R: Reboot,
{
    pub fn new(clock: C, sampler: S, reboot: R, adc: AdcConfig) -> Self {
        Self {
            clock,
            sampler,
            reboot,
            adc,
        }
    }

    pub fn now(&self) -> hydrozynq_dsp::clock::Tick {
        self.clock.now()
    }
}
