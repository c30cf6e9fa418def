//! The ADC control block's visible contract: a clock divider and a DMA transfer granularity.

/// Mirrors the two ADC register fields the acquisition core actually reads: `clk_div` and
/// `samples_per_packet`. The SPI write sequence that programs them is a board-support concern and
/// lives outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcConfig {
    pub clk_div: u32,
    pub samples_per_packet: u32,
}

impl AdcConfig {
    /// Sampling frequency implied by `clk_div` at a given FPGA reference clock.
    pub fn sampling_frequency_hz(&self, fpga_clk_hz: u32) -> u32 {
        fpga_clk_hz / (2 * self.clk_div)
    }
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            clk_div: 10,
            samples_per_packet: hydrozynq_dsp::params::INITIAL_SAMPLES_PER_PACKET,
        }
    }
}
