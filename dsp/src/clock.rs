//! Monotonic tick clock and tick/time conversions.
//!
//! The hardware tick counter is the only notion of time the acquisition core has: there is no
//! wall-clock, and the counter is wide enough (64 bits) that wraparound never occurs within an
//! operational window.

/// CPU clock used to derive tick rates, `ARM_CLK_PLL / 2` per the original bring-up constants.
pub const ARM_CLK_PLL_HZ: u64 = 666_667_000;

/// The rate at which the monotonic tick counter advances.
pub const CPU_CLOCK_HZ: u64 = ARM_CLK_PLL_HZ / 2;

/// A monotonic hardware tick count.
///
/// Total-ordered, wrapping-free arithmetic over `u64`; `Sub` saturates at zero rather than
/// panicking so a late sample never produces a bogus negative duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    pub const fn from_ticks(ticks: u64) -> Self {
        Tick(ticks)
    }

    pub const fn ticks(self) -> u64 {
        self.0
    }

    pub fn ticks_to_ms(self) -> u64 {
        self.0 * 1_000 / CPU_CLOCK_HZ
    }

    pub fn ticks_to_seconds(self) -> f64 {
        self.0 as f64 / CPU_CLOCK_HZ as f64
    }

    pub fn ms_to_ticks(ms: u64) -> Self {
        Tick(ms * CPU_CLOCK_HZ / 1_000)
    }

    pub fn micros_to_ticks(us: u64) -> Self {
        Tick(us * CPU_CLOCK_HZ / 1_000_000)
    }

    /// Saturating duration between two ticks, `self - earlier`, never negative.
    pub fn saturating_duration_since(self, earlier: Tick) -> Tick {
        Tick(self.0.saturating_sub(earlier.0))
    }
}

impl core::ops::Add for Tick {
    type Output = Tick;
    fn add(self, rhs: Tick) -> Tick {
        Tick(self.0 + rhs.0)
    }
}

impl core::ops::Sub for Tick {
    type Output = Tick;
    fn sub(self, rhs: Tick) -> Tick {
        Tick(self.0.saturating_sub(rhs.0))
    }
}

impl core::ops::AddAssign for Tick {
    fn add_assign(&mut self, rhs: Tick) {
        self.0 += rhs.0;
    }
}

/// Abstract source of the monotonic tick count. Implemented by the board support layer; the
/// acquisition core only ever reads through this trait.
pub trait TickSource {
    fn now(&self) -> Tick;
}

/// Ticks per ADC sample at a given sampling frequency, used to convert a sample index within a
/// buffer into an absolute tick offset from the buffer's acquisition start.
pub fn ticks_per_sample(sampling_frequency_hz: u32) -> u64 {
    CPU_CLOCK_HZ / sampling_frequency_hz as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ms_roundtrip_is_close() {
        let t = Tick::ms_to_ticks(2000);
        assert_eq!(t.ticks_to_ms(), 2000);
    }

    #[test]
    fn micros_to_ticks_matches_initial_params() {
        // 100us and 50us pre/post durations from the initial runtime parameters.
        assert!(Tick::micros_to_ticks(100).ticks() > 0);
        assert!(Tick::micros_to_ticks(50).ticks() > 0);
    }

    #[test]
    fn sub_saturates_instead_of_wrapping() {
        let a = Tick(5);
        let b = Tick(10);
        assert_eq!((a - b).ticks(), 0);
    }

    #[test]
    fn ticks_per_sample_at_5mhz() {
        // sample_clk_div = 10 on a 100MHz FPGA clock => 5 MHz sampling.
        let ticks = ticks_per_sample(5_000_000);
        assert_eq!(ticks, CPU_CLOCK_HZ / 5_000_000);
    }
}
