//! Top-level entry point. `main()` brings up RTT logging, then hands off to the scheduler's
//! cooperative loop via [`hydrozynq::run`] forever. Mirrors the original firmware's `go()`/
//! `main()` shape: `go()` initialized once and looped, and `main()` reset the processor if it
//! ever returned.
#![no_std]
#![no_main]

use panic_halt as _;
use rtt_logger::RTTLogger;

static LOGGER: RTTLogger = RTTLogger::new(log::LevelFilter::Info);

#[no_mangle]
pub extern "C" fn main() -> ! {
    rtt_target::rtt_init_print!();
    log::set_logger(&LOGGER).ok();
    log::set_max_level(log::LevelFilter::Info);

    // Programming the SPI/ADC register map, the DMA descriptor ring, and the network MAC is a
    // board-support-package concern outside this crate (see `hardware::adc`,
    // `hardware::sampler`). A target BSP crate would construct the concrete `TickSource`,
    // `SampleSource`, `Reboot`, and `UdpFullStack` implementations here and call
    // `hydrozynq::run`; none exist in this workspace, so this entry point falls straight to the
    // reboot path `main()` takes when `go()` fails.
    give_up()
}

/// Trigger a processor reset, mirroring `main()`'s `while (1) give_up();` fallback when `go()`
/// returns having failed.
fn give_up() -> ! {
    panic!("hydrozynq: fatal initialization failure, resetting")
}
