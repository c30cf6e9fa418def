//! Acquisition firmware for the HydroZynq hydrophone array.
//!
//! The numerically pure pipeline -- normalization, the IIR cascade, sync acquisition, ping
//! truncation, cross-correlation -- lives in the `hydrozynq-dsp` crate and is exercised on the
//! host. This crate wires that pipeline to the DMA sampler, tick clock, and UDP network stack
//! through the trait boundaries in [`hardware`], drives the state machine in [`scheduler`], and
//! implements the control protocol in [`net::command`].
#![cfg_attr(not(test), no_std)]

pub mod error;
pub mod hardware;
pub mod net;
pub mod scheduler;

pub use error::{AcquisitionError, DmaFault};
pub use scheduler::{Scheduler, State, StepOutcome};

use embedded_nal::{IpAddr, Ipv4Addr, SocketAddr, UdpFullStack};
use hardware::{AdcConfig, Hardware, Reboot, SampleSource, TickSource};
use net::NetworkUsers;

/// Sample rate divider giving the 5 MHz example sampling frequency in §6.
const INITIAL_CLK_DIV: u32 = 10;

fn host_address() -> SocketAddr {
    let ip = IpAddr::V4(Ipv4Addr::new(
        net::HOST_IP[0],
        net::HOST_IP[1],
        net::HOST_IP[2],
        net::HOST_IP[3],
    ));
    SocketAddr::new(ip, 0)
}

/// Bring up the acquisition core on an already-initialized board and run it forever.
///
/// This is the `run()` half of the original firmware's `go()`/`main()` split: `go()` did its own
/// one-time setup then looped forever, with `main()` left only to reboot if it ever returned.
/// Here, setup failure (the network stack only, since `clock`/`sampler`/`reboot` are infallible
/// trait objects) returns an `Err` for the caller's `main()` to act on; once the scheduler loop
/// starts, a fatal acquisition error reboots directly through `Scheduler::reboot` rather than
/// unwinding back out of this function.
///
/// Board bring-up itself -- programming the SPI/ADC register map, the DMA descriptor ring, and
/// the network MAC -- is a board-support-package concern outside this crate (see
/// `hardware::adc`, `hardware::sampler`); the target BSP crate constructs `clock`, `sampler`,
/// `reboot`, and `stack` and calls this function.
pub fn run<C, S, R, U>(clock: C, sampler: S, reboot: R, stack: U) -> Result<(), U::Error>
where
    C: TickSource,
    S: SampleSource,
    R: Reboot,
    U: UdpFullStack,
{
    log::info!("Beginning HydroZynq main application");

    let adc = AdcConfig {
        clk_div: INITIAL_CLK_DIV,
        samples_per_packet: hydrozynq_dsp::params::INITIAL_SAMPLES_PER_PACKET,
    };
    log::info!("ADC clock div: {}", adc.clk_div);
    log::info!("ADC samples per packet: {}", adc.samples_per_packet);

    let hardware = Hardware::new(clock, sampler, reboot, adc);
    let network = NetworkUsers::new(stack, host_address())?;

    log::info!(
        "System initialization complete. Start time: {} ms",
        hardware.now().ticks_to_ms()
    );

    let mut scheduler = Scheduler::new(hardware, network);
    loop {
        if let Err(e) = scheduler.step() {
            log::error!("fatal acquisition error: {}", e);
            scheduler.reboot();
        }
    }
}
