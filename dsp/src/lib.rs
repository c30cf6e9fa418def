//! Numerical core of the HydroZynq acquisition pipeline: normalization, the cascaded biquad IIR
//! highpass, ping-window truncation, sync-acquisition scanning, and fractional-delay
//! cross-correlation.
//!
//! This crate has no hardware dependency at all -- every function here operates on plain slices
//! of [`sample::SampleFrame`] and is exercised on the host under `cargo test`. The firmware crate
//! wires these functions to the DMA sampler, tick clock, and network stack.
#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod correlate;
pub mod iir;
pub mod normalize;
pub mod params;
pub mod sample;
pub mod sync;
pub mod truncate;

pub use sample::{DspError, Sample, SampleBuffer, SampleFrame, NUM_CHANNELS};
