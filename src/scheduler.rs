//! The ping-phase scheduler: the single control-flow loop that owns the CPU.
//!
//! Implements the `DESYNCED -> PREDICT -> PRE_PING -> CAPTURE -> PROCESS -> PREDICT` cycle from
//! §4.8, cooperatively yielding to the network pump at every step and inside the pre-ping
//! busy-wait, never preemptively (§5).

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_nal::UdpFullStack;
use spin::Mutex;

use hydrozynq_dsp::clock::{ticks_per_sample, Tick, TickSource};
use hydrozynq_dsp::correlate::{self, CorrelationResult};
use hydrozynq_dsp::params::{self, RuntimeParams};
use hydrozynq_dsp::sample::SampleBuffer;
use hydrozynq_dsp::{iir, normalize, sync, truncate};

use crate::error::AcquisitionError;
use crate::hardware::{Hardware, Reboot, SampleSource};
use crate::net::{transmit::MAX_STREAM_FRAMES, NetworkUsers};

/// Rate-consistent replacement for the source's dead `45000*2200` constant -- see `DESIGN.md`.
pub const MAX_SAMPLES: usize = 5_000 * 2_200;

/// Covers `dsp::correlate::max_lag_samples` at the one sampling rate this protocol's command set
/// can ever produce (`sample_clk_div` is not adjustable by command, only by board bring-up).
pub const XCORR_CAPACITY: usize = 4 * (2 * 853 + 1);

const SYNC_WINDOW_MS: u32 = 2_100;
const CAPTURE_WINDOW_MS: u32 = 300;
const PING_PERIOD_MS: u64 = 2_000;
const SILENT_RUNNING_LEAD_MS: u64 = 50;
const SILENT_RUNNING_DURATION_MS: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Desynced,
    Predict,
    PrePing,
    Capture,
    Process,
}

/// What happened during one `step()` call, for tests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    SyncNotFound,
    Synced,
    PredictionMade,
    SilentRequestSent,
    Captured,
    PingNotLocated,
    ResultTransmitted,
    DebugFrameTransmitted,
}

fn samples_for_duration(fs: u32, duration_ms: u32) -> usize {
    (fs as u64 * duration_ms as u64 / 1_000) as usize
}

/// The ping-phase scheduler. Generic over the hardware and network-stack collaborators so it
/// never depends on a concrete chip or network implementation.
pub struct Scheduler<C, S, R, U: UdpFullStack> {
    hardware: Hardware<C, S, R>,
    network: NetworkUsers<U>,
    params: Mutex<RuntimeParams>,
    sync: AtomicBool,
    state: State,
    previous_ping_tick: Tick,
    next_ping_tick: Tick,
    sample_start_tick: Tick,
    samples: SampleBuffer<MAX_SAMPLES>,
    xcorr: [f32; XCORR_CAPACITY],
}

impl<C, S, R, U> Scheduler<C, S, R, U>
where
    C: TickSource,
    S: SampleSource,
    R: Reboot,
    U: UdpFullStack,
{
    pub fn new(hardware: Hardware<C, S, R>, network: NetworkUsers<U>) -> Self {
        let previous_ping_tick = hardware.now();
        Self {
            hardware,
            network,
            params: Mutex::new(RuntimeParams::default()),
            sync: AtomicBool::new(false),
            state: State::Desynced,
            previous_ping_tick,
            next_ping_tick: previous_ping_tick,
            sample_start_tick: Tick::ZERO,
            samples: SampleBuffer::new(),
            xcorr: [0.0; XCORR_CAPACITY],
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_synced(&self) -> bool {
        self.sync.load(Ordering::Relaxed)
    }

    /// Trigger the board's reboot collaborator. Called by the top-level loop when `step()`
    /// returns a fatal [`AcquisitionError`], mirroring the original firmware's `go()` propagating
    /// failure up to `main()`'s `give_up()`.
    pub fn reboot(&self) -> ! {
        self.hardware.reboot.reboot()
    }

    fn sampling_frequency_hz(&self) -> u32 {
        self.hardware.adc.sampling_frequency_hz(fpga_clk_hz())
    }

    fn samples_per_packet(&self) -> u32 {
        self.params.lock().samples_per_packet
    }

    /// Serve pending network work; per §5, this happens on every state, never preemptively.
    fn poll_network(&mut self) {
        let mut params = self.params.lock();
        self.network
            .dispatch_commands(&mut params, &self.sync, &self.hardware.reboot);
    }

    fn record(&mut self, n: usize) -> Result<(), AcquisitionError> {
        self.samples.set_len(n)?;
        let storage = self.samples.storage_mut();
        self.hardware
            .sampler
            .record(&mut storage[..n], n)
            .map_err(AcquisitionError::from)
    }

    /// Run one step of the scheduler. Returns what happened for observability/testing; the
    /// top-level loop calls this forever.
    pub fn step(&mut self) -> Result<StepOutcome, AcquisitionError> {
        self.poll_network();

        if self.params.lock().debug_stream {
            return self.debug_capture_cycle();
        }

        match self.state {
            State::Desynced => self.run_sync_acquisition(),
            State::Predict => self.run_predict(),
            State::PrePing => self.run_pre_ping(),
            State::Capture => self.run_capture(),
            State::Process => self.run_process(),
        }
    }

    fn run_sync_acquisition(&mut self) -> Result<StepOutcome, AcquisitionError> {
        let fs = self.sampling_frequency_hz();
        let n = round_up(samples_for_duration(fs, SYNC_WINDOW_MS), self.samples_per_packet());

        let start_tick = self.hardware.now();
        self.record(n)?;
        normalize::normalize(self.samples.as_mut_slice())?;
        if self.params.lock().filter {
            iir::filter(self.samples.as_mut_slice(), &params::highpass_cascade())?;
        }

        let threshold = self.params.lock().ping_threshold;
        let result = sync::acquire_sync(self.samples.as_slice(), threshold, fs, start_tick)?;

        if result.found {
            self.previous_ping_tick = result.previous_ping_tick;
            self.sync.store(true, Ordering::Relaxed);
            self.state = State::Predict;
            Ok(StepOutcome::Synced)
        } else {
            log::info!("sync not found, max magnitude {}", result.max_value);
            Ok(StepOutcome::SyncNotFound)
        }
    }

    fn run_predict(&mut self) -> Result<StepOutcome, AcquisitionError> {
        let mut next_ping_tick = self.previous_ping_tick;
        let lead = Tick::ms_to_ticks(SILENT_RUNNING_LEAD_MS);
        let period = Tick::ms_to_ticks(PING_PERIOD_MS);

        loop {
            let now = self.hardware.now();
            if now + lead <= next_ping_tick {
                break;
            }
            next_ping_tick = next_ping_tick + period;
        }

        self.next_ping_tick = next_ping_tick;
        self.state = State::PrePing;
        Ok(StepOutcome::PredictionMade)
    }

    fn run_pre_ping(&mut self) -> Result<StepOutcome, AcquisitionError> {
        let lead = Tick::ms_to_ticks(SILENT_RUNNING_LEAD_MS);
        let shutdown_at = self.next_ping_tick - lead;

        let now = self.hardware.now();
        let when_ms = shutdown_at.saturating_duration_since(now).ticks_to_ms() as i32;
        self.network
            .send_silent_request(when_ms, SILENT_RUNNING_DURATION_MS);

        while self.hardware.now() < shutdown_at {
            self.poll_network();
        }

        self.state = State::Capture;
        Ok(StepOutcome::SilentRequestSent)
    }

    fn run_capture(&mut self) -> Result<StepOutcome, AcquisitionError> {
        let fs = self.sampling_frequency_hz();
        let n = round_up(
            samples_for_duration(fs, CAPTURE_WINDOW_MS),
            self.samples_per_packet(),
        )
        .min(MAX_SAMPLES);

        self.sample_start_tick = self.hardware.now();
        self.record(n)?;
        normalize::normalize(self.samples.as_mut_slice())?;
        if self.params.lock().filter {
            iir::filter(self.samples.as_mut_slice(), &params::highpass_cascade())?;
        }

        self.state = State::Process;
        Ok(StepOutcome::Captured)
    }

    fn run_process(&mut self) -> Result<StepOutcome, AcquisitionError> {
        let fs = self.sampling_frequency_hz();
        let params = *self.params.lock();
        let result = truncate::truncate(self.samples.as_slice(), &params, fs);

        if !result.located {
            self.sync.store(false, Ordering::Relaxed);
            self.state = State::Desynced;
            log::info!("failed to locate the ping");
            return Ok(StepOutcome::PingNotLocated);
        }

        self.previous_ping_tick =
            self.sample_start_tick + Tick::from_ticks(result.start as u64 * ticks_per_sample(fs));
        self.sync.store(true, Ordering::Relaxed);

        let ping = &self.samples.as_slice()[result.start..result.end];
        let (correlation, m): (CorrelationResult, usize) =
            correlate::cross_correlate(ping, &mut self.xcorr, fs)?;

        self.network.send_result(&correlation);
        self.network.send_xcorr_stream(&self.xcorr[..m * 4]);
        Self::send_chunked(&mut self.network, ping);

        self.state = State::Predict;
        Ok(StepOutcome::ResultTransmitted)
    }

    fn debug_capture_cycle(&mut self) -> Result<StepOutcome, AcquisitionError> {
        let fs = self.sampling_frequency_hz();
        let n = round_up(
            samples_for_duration(fs, SYNC_WINDOW_MS),
            self.samples_per_packet(),
        )
        .min(MAX_SAMPLES);

        self.record(n)?;
        normalize::normalize(self.samples.as_mut_slice())?;
        if self.params.lock().filter {
            iir::filter(self.samples.as_mut_slice(), &params::highpass_cascade())?;
        }

        Self::send_chunked(&mut self.network, self.samples.as_slice());
        Ok(StepOutcome::DebugFrameTransmitted)
    }

    fn send_chunked(network: &mut NetworkUsers<U>, frames: &[hydrozynq_dsp::sample::SampleFrame]) {
        for chunk in frames.chunks(MAX_STREAM_FRAMES) {
            network.send_data_stream(chunk);
        }
    }
}

/// The FPGA reference clock backing `sample_clk_div`, per §6's 100 MHz example.
fn fpga_clk_hz() -> u32 {
    100_000_000
}

fn round_up(n: usize, granule: u32) -> usize {
    let granule = granule as usize;
    if granule == 0 {
        return n;
    }
    let rem = n % granule;
    if rem == 0 {
        n
    } else {
        n + (granule - rem)
    }
}
