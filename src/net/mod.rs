//! Network users: owns the five UDP sockets and the pump that drains inbound command traffic.
//!
//! Grounded on the teacher's `NetworkUsers` shape (`occheung-stabilizer/src/net/mod.rs`), trimmed
//! to raw UDP sockets only -- no MQTT, no Miniconf settings tree, since this protocol is a
//! hand-rolled key:value command channel plus four fixed UDP streams (§6).

pub mod command;
pub mod transmit;

use core::sync::atomic::AtomicBool;

use embedded_nal::{SocketAddr, UdpFullStack};
use hydrozynq_dsp::correlate::CorrelationResult;
use hydrozynq_dsp::params::RuntimeParams;
use hydrozynq_dsp::sample::SampleFrame;

use crate::hardware::Reboot;
use command::{parse_commands, MAX_PAYLOAD_BYTES};

/// Device-side network identity, per §6.
pub const DEVICE_IP: [u8; 4] = [192, 168, 0, 7];
pub const DEVICE_NETMASK: [u8; 4] = [255, 255, 255, 0];
pub const GATEWAY_IP: [u8; 4] = [192, 168, 1, 1];
pub const DEVICE_MAC: [u8; 6] = [0x00, 0x0a, 0x35, 0x00, 0x01, 0x02];
pub const HOST_IP: [u8; 4] = [192, 168, 0, 2];

pub const COMMAND_PORT: u16 = 3000;
pub const DATA_STREAM_PORT: u16 = 3001;
pub const RESULT_PORT: u16 = 3002;
/// Not named by the distilled protocol table; chosen adjacent to the named ports (see
/// `DESIGN.md`).
pub const XCORR_STREAM_PORT: u16 = 3003;
pub const SILENT_REQUEST_PORT: u16 = 3004;

/// Whether a poll of the command socket changed any runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    NoChange,
    Updated,
}

/// Owns the command-in socket plus the four outbound streams, and the scratch buffer commands
/// are received into.
pub struct NetworkUsers<U: UdpFullStack> {
    stack: U,
    command_socket: U::UdpSocket,
    data_stream_socket: U::UdpSocket,
    xcorr_stream_socket: U::UdpSocket,
    silent_request_socket: U::UdpSocket,
    result_socket: U::UdpSocket,
    receive_buffer: [u8; MAX_PAYLOAD_BYTES],
}

impl<U: UdpFullStack> NetworkUsers<U> {
    /// Bind the command-in socket to the device's own port 3000 and connect the four outbound
    /// sockets to `host`, mirroring `go()`'s socket setup in the original firmware
    /// (`bind_udp(&command_socket, IP_ADDR_ANY, COMMAND_SOCKET_PORT, receive_command)` vs.
    /// `connect_udp` for the four outbound sockets).
    pub fn new(mut stack: U, host: SocketAddr) -> Result<Self, U::Error> {
        let mut command_socket = stack.socket()?;
        stack.bind(&mut command_socket, COMMAND_PORT)?;

        let mut data_stream_socket = stack.socket()?;
        stack.connect(
            &mut data_stream_socket,
            SocketAddr::new(host.ip(), DATA_STREAM_PORT),
        )?;

        let mut xcorr_stream_socket = stack.socket()?;
        stack.connect(
            &mut xcorr_stream_socket,
            SocketAddr::new(host.ip(), XCORR_STREAM_PORT),
        )?;

        let mut silent_request_socket = stack.socket()?;
        stack.connect(
            &mut silent_request_socket,
            SocketAddr::new(host.ip(), SILENT_REQUEST_PORT),
        )?;

        let mut result_socket = stack.socket()?;
        stack.connect(&mut result_socket, SocketAddr::new(host.ip(), RESULT_PORT))?;

        Ok(Self {
            stack,
            command_socket,
            data_stream_socket,
            xcorr_stream_socket,
            silent_request_socket,
            result_socket,
            receive_buffer: [0u8; MAX_PAYLOAD_BYTES],
        })
    }

    /// Drain any pending command datagrams, parse, and apply them. Called from the scheduler's
    /// own pump on every state, never from an interrupt (§5).
    pub fn dispatch_commands(
        &mut self,
        params: &mut RuntimeParams,
        sync: &AtomicBool,
        reboot: &impl Reboot,
    ) -> UpdateState {
        let mut state = UpdateState::NoChange;

        loop {
            let received = match self
                .stack
                .receive(&mut self.command_socket, &mut self.receive_buffer)
            {
                Ok((len, _remote)) => len,
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => {
                    log::warn!("command socket receive error");
                    break;
                }
            };

            match parse_commands(&self.receive_buffer[..received]) {
                Ok(commands) => {
                    if !commands.is_empty() {
                        command::apply(&commands, params, sync, reboot);
                        state = UpdateState::Updated;
                    }
                }
                Err(e) => log::warn!("dropping malformed command packet: {:?}", e),
            }
        }

        state
    }

    /// Push one batch of raw sample frames to the data-stream port. Best-effort: a transient send
    /// failure is logged and dropped, matching the "no retries" discipline of §7.
    pub fn send_data_stream(&mut self, frames: &[SampleFrame]) {
        let bytes = transmit::encode_data_stream(frames);
        Self::send_best_effort(
            &mut self.stack,
            "data-stream",
            &mut self.data_stream_socket,
            &bytes,
        );
    }

    /// Push one batch of correlation frames to the xcorr-stream port.
    pub fn send_xcorr_stream(&mut self, xcorr_buf: &[f32]) {
        let bytes = transmit::encode_xcorr_stream(xcorr_buf);
        Self::send_best_effort(
            &mut self.stack,
            "xcorr-stream",
            &mut self.xcorr_stream_socket,
            &bytes,
        );
    }

    /// Request silent running `duration_ms` long, starting `when_ms` from now.
    pub fn send_silent_request(&mut self, when_ms: i32, duration_ms: i32) {
        let bytes = transmit::encode_silent_request(when_ms, duration_ms);
        Self::send_best_effort(
            &mut self.stack,
            "silent-request",
            &mut self.silent_request_socket,
            &bytes,
        );
    }

    /// Publish the cross-correlation result.
    pub fn send_result(&mut self, result: &CorrelationResult) {
        let bytes = transmit::encode_result(result);
        Self::send_best_effort(&mut self.stack, "result", &mut self.result_socket, &bytes);
    }

    fn send_best_effort(stack: &mut U, label: &str, socket: &mut U::UdpSocket, bytes: &[u8]) {
        if let Err(nb::Error::Other(_)) = stack.send(socket, bytes) {
            log::warn!("{} send failed", label);
        }
    }
}
