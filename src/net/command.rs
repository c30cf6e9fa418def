//! Parses and applies command packets received on the command port.
//!
//! Per design note 2, this is a pure parser over borrowed slices rather than an in-place,
//! NUL-delimiting mutation of the packet buffer -- the split points (first `,`, then first `:`)
//! are unchanged from the source behavior.

use core::sync::atomic::{AtomicBool, Ordering};

use hydrozynq_dsp::clock::Tick;
use hydrozynq_dsp::params::RuntimeParams;

use crate::hardware::Reboot;

/// Maximum payload size accepted on the command port.
pub const MAX_PAYLOAD_BYTES: usize = 1024;

/// Maximum number of `key:value` entries parsed out of one packet. Not named in the distilled
/// protocol table; carried over from the original parser's fixed `pairs[10]` array.
pub const MAX_COMMANDS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    PacketTooLong,
    InvalidUtf8,
    MissingValue,
    TooManyCommands,
    InvalidValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Threshold(u16),
    Filter(bool),
    Debug(bool),
    PrePingDurationUs(u32),
    PostPingDurationUs(u32),
    Reset,
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(ParseError::InvalidValue),
    }
}

fn interpret(key: &str, value: &str) -> Result<Option<Command>, ParseError> {
    match key {
        "threshold" => value
            .trim()
            .parse::<u16>()
            .map(|v| Some(Command::Threshold(v)))
            .map_err(|_| ParseError::InvalidValue),
        "filter" => parse_bool(value).map(|v| Some(Command::Filter(v))),
        "debug" => parse_bool(value).map(|v| Some(Command::Debug(v))),
        "pre_ping_duration_us" => value
            .trim()
            .parse::<u32>()
            .map(|v| Some(Command::PrePingDurationUs(v)))
            .map_err(|_| ParseError::InvalidValue),
        "post_ping_duration_us" => value
            .trim()
            .parse::<u32>()
            .map(|v| Some(Command::PostPingDurationUs(v)))
            .map_err(|_| ParseError::InvalidValue),
        "reset" => Ok(Some(Command::Reset)),
        // Unknown keys are silently ignored.
        _ => Ok(None),
    }
}

/// Tokenize and interpret `payload` into a bounded list of commands.
///
/// The whole packet is rejected -- no commands applied -- if it is oversized, not valid ASCII, a
/// token lacks a `:`, a recognized key's value fails to parse, or there are more than
/// [`MAX_COMMANDS`] entries. Unknown keys never cause rejection; they are just dropped from the
/// result.
pub fn parse_commands(payload: &[u8]) -> Result<heapless::Vec<Command, MAX_COMMANDS>, ParseError> {
    if payload.len() > MAX_PAYLOAD_BYTES {
        return Err(ParseError::PacketTooLong);
    }

    let text = core::str::from_utf8(payload).map_err(|_| ParseError::InvalidUtf8)?;

    let mut commands = heapless::Vec::new();
    for token in text.split(',') {
        let mut parts = token.splitn(2, ':');
        let key = parts.next().unwrap_or("");
        let value = parts.next().ok_or(ParseError::MissingValue)?;

        if let Some(command) = interpret(key, value)? {
            commands
                .push(command)
                .map_err(|_| ParseError::TooManyCommands)?;
        }
    }

    Ok(commands)
}

/// Apply parsed commands to the shared runtime parameters and sync latch.
///
/// `threshold` clears `sync` per §3; `reset` invokes `reboot`, which never returns.
pub fn apply(
    commands: &[Command],
    params: &mut RuntimeParams,
    sync: &AtomicBool,
    reboot: &impl Reboot,
) {
    for command in commands {
        match *command {
            Command::Threshold(value) => {
                params.ping_threshold = value;
                sync.store(false, Ordering::Relaxed);
            }
            Command::Filter(enabled) => params.filter = enabled,
            Command::Debug(enabled) => params.debug_stream = enabled,
            Command::PrePingDurationUs(us) => {
                params.pre_ping_duration = Tick::micros_to_ticks(us as u64)
            }
            Command::PostPingDurationUs(us) => {
                params.post_ping_duration = Tick::micros_to_ticks(us as u64)
            }
            Command::Reset => reboot.reboot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_threshold_and_filter() {
        let commands = parse_commands(b"threshold:1500,filter:1").unwrap();
        assert_eq!(
            commands.as_slice(),
            &[Command::Threshold(1500), Command::Filter(true)]
        );
    }

    #[test]
    fn unknown_keys_are_dropped_not_rejected() {
        let commands = parse_commands(b"bogus:7,debug:1").unwrap();
        assert_eq!(commands.as_slice(), &[Command::Debug(true)]);
    }

    #[test]
    fn missing_colon_rejects_whole_packet() {
        assert_eq!(
            parse_commands(b"threshold1500"),
            Err(ParseError::MissingValue)
        );
    }

    #[test]
    fn trailing_comma_rejects_whole_packet() {
        assert_eq!(
            parse_commands(b"threshold:1500,"),
            Err(ParseError::MissingValue)
        );
    }

    #[test]
    fn unparseable_value_rejects_whole_packet() {
        assert_eq!(
            parse_commands(b"threshold:abc"),
            Err(ParseError::InvalidValue)
        );
    }

    #[test]
    fn oversized_packet_is_rejected() {
        let payload = vec![b'a'; MAX_PAYLOAD_BYTES + 1];
        assert_eq!(parse_commands(&payload), Err(ParseError::PacketTooLong));
    }

    #[test]
    fn reset_triggers_reboot() {
        struct FakeReboot(core::cell::Cell<bool>);
        impl Reboot for FakeReboot {
            fn reboot(&self) -> ! {
                self.0.set(true);
                panic!("reboot");
            }
        }

        let commands = parse_commands(b"reset:1").unwrap();
        let mut params = RuntimeParams::default();
        let sync = AtomicBool::new(true);
        let reboot = FakeReboot(core::cell::Cell::new(false));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            apply(&commands, &mut params, &sync, &reboot)
        }));
        assert!(result.is_err());
        assert!(reboot.0.get());
    }

    #[test]
    fn threshold_command_clears_sync() {
        let commands = parse_commands(b"threshold:200").unwrap();
        let mut params = RuntimeParams::default();
        let sync = AtomicBool::new(true);
        struct NoReboot;
        impl Reboot for NoReboot {
            fn reboot(&self) -> ! {
                panic!("should not reboot")
            }
        }
        apply(&commands, &mut params, &sync, &NoReboot);
        assert_eq!(params.ping_threshold, 200);
        assert!(!sync.load(Ordering::Relaxed));
    }

    #[test]
    fn pre_ping_duration_round_trips_through_micros_to_ticks() {
        let commands = parse_commands(b"pre_ping_duration_us:123").unwrap();
        let mut params = RuntimeParams::default();
        let sync = AtomicBool::new(false);
        struct NoReboot;
        impl Reboot for NoReboot {
            fn reboot(&self) -> ! {
                panic!("should not reboot")
            }
        }
        apply(&commands, &mut params, &sync, &NoReboot);
        assert_eq!(params.pre_ping_duration, Tick::micros_to_ticks(123));
    }
}
