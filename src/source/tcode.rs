//! TCode command parsing.
//!
//! A TCode message is a whitespace-separated list of commands such as
//! `L0500 R1999I120`. Each command starts with an axis name followed by the
//! digits of a fraction (`500` is 0.500, `5` is 0.5), optionally followed by an
//! interval (`I<ms>`) or speed (`S<units>`) suffix.

use crate::axis::{AxisValues, DeviceAxis};

/// One parsed TCode command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TCodeCommand {
    pub axis: DeviceAxis,
    pub value: f32,
    pub interval_ms: Option<u32>,
    pub speed: Option<u32>,
}

/// Outcome of parsing one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub applied: usize,
    pub skipped: usize,
}

/// Parse a single command token. Returns `None` for anything malformed.
pub fn parse_command(token: &str) -> Option<TCodeCommand> {
    let axis = DeviceAxis::try_parse(token.get(..2)?)?;
    let rest = &token[2..];

    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let (digits, suffix) = rest.split_at(digits_end);
    if digits.is_empty() {
        return None;
    }

    let numerator: u64 = digits.parse().ok()?;
    let value = (numerator as f64 / 10f64.powi(digits.len() as i32)) as f32;

    let mut command = TCodeCommand {
        axis,
        value,
        interval_ms: None,
        speed: None,
    };
    if let Some(kind) = suffix.chars().next() {
        let amount: u32 = suffix[kind.len_utf8()..].parse().ok()?;
        match kind {
            'I' | 'i' => command.interval_ms = Some(amount),
            'S' | 's' => command.speed = Some(amount),
            _ => return None,
        }
    }
    Some(command)
}

/// Parse every command in `message` into `values`. Malformed commands are
/// skipped and counted.
pub fn parse_into(message: &str, values: &mut AxisValues) -> ParseStats {
    let mut stats = ParseStats::default();
    for token in message.split_whitespace() {
        match parse_command(token) {
            Some(command) => {
                values.set(command.axis, command.value);
                stats.applied += 1;
            }
            None => stats.skipped += 1,
        }
    }
    stats
}
