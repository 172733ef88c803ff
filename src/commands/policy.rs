//! Write-policy construction from command modifiers.
//!
//! The SET grammar is
//! `SET key value [EX sec | PX ms | EXAT unix-sec | PXAT unix-ms | KEEPTTL]
//! [NX | XX]`, modifiers matched case-insensitively. The tail is folded
//! left-to-right into a [`WritePolicy`]; when the same policy axis appears
//! twice, the last occurrence wins.
//!
//! Expiry handling encodes the store's integer sentinel contract:
//!
//! - no TTL modifier leaves [`Expiration::NamespaceDefault`] (the zero
//!   sentinel), so the store applies its namespace default TTL on write
//!   rather than clearing it; this differs from a protocol server's own
//!   "overwrite clears TTL" rule;
//! - `KEEPTTL` selects the distinct preserve sentinel;
//! - millisecond inputs convert to whole seconds rounding up, never down;
//! - a computed expiry that is zero or negative (including an absolute
//!   timestamp already in the past) is rejected with an invalid-expire
//!   error, not clamped.

use crate::commands::CommandError;
use crate::store::{parse_int, ExistencePolicy, Expiration, WritePolicy};
use bytes::Bytes;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Folds a SET-style modifier tail into a write policy.
///
/// `name` is the canonical command name carried by error replies. The tail
/// starts immediately after the value argument.
pub fn parse_modifier_tail(name: &'static str, tail: &[Bytes]) -> Result<WritePolicy, CommandError> {
    parse_modifier_tail_at(name, tail, SystemTime::now())
}

/// Same fold with an explicit wall clock, so absolute-timestamp modifiers
/// are deterministic under test.
fn parse_modifier_tail_at(
    name: &'static str,
    tail: &[Bytes],
    now: SystemTime,
) -> Result<WritePolicy, CommandError> {
    let mut policy = WritePolicy::default();
    let mut i = 0;

    while i < tail.len() {
        let token = std::str::from_utf8(&tail[i])
            .map(|s| s.to_ascii_uppercase())
            .map_err(|_| CommandError::Syntax)?;

        match token.as_str() {
            "EX" => {
                policy.expiration = relative_seconds(name, modifier_value(tail, i)?)?;
                i += 2;
            }
            "PX" => {
                policy.expiration = relative_millis(name, modifier_value(tail, i)?)?;
                i += 2;
            }
            "EXAT" => {
                let deadline = modifier_value(tail, i)?;
                policy.expiration =
                    relative_seconds(name, deadline.saturating_sub(unix_seconds(now)))?;
                i += 2;
            }
            "PXAT" => {
                let deadline = modifier_value(tail, i)?;
                policy.expiration =
                    relative_millis(name, deadline.saturating_sub(unix_millis(now)))?;
                i += 2;
            }
            "KEEPTTL" => {
                policy.expiration = Expiration::KeepExisting;
                i += 1;
            }
            "NX" => {
                policy.exists = ExistencePolicy::CreateOnly;
                i += 1;
            }
            "XX" => {
                policy.exists = ExistencePolicy::UpdateOnly;
                i += 1;
            }
            _ => return Err(CommandError::Syntax),
        }
    }

    Ok(policy)
}

/// The integer argument following the modifier at `i`, or a syntax error if
/// the tail ends first.
fn modifier_value(tail: &[Bytes], i: usize) -> Result<i64, CommandError> {
    let raw = tail.get(i + 1).ok_or(CommandError::Syntax)?;
    Ok(parse_int(raw)?)
}

/// Validates a relative second count into the fixed-TTL sentinel.
pub(crate) fn relative_seconds(
    name: &'static str,
    secs: i64,
) -> Result<Expiration, CommandError> {
    if secs <= 0 || secs > u32::MAX as i64 {
        return Err(CommandError::InvalidExpire(name));
    }
    Ok(Expiration::Seconds(secs as u32))
}

/// Converts a relative millisecond count, rounding up to whole seconds.
pub(crate) fn relative_millis(name: &'static str, ms: i64) -> Result<Expiration, CommandError> {
    if ms <= 0 {
        return Err(CommandError::InvalidExpire(name));
    }
    let rounded = ms
        .checked_add(999)
        .ok_or(CommandError::InvalidExpire(name))?;
    relative_seconds(name, rounded / 1000)
}

fn unix_seconds(now: SystemTime) -> i64 {
    now.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs() as i64
}

fn unix_millis(now: SystemTime) -> i64 {
    now.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as i64
}
