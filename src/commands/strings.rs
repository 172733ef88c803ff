//! Scalar write family (SET / SETNX / SETEX / PSETEX) and GET.
//!
//! One generic write executor serves the whole family, driven entirely by
//! the command's [`WriteSpec`]: where the value sits, whether a positional
//! TTL or a modifier tail follows, the existence preset, and how success
//! and conditional-conflict outcomes render. The store call is always a
//! single-bin `put` of the detected value under the configured data bin.

use crate::commands::handler::Keyspace;
use crate::commands::policy;
use crate::commands::registry::{CommandSpec, ConflictReply, ExpireArg, WriteReply, WriteSpec};
use crate::commands::request::RequestCommand;
use crate::commands::CommandError;
use crate::protocol::RespValue;
use crate::store::{parse_int, Bin, ResultCode, StoreDriver, StoreValue, WritePolicy};

/// Executes one write-family command and translates its outcome.
///
/// A key-exists or key-not-found failure here is a conditional write losing
/// its condition, an expected negative outcome. It renders per the
/// descriptor (null for the SET family, zero for SETNX) rather than as an
/// error. Everything else passes through as a store error.
pub(crate) async fn execute_write(
    driver: &dyn StoreDriver,
    keyspace: &Keyspace,
    spec: &CommandSpec,
    write: &WriteSpec,
    cmd: &RequestCommand,
) -> Result<RespValue, CommandError> {
    let mut policy = WritePolicy {
        exists: write.exists,
        ..WritePolicy::default()
    };

    if let Some(expire) = write.fixed_expire {
        policy.expiration = match expire {
            ExpireArg::Seconds(idx) => {
                policy::relative_seconds(spec.name, parse_int(&cmd.args[idx])?)?
            }
            ExpireArg::Millis(idx) => {
                policy::relative_millis(spec.name, parse_int(&cmd.args[idx])?)?
            }
        };
    }

    if write.modifier_tail {
        policy = policy::parse_modifier_tail(spec.name, &cmd.args[write.value_index + 1..])?;
    }

    let key = keyspace.key(cmd.key());
    let value = StoreValue::detect(cmd.args[write.value_index].clone());
    let bin = Bin::new(&keyspace.bin, value);

    match driver.put(&policy, &key, bin).await {
        Ok(()) => Ok(match write.success {
            WriteReply::Ok => RespValue::ok(),
            WriteReply::One => RespValue::integer(1),
        }),
        Err(err) if matches!(err.code, ResultCode::KeyExists | ResultCode::KeyNotFound) => {
            Ok(match write.conflict {
                ConflictReply::Null => RespValue::null(),
                ConflictReply::Zero => RespValue::integer(0),
            })
        }
        Err(err) => Err(err.into()),
    }
}

/// Executes GET: one point read of the data bin.
///
/// Missing record and missing bin both render as null. An aggregate-shaped
/// bin (a map written through the membership or hash commands) is a
/// wrong-type condition, not a printable value.
pub(crate) async fn execute_get(
    driver: &dyn StoreDriver,
    keyspace: &Keyspace,
    cmd: &RequestCommand,
) -> Result<RespValue, CommandError> {
    let key = keyspace.key(cmd.key());
    let Some(record) = driver.get(&key).await? else {
        return Ok(RespValue::null());
    };
    match record.bin(&keyspace.bin) {
        None => Ok(RespValue::null()),
        Some(value) => match value.scalar_bytes() {
            Some(bytes) => Ok(RespValue::bulk_string(bytes)),
            None => Err(CommandError::WrongType),
        },
    }
}
