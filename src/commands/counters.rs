//! Increment family (INCR / DECR / INCRBY / DECRBY / HINCRBY / ZINCRBY).
//!
//! Every member issues one atomic add: against the scalar data bin for the
//! plain counters, or against a key inside the aggregate map bin for the
//! hash and sorted-set increments. The descriptor carries the argument
//! layout (HINCRBY and ZINCRBY swap the positions of the field and the
//! delta) and the reply shape, since ZINCRBY alone renders the new value
//! as a decimal bulk string.

use crate::commands::handler::{typed_reply, Keyspace};
use crate::commands::registry::{CounterReply, CounterSpec, CounterTarget, DeltaSource};
use crate::commands::request::RequestCommand;
use crate::commands::CommandError;
use crate::protocol::RespValue;
use crate::store::{parse_int, Operation, StoreDriver, StoreValue, WritePolicy};

pub(crate) async fn execute(
    driver: &dyn StoreDriver,
    keyspace: &Keyspace,
    counter: &CounterSpec,
    cmd: &RequestCommand,
) -> Result<RespValue, CommandError> {
    let delta = match counter.delta {
        DeltaSource::Fixed(d) => d,
        DeltaSource::Arg { index, negate } => {
            let d = parse_int(&cmd.args[index])?;
            if negate {
                d.checked_neg().ok_or(CommandError::NotAnInteger)?
            } else {
                d
            }
        }
    };

    let op = match counter.target {
        CounterTarget::Bin => Operation::Add {
            bin: keyspace.bin.clone(),
            delta,
        },
        CounterTarget::MapKey { field_index } => Operation::MapIncrement {
            bin: keyspace.bin.clone(),
            map_key: StoreValue::detect(cmd.args[field_index].clone()),
            delta,
        },
    };

    let key = keyspace.key(cmd.key());
    let record = driver.operate(&WritePolicy::default(), &key, op).await?;

    // A successful operate always returns the bin with its new value.
    let value = record
        .and_then(|r| r.into_bin(&keyspace.bin))
        .ok_or(CommandError::MissingRecord)?;

    match counter.reply {
        CounterReply::Typed => Ok(typed_reply(value)),
        CounterReply::BulkDecimal => value
            .as_int()
            .map(RespValue::bulk_decimal)
            .ok_or(CommandError::NotAnInteger),
    }
}
