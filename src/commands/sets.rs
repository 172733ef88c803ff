//! Membership family (SADD / SREM / SCARD / SISMEMBER / SMEMBERS).
//!
//! A protocol set is modeled as the key-set of the record's aggregate map
//! bin: adding members is a unique map put, cardinality is the map size,
//! membership is a contains-key probe, and listing returns the map keys.
//! Reads and removals against an absent record are expected negatives; the
//! descriptor says whether they render as zero or as an empty array.

use crate::commands::handler::{typed_reply, Keyspace};
use crate::commands::registry::{MemberOp, MemberSpec, MissingReply};
use crate::commands::request::RequestCommand;
use crate::commands::CommandError;
use crate::protocol::RespValue;
use crate::store::{Operation, ResultCode, StoreDriver, StoreValue, WritePolicy};

pub(crate) async fn execute(
    driver: &dyn StoreDriver,
    keyspace: &Keyspace,
    member: &MemberSpec,
    cmd: &RequestCommand,
) -> Result<RespValue, CommandError> {
    let bin = keyspace.bin.clone();
    let op = match member.op {
        MemberOp::Add => Operation::MapPutUnique {
            bin,
            members: members_of(cmd),
        },
        MemberOp::Remove => Operation::MapRemove {
            bin,
            members: members_of(cmd),
        },
        MemberOp::Size => Operation::MapSize { bin },
        MemberOp::Contains => Operation::MapContainsKey {
            bin,
            map_key: StoreValue::detect(cmd.args[2].clone()),
        },
        MemberOp::List => Operation::MapKeys { bin },
    };

    let key = keyspace.key(cmd.key());
    match driver.operate(&WritePolicy::default(), &key, op).await {
        Ok(record) => {
            let value = record
                .and_then(|r| r.into_bin(&keyspace.bin))
                .ok_or(CommandError::MissingRecord)?;
            Ok(render(member.op, value))
        }
        Err(err) if err.code == ResultCode::KeyNotFound => Ok(match member.missing {
            MissingReply::Zero => RespValue::integer(0),
            MissingReply::EmptyArray => RespValue::array(Vec::new()),
        }),
        Err(err) => Err(err.into()),
    }
}

fn members_of(cmd: &RequestCommand) -> Vec<StoreValue> {
    cmd.args[2..]
        .iter()
        .map(|m| StoreValue::detect(m.clone()))
        .collect()
}

fn render(op: MemberOp, value: StoreValue) -> RespValue {
    match (op, value) {
        // Members always render as bulk strings, integers included.
        (MemberOp::List, StoreValue::List(items)) => RespValue::array(
            items
                .into_iter()
                .map(|item| match item.scalar_bytes() {
                    Some(bytes) => RespValue::bulk_string(bytes),
                    None => typed_reply(item),
                })
                .collect(),
        ),
        (_, value) => typed_reply(value),
    }
}
