//! Per-command descriptor table.
//!
//! Every supported command is described by a static [`CommandSpec`]: its
//! arity contract, its family, and the family-specific data (argument
//! layout, fixed policy presets, reply rules) one generic executor per
//! family consumes. Shared handler logic never branches on the command
//! identifier beyond the registry lookup itself.

use crate::commands::request::CommandKind;
use crate::store::ExistencePolicy;

/// Arity contract, counting total arguments with the command token at
/// index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, given: usize) -> bool {
        match *self {
            Arity::Exact(n) => given == n,
            Arity::Range(lo, hi) => given >= lo && given <= hi,
            Arity::AtLeast(n) => given >= n,
        }
    }
}

/// Where a write command's fixed positional TTL lives, and its unit.
///
/// Millisecond inputs are converted to whole seconds by rounding up;
/// truncating down would let a record expire before the caller asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpireArg {
    Seconds(usize),
    Millis(usize),
}

/// Reply on a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteReply {
    Ok,
    One,
}

/// Reply when a conditional write loses (key-exists / key-not-found).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReply {
    Null,
    Zero,
}

/// Descriptor data for the scalar write family (SET and variants).
#[derive(Debug, Clone, Copy)]
pub struct WriteSpec {
    /// Index of the value argument.
    pub value_index: usize,
    /// Fixed positional TTL argument (SETEX / PSETEX).
    pub fixed_expire: Option<ExpireArg>,
    /// Whether a modifier tail follows the value (SET only).
    pub modifier_tail: bool,
    /// Existence mode preset (SETNX pins create-only).
    pub exists: ExistencePolicy,
    pub success: WriteReply,
    pub conflict: ConflictReply,
}

/// What a counter command increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterTarget {
    /// The scalar data bin itself.
    Bin,
    /// A key inside the aggregate map bin; the field argument's position
    /// differs per command (HINCRBY: key field delta, ZINCRBY: key delta
    /// member), so the descriptor carries it.
    MapKey { field_index: usize },
}

/// Where a counter command's delta comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaSource {
    Fixed(i64),
    Arg { index: usize, negate: bool },
}

/// Wire shape of a counter command's success reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterReply {
    /// The store value as-is (integers stay integers).
    Typed,
    /// The new value rendered as a decimal string in a bulk reply.
    BulkDecimal,
}

/// Descriptor data for the increment family.
#[derive(Debug, Clone, Copy)]
pub struct CounterSpec {
    pub target: CounterTarget,
    pub delta: DeltaSource,
    pub reply: CounterReply,
}

/// Store operation behind a membership command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberOp {
    Add,
    Remove,
    Size,
    Contains,
    List,
}

/// Reply when a membership read or removal targets an absent key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingReply {
    Zero,
    EmptyArray,
}

/// Descriptor data for the membership family.
#[derive(Debug, Clone, Copy)]
pub struct MemberSpec {
    pub op: MemberOp,
    pub missing: MissingReply,
}

/// Command family, carrying the family-specific descriptor data.
#[derive(Debug, Clone, Copy)]
pub enum CommandFamily {
    Write(WriteSpec),
    Read,
    Counter(CounterSpec),
    Member(MemberSpec),
    Liveness,
    /// Transaction verbs; owned by the connection session, never executed
    /// through the dispatch path.
    Control,
}

/// Static description of one command.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub kind: CommandKind,
    /// Canonical lowercase name, used in error replies.
    pub name: &'static str,
    pub arity: Arity,
    pub family: CommandFamily,
}

/// Looks up the descriptor for a command. Total over [`CommandKind`].
pub const fn spec(kind: CommandKind) -> &'static CommandSpec {
    match kind {
        CommandKind::Set => &SET,
        CommandKind::Setnx => &SETNX,
        CommandKind::Setex => &SETEX,
        CommandKind::Psetex => &PSETEX,
        CommandKind::Get => &GET,
        CommandKind::Incr => &INCR,
        CommandKind::Decr => &DECR,
        CommandKind::Incrby => &INCRBY,
        CommandKind::Decrby => &DECRBY,
        CommandKind::Hincrby => &HINCRBY,
        CommandKind::Zincrby => &ZINCRBY,
        CommandKind::Sadd => &SADD,
        CommandKind::Srem => &SREM,
        CommandKind::Scard => &SCARD,
        CommandKind::Sismember => &SISMEMBER,
        CommandKind::Smembers => &SMEMBERS,
        CommandKind::Ping => &PING,
        CommandKind::Echo => &ECHO,
        CommandKind::Multi => &MULTI,
        CommandKind::Exec => &EXEC,
        CommandKind::Discard => &DISCARD,
    }
}

const SET: CommandSpec = CommandSpec {
    kind: CommandKind::Set,
    name: "set",
    arity: Arity::Range(3, 6),
    family: CommandFamily::Write(WriteSpec {
        value_index: 2,
        fixed_expire: None,
        modifier_tail: true,
        exists: ExistencePolicy::Any,
        success: WriteReply::Ok,
        conflict: ConflictReply::Null,
    }),
};

const SETNX: CommandSpec = CommandSpec {
    kind: CommandKind::Setnx,
    name: "setnx",
    arity: Arity::Exact(3),
    family: CommandFamily::Write(WriteSpec {
        value_index: 2,
        fixed_expire: None,
        modifier_tail: false,
        exists: ExistencePolicy::CreateOnly,
        success: WriteReply::One,
        conflict: ConflictReply::Zero,
    }),
};

const SETEX: CommandSpec = CommandSpec {
    kind: CommandKind::Setex,
    name: "setex",
    arity: Arity::Exact(4),
    family: CommandFamily::Write(WriteSpec {
        value_index: 3,
        fixed_expire: Some(ExpireArg::Seconds(2)),
        modifier_tail: false,
        exists: ExistencePolicy::Any,
        success: WriteReply::Ok,
        conflict: ConflictReply::Null,
    }),
};

const PSETEX: CommandSpec = CommandSpec {
    kind: CommandKind::Psetex,
    name: "psetex",
    arity: Arity::Exact(4),
    family: CommandFamily::Write(WriteSpec {
        value_index: 3,
        fixed_expire: Some(ExpireArg::Millis(2)),
        modifier_tail: false,
        exists: ExistencePolicy::Any,
        success: WriteReply::Ok,
        conflict: ConflictReply::Null,
    }),
};

const GET: CommandSpec = CommandSpec {
    kind: CommandKind::Get,
    name: "get",
    arity: Arity::Exact(2),
    family: CommandFamily::Read,
};

const INCR: CommandSpec = CommandSpec {
    kind: CommandKind::Incr,
    name: "incr",
    arity: Arity::Exact(2),
    family: CommandFamily::Counter(CounterSpec {
        target: CounterTarget::Bin,
        delta: DeltaSource::Fixed(1),
        reply: CounterReply::Typed,
    }),
};

const DECR: CommandSpec = CommandSpec {
    kind: CommandKind::Decr,
    name: "decr",
    arity: Arity::Exact(2),
    family: CommandFamily::Counter(CounterSpec {
        target: CounterTarget::Bin,
        delta: DeltaSource::Fixed(-1),
        reply: CounterReply::Typed,
    }),
};

const INCRBY: CommandSpec = CommandSpec {
    kind: CommandKind::Incrby,
    name: "incrby",
    arity: Arity::Exact(3),
    family: CommandFamily::Counter(CounterSpec {
        target: CounterTarget::Bin,
        delta: DeltaSource::Arg {
            index: 2,
            negate: false,
        },
        reply: CounterReply::Typed,
    }),
};

const DECRBY: CommandSpec = CommandSpec {
    kind: CommandKind::Decrby,
    name: "decrby",
    arity: Arity::Exact(3),
    family: CommandFamily::Counter(CounterSpec {
        target: CounterTarget::Bin,
        delta: DeltaSource::Arg {
            index: 2,
            negate: true,
        },
        reply: CounterReply::Typed,
    }),
};

const HINCRBY: CommandSpec = CommandSpec {
    kind: CommandKind::Hincrby,
    name: "hincrby",
    arity: Arity::Exact(4),
    family: CommandFamily::Counter(CounterSpec {
        target: CounterTarget::MapKey { field_index: 2 },
        delta: DeltaSource::Arg {
            index: 3,
            negate: false,
        },
        reply: CounterReply::Typed,
    }),
};

const ZINCRBY: CommandSpec = CommandSpec {
    kind: CommandKind::Zincrby,
    name: "zincrby",
    arity: Arity::Exact(4),
    family: CommandFamily::Counter(CounterSpec {
        target: CounterTarget::MapKey { field_index: 3 },
        delta: DeltaSource::Arg {
            index: 2,
            negate: false,
        },
        reply: CounterReply::BulkDecimal,
    }),
};

const SADD: CommandSpec = CommandSpec {
    kind: CommandKind::Sadd,
    name: "sadd",
    arity: Arity::AtLeast(3),
    family: CommandFamily::Member(MemberSpec {
        op: MemberOp::Add,
        missing: MissingReply::Zero,
    }),
};

const SREM: CommandSpec = CommandSpec {
    kind: CommandKind::Srem,
    name: "srem",
    arity: Arity::AtLeast(3),
    family: CommandFamily::Member(MemberSpec {
        op: MemberOp::Remove,
        missing: MissingReply::Zero,
    }),
};

const SCARD: CommandSpec = CommandSpec {
    kind: CommandKind::Scard,
    name: "scard",
    arity: Arity::Exact(2),
    family: CommandFamily::Member(MemberSpec {
        op: MemberOp::Size,
        missing: MissingReply::Zero,
    }),
};

const SISMEMBER: CommandSpec = CommandSpec {
    kind: CommandKind::Sismember,
    name: "sismember",
    arity: Arity::Exact(3),
    family: CommandFamily::Member(MemberSpec {
        op: MemberOp::Contains,
        missing: MissingReply::Zero,
    }),
};

const SMEMBERS: CommandSpec = CommandSpec {
    kind: CommandKind::Smembers,
    name: "smembers",
    arity: Arity::Exact(2),
    family: CommandFamily::Member(MemberSpec {
        op: MemberOp::List,
        missing: MissingReply::EmptyArray,
    }),
};

const PING: CommandSpec = CommandSpec {
    kind: CommandKind::Ping,
    name: "ping",
    arity: Arity::Range(1, 2),
    family: CommandFamily::Liveness,
};

const ECHO: CommandSpec = CommandSpec {
    kind: CommandKind::Echo,
    name: "echo",
    arity: Arity::Exact(2),
    family: CommandFamily::Liveness,
};

const MULTI: CommandSpec = CommandSpec {
    kind: CommandKind::Multi,
    name: "multi",
    arity: Arity::Exact(1),
    family: CommandFamily::Control,
};

const EXEC: CommandSpec = CommandSpec {
    kind: CommandKind::Exec,
    name: "exec",
    arity: Arity::Exact(1),
    family: CommandFamily::Control,
};

const DISCARD: CommandSpec = CommandSpec {
    kind: CommandKind::Discard,
    name: "discard",
    arity: Arity::Exact(1),
    family: CommandFamily::Control,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_accepts() {
        assert!(Arity::Exact(3).accepts(3));
        assert!(!Arity::Exact(3).accepts(2));
        assert!(Arity::Range(3, 6).accepts(3));
        assert!(Arity::Range(3, 6).accepts(6));
        assert!(!Arity::Range(3, 6).accepts(7));
        assert!(Arity::AtLeast(3).accepts(12));
        assert!(!Arity::AtLeast(3).accepts(2));
    }

    #[test]
    fn test_spec_names_match_kinds() {
        assert_eq!(spec(CommandKind::Set).name, "set");
        assert_eq!(spec(CommandKind::Hincrby).name, "hincrby");
        assert_eq!(spec(CommandKind::Smembers).name, "smembers");
        for kind in [
            CommandKind::Set,
            CommandKind::Setnx,
            CommandKind::Setex,
            CommandKind::Psetex,
            CommandKind::Get,
            CommandKind::Hincrby,
            CommandKind::Zincrby,
            CommandKind::Sadd,
        ] {
            assert_eq!(spec(kind).kind, kind);
        }
    }

    #[test]
    fn test_field_positions_swap_between_hincrby_and_zincrby() {
        // HINCRBY key field delta vs ZINCRBY key delta member.
        let h = match spec(CommandKind::Hincrby).family {
            CommandFamily::Counter(c) => c,
            _ => panic!("hincrby is a counter"),
        };
        let z = match spec(CommandKind::Zincrby).family {
            CommandFamily::Counter(c) => c,
            _ => panic!("zincrby is a counter"),
        };
        assert_eq!(h.target, CounterTarget::MapKey { field_index: 2 });
        assert_eq!(
            h.delta,
            DeltaSource::Arg {
                index: 3,
                negate: false
            }
        );
        assert_eq!(z.target, CounterTarget::MapKey { field_index: 3 });
        assert_eq!(
            z.delta,
            DeltaSource::Arg {
                index: 2,
                negate: false
            }
        );
        assert_eq!(z.reply, CounterReply::BulkDecimal);
        assert_eq!(h.reply, CounterReply::Typed);
    }
}
