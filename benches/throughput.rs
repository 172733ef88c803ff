//! Throughput Benchmark for RelayKV
//!
//! This benchmark measures the translation pipeline layer by layer:
//! RESP parsing, reply encoding, write policy parsing, the embedded
//! store, and full command execution.

use std::sync::Arc;

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use relaykv::commands::policy::parse_modifier_tail;
use relaykv::commands::{CommandHandler, Keyspace, RequestCommand};
use relaykv::protocol::{RequestParser, RespValue};
use relaykv::store::{Bin, Key, MemoryStore, Operation, StoreDriver, StoreValue, WritePolicy};

fn command(parts: &[&[u8]]) -> RequestCommand {
    let args = parts.iter().map(|p| Bytes::copy_from_slice(p)).collect();
    RequestCommand::parse(args).unwrap()
}

/// Benchmark RESP frame parsing
fn bench_parse(c: &mut Criterion) {
    let parser = RequestParser::new();
    let multibulk: &[u8] = b"*3\r\n$3\r\nSET\r\n$7\r\nkey:123\r\n$11\r\nsmall_value\r\n";
    let inline: &[u8] = b"PING\r\n";

    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(1));

    group.bench_function("multibulk_set", |b| {
        b.iter(|| {
            black_box(parser.parse(black_box(multibulk)).unwrap());
        });
    });

    group.bench_function("inline_ping", |b| {
        b.iter(|| {
            black_box(parser.parse(black_box(inline)).unwrap());
        });
    });

    group.finish();
}

/// Benchmark reply encoding
fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");
    group.throughput(Throughput::Elements(1));

    let bulk = RespValue::bulk_string(Bytes::from("x".repeat(1024)));
    group.bench_function("bulk_1k", |b| {
        let mut buf = Vec::with_capacity(2048);
        b.iter(|| {
            buf.clear();
            bulk.serialize_into(&mut buf);
            black_box(buf.len());
        });
    });

    let members: Vec<RespValue> = (0..100)
        .map(|i| RespValue::bulk_string(Bytes::from(format!("member:{}", i))))
        .collect();
    let array = RespValue::array(members);
    group.bench_function("array_100", |b| {
        let mut buf = Vec::with_capacity(4096);
        b.iter(|| {
            buf.clear();
            array.serialize_into(&mut buf);
            black_box(buf.len());
        });
    });

    group.finish();
}

/// Benchmark write policy parsing
fn bench_policy(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy");
    group.throughput(Throughput::Elements(1));

    let tail = vec![
        Bytes::from_static(b"EX"),
        Bytes::from_static(b"60"),
        Bytes::from_static(b"NX"),
    ];
    group.bench_function("modifier_tail", |b| {
        b.iter(|| {
            black_box(parse_modifier_tail("set", black_box(&tail)).unwrap());
        });
    });

    group.finish();
}

/// Benchmark the embedded store
fn bench_store(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = MemoryStore::new();
    let policy = WritePolicy::default();

    let mut group = c.benchmark_group("store");
    group.throughput(Throughput::Elements(1));

    group.bench_function("put_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Key::new("test", "redis", Bytes::from(format!("key:{}", i)));
            let bin = Bin::new("data", StoreValue::detect(Bytes::from_static(b"small_value")));
            rt.block_on(store.put(&policy, &key, bin)).unwrap();
            i += 1;
        });
    });

    group.bench_function("get_existing", |b| {
        let key = Key::new("test", "redis", Bytes::from_static(b"hot"));
        let bin = Bin::new("data", StoreValue::detect(Bytes::from_static(b"value")));
        rt.block_on(store.put(&policy, &key, bin)).unwrap();

        b.iter(|| {
            black_box(rt.block_on(store.get(&key)).unwrap());
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Key::new("test", "redis", Bytes::from(format!("missing:{}", i)));
            black_box(rt.block_on(store.get(&key)).unwrap());
            i += 1;
        });
    });

    group.bench_function("counter_add", |b| {
        let key = Key::new("test", "redis", Bytes::from_static(b"counter"));
        b.iter(|| {
            let op = Operation::Add {
                bin: "data".to_string(),
                delta: 1,
            };
            black_box(rt.block_on(store.operate(&policy, &key, op)).unwrap());
        });
    });

    group.finish();
}

/// Benchmark full command execution
fn bench_execute(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store: Arc<dyn StoreDriver> = Arc::new(MemoryStore::new());
    let handler = CommandHandler::new(store, Keyspace::default());

    let mut group = c.benchmark_group("execute");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let cmd = command(&[b"SET", format!("key:{}", i).as_bytes(), b"value"]);
            black_box(rt.block_on(handler.execute(cmd)));
            i += 1;
        });
    });

    group.bench_function("get", |b| {
        let cmd = command(&[b"SET", b"hot", b"value"]);
        rt.block_on(handler.execute(cmd));

        b.iter(|| {
            let cmd = command(&[b"GET", b"hot"]);
            black_box(rt.block_on(handler.execute(cmd)));
        });
    });

    group.bench_function("incr", |b| {
        b.iter(|| {
            let cmd = command(&[b"INCR", b"counter"]);
            black_box(rt.block_on(handler.execute(cmd)));
        });
    });

    group.bench_function("sadd", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let cmd = command(&[b"SADD", b"tags", format!("member:{}", i % 1000).as_bytes()]);
            black_box(rt.block_on(handler.execute(cmd)));
            i += 1;
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_serialize,
    bench_policy,
    bench_store,
    bench_execute,
);

criterion_main!(benches);
