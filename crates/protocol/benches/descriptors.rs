//! Benchmarks for descriptor packing
//!
//! Measures the cost of building per-opcode field packings and the 64-byte
//! wire serialization. These paths sit on every dispatch, once per command.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use protocol::{
    CNS_NAMESPACE, CommandDescriptor, CommandFields, CompletionRecord, DsmRange, LID_ERROR,
    evaluate,
};

fn benchmark_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    group.bench_function("identify", |b| {
        b.iter(|| {
            CommandFields::Identify {
                cns: black_box(CNS_NAMESPACE),
                cntid: 0,
                nvmsetid: 0,
                uuid: 0,
            }
            .build(black_box(1))
        })
    });

    group.bench_function("get_log_page", |b| {
        b.iter(|| {
            CommandFields::GetLogPage {
                lid: black_box(LID_ERROR),
                lsp: 0,
                rae: false,
                lsi: 0,
                offset: black_box(4096),
                nbytes: black_box(64 * 64),
            }
            .build(black_box(0xFFFFFFFF))
        })
    });

    group.finish();
}

fn benchmark_wire(c: &mut Criterion) {
    let mut group = c.benchmark_group("wire");

    let cmd = CommandFields::Identify {
        cns: CNS_NAMESPACE,
        cntid: 0,
        nvmsetid: 0,
        uuid: 0,
    }
    .build(1);
    let raw = cmd.to_bytes();

    group.bench_function("to_bytes", |b| b.iter(|| black_box(&cmd).to_bytes()));
    group.bench_function("from_bytes", |b| {
        b.iter(|| CommandDescriptor::from_bytes(black_box(&raw)).unwrap())
    });

    group.bench_function("dsm_range", |b| {
        let range = DsmRange {
            cattr: 0,
            nlb: 8,
            slba: 0x1000,
        };
        let mut out = [0u8; DsmRange::SIZE];
        b.iter(|| range.write_to(black_box(&mut out)))
    });

    group.finish();
}

fn benchmark_evaluate(c: &mut Criterion) {
    let ok = CompletionRecord::default();
    let rejected = CompletionRecord {
        status: 0x81 << 1,
        ..Default::default()
    };

    c.bench_function("evaluate", |b| {
        b.iter(|| {
            let _ = evaluate(black_box(0), black_box(&ok));
            let _ = evaluate(black_box(0), black_box(&rejected));
        })
    });
}

criterion_group!(benches, benchmark_build, benchmark_wire, benchmark_evaluate);
criterion_main!(benches);
