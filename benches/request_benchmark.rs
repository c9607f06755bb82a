// Performance benchmarks for the hot wire-format paths: request building
// and response parsing, the code every tag read and write runs through.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use ethertag::cip::{build_read_request, build_write_request, parse_read_response};
use ethertag::codec::{decode_value, CipType, PlcValue};
use ethertag::tag_path::build_symbolic_path;

fn bench_path_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("symbolic_path");
    for name in ["R[1]", "Counter", "Program_MainConveyor_SpeedSetpoint"] {
        group.bench_with_input(BenchmarkId::from_parameter(name), name, |b, name| {
            b.iter(|| build_symbolic_path(black_box(name)));
        });
    }
    group.finish();
}

fn bench_request_building(c: &mut Criterion) {
    c.bench_function("build_read_request", |b| {
        b.iter(|| build_read_request(black_box("Counter"), black_box(1)));
    });

    let data = PlcValue::Dint(42).to_bytes();
    c.bench_function("build_write_request", |b| {
        b.iter(|| {
            build_write_request(
                black_box("Counter"),
                black_box(CipType::Dint.code()),
                black_box(&data),
            )
        });
    });
}

fn bench_response_parsing(c: &mut Criterion) {
    let dint_reply = [0xCC, 0x00, 0xC4, 0x01, 0x2A, 0x00, 0x00, 0x00];
    c.bench_function("parse_read_response_dint", |b| {
        b.iter(|| parse_read_response(black_box(&dint_reply), CipType::Dint).unwrap());
    });

    let mut string_reply = vec![0xCC, 0x00, 0xD0, 0x01, 0x20, 0x00];
    string_reply.extend_from_slice(&[b'x'; 0x20]);
    c.bench_function("parse_read_response_string", |b| {
        b.iter(|| parse_read_response(black_box(&string_reply), CipType::String).unwrap());
    });

    c.bench_function("decode_value_real", |b| {
        b.iter(|| decode_value(black_box(0xCA), black_box(&[0x00, 0x00, 0x48, 0x41])).unwrap());
    });
}

criterion_group!(
    benches,
    bench_path_construction,
    bench_request_building,
    bench_response_parsing
);
criterion_main!(benches);
