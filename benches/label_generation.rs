//! Benchmarks for code encoding and full label generation

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use parcel_slip::{
    BarcodeEncoder, LabelGenerator, LabelOptions, MatrixEncoder, ShipmentRecord, TrackingId,
};

fn benchmark_matrix_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix_encode");
    let encoder = MatrixEncoder::default();

    for len in [16usize, 128, 512].iter() {
        let url = format!("https://shop.example.com/track-order?trackingId={}", "7".repeat(*len));
        group.bench_with_input(BenchmarkId::from_parameter(len), &url, |b, url| {
            b.iter(|| black_box(encoder.encode(black_box(url)).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_barcode_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("barcode_encode");
    let encoder = BarcodeEncoder::default();

    for len in [5usize, 20, 37].iter() {
        let id = TrackingId::new(format!("SC-{}", "4".repeat(*len))).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(len), &id, |b, id| {
            b.iter(|| black_box(encoder.encode(black_box(id)).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_generate(c: &mut Criterion) {
    let generator = LabelGenerator::builder()
        .deployment_base_url("https://shop.example.com")
        .build()
        .unwrap();
    let now = Utc.with_ymd_and_hms(2024, 1, 30, 12, 0, 0).unwrap();
    let record = ShipmentRecord::new(42u64)
        .with_customer_name("Jane Doe")
        .with_customer_address("12 Palm St, Springfield")
        .with_customer_phone("+1 555 0100");
    let options = LabelOptions::new();

    c.bench_function("generate_label", |b| {
        b.iter(|| black_box(generator.generate_at(&record, &options, now).unwrap()));
    });

    c.bench_function("compose_label", |b| {
        b.iter(|| black_box(generator.compose_at(&record, &options, now).unwrap()));
    });
}

criterion_group!(
    benches,
    benchmark_matrix_encode,
    benchmark_barcode_encode,
    benchmark_generate
);

criterion_main!(benches);
