//! Benchmark tests for kino-live-core operations
//!
//! Run with: cargo bench -p kino-live-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};

use kino_live_core::EventView;

// ============================================================================
// Helpers
// ============================================================================

fn payloads() -> Vec<(&'static str, Value)> {
    vec![
        ("empty", json!({})),
        (
            "vod_ready",
            json!({
                "eventId": "evt-1",
                "title": "Keynote",
                "eventType": "vod",
                "cloudFrontUrl": "https://d1.cloudfront.net/live/index.m3u8",
                "vodStatus": "READY",
                "vodCloudFrontUrl": "https://d2.cloudfront.net/vod/index.m3u8"
            }),
        ),
        (
            "live_fallback",
            json!({
                "eventId": 17,
                "eventType": "live",
                "cloudFrontUrl": "",
                "mediaPackageUrl": "https://mp.example.com/out/v1/index.m3u8",
                "rtmpInputUrl": "rtmp://ingest.example.com/live/key",
                "vodStatus": "PROCESSING",
                "channelState": "RUNNING"
            }),
        ),
    ]
}

// ============================================================================
// Resolver Benchmarks
// ============================================================================

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_view_resolve");

    for (name, payload) in payloads() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &payload, |b, payload| {
            b.iter(|| EventView::from_raw(black_box(payload)))
        });
    }

    group.finish();
}

fn bench_to_json(c: &mut Criterion) {
    let view = EventView::from_raw(&payloads()[1].1);
    c.bench_function("event_view_to_json", |b| b.iter(|| black_box(&view).to_json()));
}

criterion_group!(benches, bench_resolve, bench_to_json);
criterion_main!(benches);
