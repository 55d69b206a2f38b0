//! Pipeline throughput over synthetic timeline payloads.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};
use std::hint::black_box;
use xgeo_core::{EngineConfig, EntryStore, MemoryStorage, Payload, SignalPipeline};

const URL: &str = "https://x.com/i/api/graphql/abc/HomeTimeline";
const PLACES: [&str; 6] = ["Canada", "Germany", "Japan", "Europe", "Brazil", "US"];

fn timeline(users: usize) -> Value {
    let entries: Vec<Value> = (0..users)
        .map(|i| {
            json!({"content": {"item": {"user_results": {"result": {
                "rest_id": format!("{}", 1000 + i),
                "core": {"screen_name": format!("user{i}")},
                "legacy": {"description": "just posting", "followers_count": i},
                "about_profile": {
                    "account_based_in": PLACES[i % PLACES.len()],
                    "source": "Web App",
                    "location_accurate": i % 5 != 0
                },
                "affiliates_highlighted_label": {"label": {"countryCode": "CA"}}
            }}}}})
        })
        .collect();
    json!({"data": {"home": {"timeline": {"instructions": [{"entries": entries}]}}}})
}

fn bench_pipeline(c: &mut Criterion) {
    let pipeline = SignalPipeline::new(&EngineConfig::default());
    let mut group = c.benchmark_group("pipeline");

    for users in [10usize, 100, 500] {
        let body = timeline(users).to_string();
        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::new("process_text", users), &body, |b, body| {
            b.iter(|| pipeline.process_text(black_box(body), URL, None))
        });

        let payload = Payload::parse(&body).expect("valid payload");
        group.bench_with_input(BenchmarkId::new("extract", users), &payload, |b, payload| {
            b.iter(|| pipeline.extract(black_box(payload)))
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let config = EngineConfig::default();
    let pipeline = SignalPipeline::new(&config);
    let payload = Payload::from_value(&timeline(100));
    let observations = pipeline.extract(&payload);

    c.bench_function("store/merge_100", |b| {
        b.iter(|| {
            let mut store = EntryStore::new(MemoryStorage::new(), &config);
            for obs in observations.iter().cloned() {
                store.merge(obs);
            }
            black_box(store.len())
        })
    });
}

criterion_group!(benches, bench_pipeline, bench_merge);
criterion_main!(benches);
