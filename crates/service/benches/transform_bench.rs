use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

use models::TransformConfig;
use service::TransformPipeline;

fn issues(n: usize) -> Value {
    Value::Array(
        (0..n)
            .map(|i| {
                json!({
                    "number": i,
                    "title": format!("issue {}", i),
                    "state": "open",
                    "user": { "login": format!("user{}", i), "id": i },
                    "labels": [{ "name": "bug" }],
                    "body": "x".repeat(256),
                })
            })
            .collect(),
    )
}

fn bench_pipeline(c: &mut Criterion) {
    let pipeline = TransformPipeline::new(vec![
        TransformConfig::fields(["[*].number", "[*].title", "[*].user.login"]),
        TransformConfig::rename([("[*].user.login", "[*].author")]),
    ]);
    let data = issues(500);

    c.bench_function("pipeline_extract_rename_500", |b| {
        b.iter(|| {
            let _ = pipeline.transform(data.clone());
        });
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
