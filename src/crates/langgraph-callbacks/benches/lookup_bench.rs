use criterion::{black_box, criterion_group, criterion_main, Criterion};
use langgraph_callbacks::{
    activate, dispatch, lookup, with_usage_tracking, AmbientContext, RunEvent, TokenUsage,
    UsageTracker, UsageTracking,
};
use std::sync::Arc;

fn lookup_benchmark(c: &mut Criterion) {
    c.bench_function("lookup absent", |b| {
        b.iter(|| black_box(lookup::<UsageTracking>()));
    });

    let ctx = AmbientContext::new().with_handle::<UsageTracking>(Arc::new(UsageTracker::new()));
    c.bench_function("lookup active", |b| {
        ctx.clone()
            .sync_scope(|| b.iter(|| black_box(lookup::<UsageTracking>())));
    });
}

fn dispatch_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("dispatch llm end", |b| {
        b.to_async(&runtime).iter(|| async {
            with_usage_tracking(|_tracker| async {
                dispatch(black_box(&RunEvent::llm_end(
                    "gpt-4",
                    TokenUsage::new(100, 50),
                )))
            })
            .await
        });
    });

    c.bench_function("activate scope", |b| {
        b.to_async(&runtime).iter(|| async {
            activate::<UsageTracking, _>(Arc::new(UsageTracker::new()), async {}).await
        });
    });
}

criterion_group!(benches, lookup_benchmark, dispatch_benchmark);
criterion_main!(benches);
