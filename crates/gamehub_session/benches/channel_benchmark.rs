//! # Interaction Channel Benchmark
//!
//! Measures how long a pump takes to replay a large log into a fresh
//! listener, and how cheap an idle pump is once everything is seen.
//!
//! Run with: `cargo bench --package gamehub_session`

// Benchmarks don't need docs
#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gamehub_session::{InMemoryStore, InteractionChannel, InteractionDraft, SessionStore};
use gamehub_shared::{Action, ParticipantId, SessionId};

fn filled_store(count: usize) -> (Arc<InMemoryStore>, SessionId) {
    let store = Arc::new(InMemoryStore::default());
    let session = SessionId::new("bench");
    for i in 0..count {
        store
            .append_interaction(
                &session,
                InteractionDraft {
                    player_id: ParticipantId::new("p"),
                    player_name: "bench".into(),
                    action: Action::MemoryCardSelect { card_position: (i % 18) as i64 },
                    timestamp: i as u64,
                },
            )
            .unwrap();
    }
    (store, session)
}

/// Benchmark: replay N interactions into a new subscription.
fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");

    for count in [100, 1_000, 10_000] {
        let (store, session) = filled_store(count);
        let channel = InteractionChannel::new(store);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let mut seen = 0usize;
                let mut sub = channel.subscribe(&session, |_| {}).unwrap();
                seen += sub.pump().unwrap();
                black_box(seen)
            });
        });
    }

    group.finish();
}

/// Benchmark: pump with nothing new.
fn bench_idle_pump(c: &mut Criterion) {
    let (store, session) = filled_store(10_000);
    let channel = InteractionChannel::new(store);
    let mut sub = channel.subscribe(&session, |_| {}).unwrap();
    sub.pump().unwrap();

    c.bench_function("idle_pump_10k_seen", |b| {
        b.iter(|| black_box(sub.pump().unwrap()));
    });
}

criterion_group!(benches, bench_replay, bench_idle_pump);
criterion_main!(benches);
