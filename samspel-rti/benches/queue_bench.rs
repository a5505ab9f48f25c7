#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use samspel_api::{FederateEvent, FederateId};
use samspel_rti::EventQueue;

fn bench_queue_insert_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_queue_throughput");

    for size in [128, 1024, 16384] {
        group.throughput(criterion::Throughput::Elements(size as u64));
        group.bench_function(format!("events_{}", size), |b| {
            // Fixed seed for reproducibility.
            let mut rng = StdRng::seed_from_u64(42);
            let events: Vec<FederateEvent> = (0..size)
                .map(|i| {
                    FederateEvent::new(
                        FederateId::new(format!("federate-{}", i % 8)),
                        rng.random_range(0..1_000_000),
                        rng.random_range(0..1_000),
                        rng.random_range(0..=255u8),
                    )
                })
                .collect();
            b.iter(|| {
                let queue = EventQueue::new();
                for event in &events {
                    queue.insert(event.clone());
                }
                while let Some(event) = queue.pop() {
                    black_box(event);
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_queue_insert_pop);
criterion_main!(benches);
