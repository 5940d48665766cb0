use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vernet::{Envelope, SpscRing, Topic};

fn benchmark_ring_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("SpscRing_SingleThreaded");

    for capacity in [16, 256, 4096].iter() {
        group.throughput(Throughput::Elements(*capacity as u64));
        group.bench_with_input(
            BenchmarkId::new("push_pop_u64", capacity),
            capacity,
            |b, &capacity| {
                let ring: SpscRing<u64> = SpscRing::new(capacity).unwrap();

                b.iter(|| {
                    for i in 0..capacity {
                        assert!(ring.push(i as u64));
                    }
                    for _ in 0..capacity {
                        ring.pop().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn benchmark_ring_envelopes(c: &mut Criterion) {
    let mut group = c.benchmark_group("SpscRing_Envelope");
    group.throughput(Throughput::Elements(256));

    group.bench_function("push_pop_envelope", |b| {
        let ring: SpscRing<Envelope> = SpscRing::new(256).unwrap();
        let envelope = Envelope::new();

        b.iter(|| {
            for _ in 0..256 {
                assert!(ring.push(envelope.clone()));
            }
            for _ in 0..256 {
                ring.pop().unwrap();
            }
        });
    });

    group.finish();
}

fn benchmark_topic_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("Topic_Fanout");

    for nsubs in [1usize, 4, 8].iter() {
        group.throughput(Throughput::Elements(64));
        group.bench_with_input(BenchmarkId::new("push_64", nsubs), nsubs, |b, &nsubs| {
            let topic = Topic::new("BENCH", "/bench/fanout", "bench.data");
            let queues: Vec<_> = (0..nsubs)
                .map(|i| topic.subscribe(&format!("sub{}", i), 64, None).unwrap())
                .collect();
            let handle = topic.publish("pub0");

            let mut envelope = Envelope::new();
            b.iter(|| {
                for _ in 0..64 {
                    topic.push(&handle, &mut envelope);
                }
                let mut out = Envelope::new();
                for queue in &queues {
                    while topic.pop(queue, &mut out) {}
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_ring_throughput,
    benchmark_ring_envelopes,
    benchmark_topic_fanout
);
criterion_main!(benches);
