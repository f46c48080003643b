use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use repool::{Pool, PoolConfig};

fn churn(c: &mut Criterion) {
    let pool = Pool::new(
        || vec![0u8; 1024],
        PoolConfig::default().with_initial_size(32).with_max_size(64),
    )
    .unwrap();

    c.bench_function("acquire_release", |b| {
        b.iter(|| {
            let handle = pool.acquire().unwrap();
            black_box(&*handle);
        })
    });
}

criterion_group!(benches, churn);
criterion_main!(benches);
