use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::ThreadRng;
use sci_vec::expr::NoHost;
use sci_vec::kernel::KernelLifecycle;
use sci_vec::sort::{SortConfig, SortKernel};
use sci_vec::stats::{median, q1, q3};
use sci_vec::VectorStore;

/// Uniform samples with every `gap`-th element left empty.
fn randomized_values(mut rng: ThreadRng, n: usize, gap: usize) -> Vec<f64> {
    use rand::Rng;

    (0..n)
        .map(|i| {
            if gap > 0 && i % gap == 0 {
                f64::NAN
            } else {
                rng.random_range(-1.0e3..1.0e3)
            }
        })
        .collect()
}

/// Element-wise expression over two vectors of `n` values.
fn expression(c: &mut Criterion) {
    let mut group = c.benchmark_group("expression");
    for n in [1 << 10, 1 << 16] {
        let mut store = VectorStore::default();
        let x = store.create(Some("x")).expect("vector x");
        let y = store.create(Some("y")).expect("vector y");
        store
            .update(x, |v| v.set_values(&randomized_values(rand::rng(), n, 97)))
            .expect("fill x");
        store
            .update(y, |v| v.set_values(&randomized_values(rand::rng(), n, 0)))
            .expect("fill y");

        group.bench_with_input(BenchmarkId::new("x*y+sin(x)", n), &n, |bench, _| {
            bench.iter(|| {
                store
                    .evaluate(black_box("x * y + sin(x) / 2"), &mut NoHost)
                    .expect("expression should evaluate")
            })
        });
    }
    group.finish();
}

/// Two-key sort permutation.
fn sort_two_keys(c: &mut Criterion) {
    let kernel = SortKernel::try_new(SortConfig::default()).expect("sort config is valid");
    let n = 1 << 16;
    let major: Vec<f64> = randomized_values(rand::rng(), n, 0)
        .into_iter()
        .map(f64::round)
        .collect();
    let minor = randomized_values(rand::rng(), n, 31);

    c.bench_with_input(BenchmarkId::new("sort_two_keys", n), &n, |bench, _| {
        bench.iter(|| {
            kernel
                .run(black_box(&[major.as_slice(), minor.as_slice()]))
                .expect("keys share a length")
        })
    });
}

/// Order statistics, each of which sorts the finite values.
fn quartiles(c: &mut Criterion) {
    let values = randomized_values(rand::rng(), 1 << 16, 13);
    c.bench_function("quartiles", |bench| {
        bench.iter(|| {
            let y = black_box(values.as_slice());
            (q1(y), median(y), q3(y))
        })
    });
}

criterion_group!(benches, expression, sort_two_keys, quartiles);
criterion_main!(benches);
