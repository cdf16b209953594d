//! Benchmarks for the hot paths of the Block Lanczos core: the Gramian and
//! the two parallel sparse products (spec §4.5/§4.6 call these out as the
//! per-iteration cost centers). Run with `cargo bench --bench solver`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gf16_block_lanczos::blk::{Arg, RMatrix};
use gf16_block_lanczos::pool::SerialThreadpool;
use gf16_block_lanczos::Cmsm;

fn random_sparse(rnum: usize, cnum: usize, col_weight: usize, seed: u64) -> Cmsm {
    let mut arr = vec![0u8; rnum * cnum];
    let mut s = seed;
    for j in 0..cnum {
        for _ in 0..col_weight {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
            let i = (s >> 33) as usize % rnum;
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
            let v = ((s >> 40) as u8 % 15) + 1;
            arr[i * cnum + j] = v;
        }
    }
    Cmsm::from_gf_arr(&arr, rnum, cnum).unwrap()
}

fn init_tracing() {
    static ONCE: std::sync::Once = std::sync::Once::new();
    ONCE.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()))
            .with_target(false)
            .compact()
            .init();
    });
}

fn bench_gramian(c: &mut Criterion) {
    init_tracing();
    let mut group = c.benchmark_group("gramian");
    for &rnum in &[256usize, 1024, 4096] {
        let m = RMatrix::rand(rnum, 7);
        group.bench_with_input(BenchmarkId::from_parameter(rnum), &rnum, |b, _| {
            b.iter(|| black_box(m.gramian()));
        });
    }
    group.finish();
}

fn bench_trmul(c: &mut Criterion) {
    let mut group = c.benchmark_group("cmsm_trmul");
    let pool = SerialThreadpool::new();
    for &n in &[1024usize, 8192, 65536] {
        let m = random_sparse(n, n - 1, 4, 11);
        let v = RMatrix::rand(n, 3);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            let mut res = RMatrix::zero(n - 1);
            b.iter(|| {
                m.trmul(&mut res, &v, 4, &pool);
                black_box(&res);
            });
        });
    }
    group.finish();
}

fn bench_block_lanczos_small(c: &mut Criterion) {
    let pool = SerialThreadpool::new();
    c.bench_function("block_lanczos_n512", |b| {
        let m = random_sparse(512, 511, 4, 99);
        b.iter(|| {
            let mut arg = Arg::create(512, 511, 4).unwrap();
            black_box(gf16_block_lanczos::block_lanczos(&mut arg, &m, &pool));
        });
    });
}

criterion_group!(benches, bench_gramian, bench_trmul, bench_block_lanczos_small);
criterion_main!(benches);
