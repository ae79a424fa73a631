use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use nalgebra::DVector;
use traitdyn_sim::ecology::{jacobian, Community, EcoParams, TraitVector};
use traitdyn_sim::simulation::{
    run_adaptive_dynamics, run_quantitative_genetics, AdaptiveParams, InitialPopulation,
    NoMonitor, QuantGenParams, RunOptions,
};

fn community(n: usize, q: usize) -> (Vec<TraitVector>, Vec<f64>) {
    let traits = (0..n)
        .map(|i| DVector::from_fn(q, |k, _| 0.1 * ((i + k) % 7) as f64))
        .collect();
    (traits, vec![1.0; n])
}

fn bench_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel");
    let q = 3;
    let eco = EcoParams::with_eta(0.1, 0.05, 1.0, 0.1, 0.3, q).unwrap();

    for n in [10, 100, 1_000] {
        let (traits, abundances) = community(n, q);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("fitness_and_selection", n), &n, |b, _| {
            let snapshot = Community::new(&traits, &abundances, &eco).unwrap();
            b.iter(|| black_box(snapshot.fitness_and_selection(black_box(&eco))))
        });
    }

    group.finish();
}

fn bench_jacobian(c: &mut Criterion) {
    let mut group = c.benchmark_group("jacobian");
    let q = 3;
    let eco = EcoParams::with_eta(0.1, 0.05, 1.0, 0.1, 0.3, q).unwrap();

    for n in [5, 20] {
        let (traits, abundances) = community(n, q);
        let add_var = vec![0.05; n];
        group.bench_with_input(BenchmarkId::new("full", n), &n, |b, _| {
            b.iter(|| black_box(jacobian(&traits, &abundances, &eco, &add_var, false).unwrap()))
        });
    }

    group.finish();
}

fn bench_runs(c: &mut Criterion) {
    let mut group = c.benchmark_group("runs");
    group.sample_size(10);
    let eco = EcoParams::with_eta(0.1, 0.05, 1.0, 0.1, 0.3, 2).unwrap();
    let initial = InitialPopulation::new(vec![1.0], vec![vec![0.5, 0.5]]).unwrap();

    let mut adaptive = AdaptiveParams::new(eco.clone());
    adaptive.mut_prob = 0.05;
    adaptive.max_clones = 100;
    adaptive.max_t = 500;
    adaptive.save_every = 50;

    let mut quantgen = QuantGenParams::new(eco, 0.05);
    quantgen.max_t = 500;

    for threads in [1, 4] {
        let options = RunOptions::new(threads, Some(42));
        group.bench_with_input(BenchmarkId::new("adaptive_dynamics", threads), &threads, |b, _| {
            b.iter(|| {
                black_box(run_adaptive_dynamics(8, &initial, &adaptive, &options, &NoMonitor).unwrap())
            })
        });
        group.bench_with_input(
            BenchmarkId::new("quantitative_genetics", threads),
            &threads,
            |b, _| {
                b.iter(|| {
                    black_box(
                        run_quantitative_genetics(8, &initial, &quantgen, &options, &NoMonitor)
                            .unwrap(),
                    )
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_kernel, bench_jacobian, bench_runs);
criterion_main!(benches);
