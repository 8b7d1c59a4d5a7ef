use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use forcegraph::forces::{ForceLike, ManyBodyForce};
use forcegraph::lcg::Lcg;
use forcegraph::vector::Vector2;

fn random_points(n: usize) -> Vec<Vector2> {
    let mut rng = StdRng::seed_from_u64(n as u64);
    (0..n)
        .map(|_| Vector2::new([rng.gen_range(-500.0..500.0), rng.gen_range(-500.0..500.0)]))
        .collect()
}

fn many_body(c: &mut Criterion) {
    let mut group = c.benchmark_group("many_body");

    for n in [100, 1_000, 5_000] {
        let positions = random_points(n);

        for (label, theta) in [("barnes_hut", 0.9), ("exact", 0.0)] {
            let mut force = ManyBodyForce::new().with_theta(theta);
            ForceLike::<2>::attach(&mut force, n).unwrap();

            group.bench_with_input(BenchmarkId::new(label, n), &positions, |b, positions| {
                let mut velocities = vec![Vector2::ZERO; n];
                let mut rng = Lcg::default();
                b.iter(|| {
                    force.apply(black_box(positions), &mut velocities, 1.0, &mut rng);
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, many_body);
criterion_main!(benches);
