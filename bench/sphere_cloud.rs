use criterion::{criterion_group, criterion_main, Criterion};
use hull3d::{cloud, ConvexHull};
use rand::prelude::{Distribution, SliceRandom};

// Sea-urchin cloud: a dense spherical sweep scaled by arbitrary radii,
// shuffled so claiming order is unrelated to position.
fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = rand::rng();

    c.bench_function("sphere_cloud_100x100", |bencher| {
        bencher.iter(|| {
            criterion::black_box({
                let dist = rand::distr::StandardUniform;

                let mut points: Vec<_> = cloud::sphere(100)
                    .into_iter()
                    .map(|direction| {
                        let radius: f64 = dist.sample(&mut rng);
                        direction * radius
                    })
                    .collect();
                points.shuffle(&mut rng);

                ConvexHull::try_new(&points).unwrap().faces().len()
            });
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
