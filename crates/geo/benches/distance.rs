//! Benchmarks for geo crate distance, parsing and clustering.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pinmap_geo::{
    build_clusters, calculate_distances, display_coordinate, haversine_distance, parse_point,
    Coordinate, Geotagged, LocatedItem,
};

fn create_test_items(count: usize) -> Vec<LocatedItem> {
    (0..count)
        .map(|i| {
            // Grid around Ottawa, with every fifth item stacked on its neighbour
            let step = (i - i % 5) as f64;
            let lat = 45.0 + (step * 0.001) % 1.0;
            let lng = -75.0 + (step * 0.001) % 1.0;
            LocatedItem::new(i as i64, format!("({},{})", lat, lng))
        })
        .collect()
}

fn bench_single_distance(c: &mut Criterion) {
    let ottawa = Coordinate::new(45.4215, -75.6972);
    let toronto = Coordinate::new(43.6532, -79.3832);

    c.bench_function("haversine_single", |b| {
        b.iter(|| haversine_distance(black_box(&ottawa), black_box(&toronto)))
    });
}

fn bench_batch_distances(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_distances");
    let reference = Coordinate::new(45.4, -75.6);

    for size in [10, 100, 1000, 10000].iter() {
        let items = create_test_items(*size);

        group.bench_with_input(BenchmarkId::new("sequential", size), size, |b, _| {
            b.iter(|| calculate_distances(black_box(&reference), black_box(&items)))
        });
    }

    group.finish();
}

fn bench_point_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_parsing");

    group.bench_function("valid", |b| b.iter(|| parse_point(black_box("(45.4215,-75.6972)"))));
    group.bench_function("swapped", |b| b.iter(|| parse_point(black_box("(-75.6972,45.4215)"))));

    group.finish();
}

fn bench_clustering(c: &mut Criterion) {
    let mut group = c.benchmark_group("clustering");

    for size in [100, 1000].iter() {
        let items = create_test_items(*size);

        group.bench_with_input(BenchmarkId::new("build", size), size, |b, _| {
            b.iter(|| build_clusters(black_box(&items), 2.0))
        });

        let clusters = build_clusters(&items, 2.0);
        group.bench_with_input(BenchmarkId::new("displace_all", size), size, |b, _| {
            b.iter(|| {
                items
                    .iter()
                    .filter_map(|item| item.coordinate().map(|c| (item.id, c)))
                    .map(|(id, c)| display_coordinate(id, c, black_box(&clusters)))
                    .count()
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_distance,
    bench_batch_distances,
    bench_point_parsing,
    bench_clustering
);
criterion_main!(benches);
