use criterion::{
    black_box,
    criterion_group,
    criterion_main,
    Bencher,
    Criterion,
    SamplingMode,
    Throughput,
};

use geointersect::{batch, *};

fn square(lat: f64, lon: f64, half_side: f64) -> Extent {
    let ring = GeoArray::from_degrees(&[
        (lat - half_side, lon - half_side),
        (lat - half_side, lon + half_side),
        (lat + half_side, lon + half_side),
        (lat + half_side, lon - half_side),
    ]);
    GeoRegion::new(ring).expect("valid square").into()
}

/// A grid of small regions over most of the globe.
fn candidate_grid() -> Vec<Extent> {
    let mut extents = Vec::new();
    for lat in (-70..=70).step_by(2) {
        for lon in (-180..180).step_by(2) {
            extents.push(square(lat as f64, lon as f64 + 0.5, 0.6));
        }
    }
    extents
}

fn queries() -> Vec<Extent> {
    (0..200)
        .map(|i| {
            let lat = ((i * 13) % 140) as f64 - 70.0;
            let lon = ((i * 41) % 350) as f64 - 175.0;
            if i % 2 == 0 {
                square(lat, lon, 1.5)
            } else {
                let path = GeoArray::from_degrees(&[
                    (lat, lon),
                    (lat + 2.0, lon + 3.0),
                    (lat + 1.0, lon + 6.0),
                ]);
                GeoPath::new(path).expect("valid path").into()
            }
        })
        .collect()
}

fn build_index_timed(extents: &[Extent]) -> RTreeExtentIndex {
    let start = std::time::Instant::now();
    let index: RTreeExtentIndex = extents.iter().cloned().collect();
    let elapsed_sec = start.elapsed().as_millis() as f64 / 1000.0;
    println!("Indexing {} extents took {}s", extents.len(), elapsed_sec);
    index
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let candidates = candidate_grid();
    let index = build_index_timed(&candidates);
    let queries = queries();
    consider_benchmark(c, &queries, &candidates, &index);
    batch_benchmark(c, &queries, &candidates, &index);
}

fn consider_benchmark(c: &mut Criterion, queries: &[Extent], candidates: &[Extent], index: &RTreeExtentIndex) {
    let mut group = c.benchmark_group("Consider");
    group.throughput(Throughput::Elements(queries.len() as u64));
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(10);
    group.bench_function("scan", |b| bench_consider(b, queries, candidates.into()));
    group.bench_function("rtree_index", |b| bench_consider(b, queries, index.into()));
    group.finish();
}

fn batch_benchmark(c: &mut Criterion, queries: &[Extent], candidates: &[Extent], index: &RTreeExtentIndex) {
    let mut group = c.benchmark_group("Batch");
    group.throughput(Throughput::Elements(queries.len() as u64));
    let params = MatchParameters::new(0.2f64.to_radians()).expect("valid tolerance");
    group.bench_function("scan", |b| {
        b.iter_with_large_drop(|| batch::match_sets(queries, candidates.into(), params))
    });
    group.bench_function("rtree_index", |b| {
        b.iter_with_large_drop(|| batch::match_sets(queries, index.into(), params))
    });
    group.finish();
}

fn bench_consider(bencher: &mut Bencher, queries: &[Extent], candidates: CandidateSet<'_>) {
    bencher.iter(|| {
        let mut total = 0;
        for query in queries {
            let mut intersection = Intersection::strict();
            intersection.consider(query, candidates);
            total += intersection.collector().len();
        }
        black_box(total)
    })
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
