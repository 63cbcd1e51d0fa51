//! Per-city anomaly detection over a Türkiye-sized summary table
//!
//! 81 cities with 5-40 districts each, every tenth district priced far
//! above its neighbours.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use emlak_sweep::application::AnomalyDetector;
use emlak_sweep::domain::RawSummaryRow;

fn summary_rows(cities: usize) -> Vec<RawSummaryRow> {
    let mut rng = fastrand::Rng::with_seed(81);
    let mut rows = Vec::new();
    for city in 0..cities {
        let districts = rng.usize(5..=40);
        let base = rng.f64() * 4_000_000.0 + 500_000.0;
        for district in 0..districts {
            let spread = 1.0 + (rng.f64() - 0.5) * 0.3;
            let price = if district % 10 == 9 { base * 8.0 } else { base * spread };
            rows.push(RawSummaryRow {
                city: format!("Il {city:02}"),
                district: format!("Ilce {district:02}"),
                site: Some("emlakjet".to_string()),
                num_listings: Some(10),
                avg_price: format!("{price:.2}"),
            });
        }
    }
    rows
}

fn detect_benchmark(c: &mut Criterion) {
    let detector = AnomalyDetector::default();
    let mut group = c.benchmark_group("anomaly_detect");

    for cities in [10, 81, 400] {
        let rows = summary_rows(cities);
        group.bench_with_input(BenchmarkId::from_parameter(cities), &rows, |b, rows| {
            b.iter(|| detector.detect(black_box(rows)));
        });
    }
    group.finish();
}

criterion_group!(benches, detect_benchmark);
criterion_main!(benches);
