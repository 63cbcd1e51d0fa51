//! Per-city price anomaly detection
//!
//! Summary rows are grouped by city and every district average is judged
//! against its own city: once with Tukey fences on the interquartile range
//! and once with a population z-score. The two verdicts are folded into a
//! single [`OutlierFlag`].

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::domain::{CityStats, FlagCount, OutlierFlag, OutlierRow, RawSummaryRow};
use crate::infrastructure::config::AnomalySettings;
use crate::infrastructure::csv_store::{
    self, ALL_ROWS_FILE, FLAG_COUNTS_FILE, FLAGGED_ROWS_FILE, StoreResult,
};

/// Label of the grand-total line in the counts table
pub const TOTAL_LABEL: &str = "total";

/// Annotated rows plus the flagged subset and the counts table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnomalyReport {
    /// Every analysed row, grouped by city in city order
    pub rows: Vec<OutlierRow>,
    /// Rows whose flag is not `normal`
    pub flagged: Vec<OutlierRow>,
    /// `normal`, `iqr_or_z`, `both` then `total`
    pub counts: Vec<FlagCount>,
}

impl AnomalyReport {
    pub fn count_of(&self, flag: OutlierFlag) -> usize {
        self.rows.iter().filter(|r| r.outlier_flag == flag).count()
    }

    /// Write `all_rows.csv`, `flagged_rows.csv` and `flag_counts.csv` into `directory`
    pub fn write_to(&self, directory: &Path) -> StoreResult<()> {
        csv_store::write_outlier_rows(&directory.join(ALL_ROWS_FILE), &self.rows)?;
        csv_store::write_outlier_rows(&directory.join(FLAGGED_ROWS_FILE), &self.flagged)?;
        csv_store::write_flag_counts(&directory.join(FLAG_COUNTS_FILE), &self.counts)?;
        info!("📁 Anomaly tables written to {:?}", directory);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    /// Empty string disables the site filter
    site: String,
    iqr_multiplier: f64,
    z_threshold: f64,
    std_epsilon: f64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::from_settings(&AnomalySettings::default())
    }
}

impl AnomalyDetector {
    pub fn from_settings(settings: &AnomalySettings) -> Self {
        Self {
            site: settings.site.trim().to_string(),
            iqr_multiplier: settings.iqr_multiplier,
            z_threshold: settings.z_threshold,
            std_epsilon: settings.std_epsilon,
        }
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into().trim().to_string();
        self
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn detect(&self, rows: &[RawSummaryRow]) -> AnomalyReport {
        let mut by_city: BTreeMap<&str, Vec<(&RawSummaryRow, f64)>> = BTreeMap::new();
        let mut dropped = 0usize;

        for row in rows.iter().filter(|r| self.keeps_site(r)) {
            match parse_price(&row.avg_price) {
                Some(price) => by_city.entry(row.city.as_str()).or_default().push((row, price)),
                None => {
                    dropped += 1;
                    debug!("Dropping {}/{}: avg_price {:?} is not a number", row.city, row.district, row.avg_price);
                }
            }
        }
        if dropped > 0 {
            warn!("{} summary rows dropped for a non-numeric avg_price", dropped);
        }

        let mut report = AnomalyReport::default();
        for (city, members) in by_city {
            let prices: Vec<f64> = members.iter().map(|(_, price)| *price).collect();
            let stats = self.city_stats(&prices);
            debug!(city, ?stats, "City statistics");

            for (row, price) in members {
                report.rows.push(self.judge(row, price, stats));
            }
        }

        report.flagged = report
            .rows
            .iter()
            .filter(|r| r.outlier_flag != OutlierFlag::Normal)
            .cloned()
            .collect();
        report.counts = OutlierFlag::ALL
            .iter()
            .map(|flag| FlagCount {
                flag: flag.to_string(),
                count: report.count_of(*flag),
            })
            .chain(std::iter::once(FlagCount {
                flag: TOTAL_LABEL.to_string(),
                count: report.rows.len(),
            }))
            .collect();

        info!(
            "Analysed {} rows: {} flagged ({} by both tests)",
            report.rows.len(),
            report.flagged.len(),
            report.count_of(OutlierFlag::Both)
        );
        report
    }

    fn keeps_site(&self, row: &RawSummaryRow) -> bool {
        match (&row.site, self.site.is_empty()) {
            (_, true) | (None, _) => true,
            (Some(site), false) => site.trim().eq_ignore_ascii_case(&self.site),
        }
    }

    fn city_stats(&self, prices: &[f64]) -> CityStats {
        let mut sorted = prices.to_vec();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let mean = prices.iter().sum::<f64>() / prices.len() as f64;
        let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / prices.len() as f64;
        let std = match variance.sqrt() {
            s if s == 0.0 => self.std_epsilon,
            s => s,
        };

        CityStats {
            q1,
            q3,
            iqr,
            lower_bound: q1 - self.iqr_multiplier * iqr,
            upper_bound: q3 + self.iqr_multiplier * iqr,
            mean,
            std,
        }
    }

    fn judge(&self, row: &RawSummaryRow, price: f64, stats: CityStats) -> OutlierRow {
        let zscore_city = (price - stats.mean) / stats.std;
        let iqr_outlier = price < stats.lower_bound || price > stats.upper_bound;
        let zscore_outlier = zscore_city.abs() >= self.z_threshold;

        OutlierRow {
            city: row.city.clone(),
            district: row.district.clone(),
            site: row.site.clone().unwrap_or_default(),
            num_listings: row.num_listings,
            avg_price: price,
            zscore_city,
            iqr_outlier,
            zscore_outlier,
            outlier_flag: OutlierFlag::from_tests(iqr_outlier, zscore_outlier),
            stats,
        }
    }
}

fn parse_price(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Quantile of an ascending slice by linear interpolation at `(n-1)·q`.
/// The slice must not be empty; every city group has at least one row.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty(), "quantile of an empty group");
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
