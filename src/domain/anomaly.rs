//! Outlier annotations produced by the per-city anomaly detector

use serde::{Deserialize, Serialize};
use std::fmt;

use super::listing::SummaryRow;

/// Combined verdict of the IQR and z-score tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierFlag {
    Normal,
    IqrOrZ,
    Both,
}

impl OutlierFlag {
    pub const ALL: [OutlierFlag; 3] = [OutlierFlag::Normal, OutlierFlag::IqrOrZ, OutlierFlag::Both];

    pub fn from_tests(iqr_outlier: bool, zscore_outlier: bool) -> Self {
        match (iqr_outlier, zscore_outlier) {
            (false, false) => OutlierFlag::Normal,
            (true, true) => OutlierFlag::Both,
            _ => OutlierFlag::IqrOrZ,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutlierFlag::Normal => "normal",
            OutlierFlag::IqrOrZ => "iqr_or_z",
            OutlierFlag::Both => "both",
        }
    }
}

impl fmt::Display for OutlierFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A summary row as read back from disk: `avg_price` is still text and the
/// site column may be absent in hand-made inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSummaryRow {
    pub city: String,
    pub district: String,
    pub site: Option<String>,
    pub num_listings: Option<usize>,
    pub avg_price: String,
}

impl From<&SummaryRow> for RawSummaryRow {
    fn from(row: &SummaryRow) -> Self {
        Self {
            city: row.city.clone(),
            district: row.district.clone(),
            site: Some(row.site.to_string()),
            num_listings: Some(row.num_listings),
            avg_price: row.avg_price.to_string(),
        }
    }
}

/// City-level statistics a row was judged against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CityStats {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub mean: f64,
    /// Population std; epsilon-substituted when the group is constant
    pub std: f64,
}

/// A summary row annotated with its outlier verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierRow {
    pub city: String,
    pub district: String,
    pub site: String,
    pub num_listings: Option<usize>,
    pub avg_price: f64,
    pub zscore_city: f64,
    pub iqr_outlier: bool,
    pub zscore_outlier: bool,
    pub outlier_flag: OutlierFlag,
    pub stats: CityStats,
}

/// One line of the counts table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagCount {
    pub flag: String,
    pub count: usize,
}
