use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::location::Location;

/// Listing sources known to the crawler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Emlakjet,
    Tapu,
    Hepsiemlak,
}

impl Site {
    pub const ALL: [Site; 3] = [Site::Emlakjet, Site::Tapu, Site::Hepsiemlak];

    pub fn as_str(&self) -> &'static str {
        match self {
            Site::Emlakjet => "emlakjet",
            Site::Tapu => "tapu",
            Site::Hepsiemlak => "hepsiemlak",
        }
    }

    /// Origin used to resolve relative listing links
    pub fn base_url(&self) -> &'static str {
        match self {
            Site::Emlakjet => "https://www.emlakjet.com",
            Site::Tapu => "https://www.tapu.com",
            Site::Hepsiemlak => "https://www.hepsiemlak.com",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown listing site: {0}")]
pub struct UnknownSite(pub String);

impl FromStr for Site {
    type Err = UnknownSite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emlakjet" => Ok(Site::Emlakjet),
            "tapu" => Ok(Site::Tapu),
            "hepsiemlak" => Ok(Site::Hepsiemlak),
            other => Err(UnknownSite(other.to_string())),
        }
    }
}

/// One normalized real-estate offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub title: String,
    /// Asking price in TL
    pub price: u64,
    /// Normalized absolute URL; dedup key within one adapter call
    pub url: String,
    pub site: Site,
}

/// Per-listing output row of a single location run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRow {
    pub city: String,
    pub district: String,
    pub site: Site,
    pub title: String,
    pub price: u64,
    pub url: String,
}

impl DetailRow {
    pub fn from_listing(location: &Location, listing: &Listing) -> Self {
        Self {
            city: location.city.clone(),
            district: location.district.clone(),
            site: listing.site,
            title: listing.title.clone(),
            price: listing.price,
            url: listing.url.clone(),
        }
    }
}

/// Per (location, site) price summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub city: String,
    pub district: String,
    pub site: Site,
    pub num_listings: usize,
    pub avg_price: f64,
}

/// Arithmetic mean over strictly positive prices, `0.0` when there are none
pub fn average_price(listings: &[Listing]) -> f64 {
    let (sum, count) = listings
        .iter()
        .filter(|l| l.price > 0)
        .fold((0u128, 0usize), |(sum, count), l| (sum + u128::from(l.price), count + 1));

    if count == 0 {
        return 0.0;
    }
    sum as f64 / count as f64
}

/// Round to two decimals, the precision summaries are persisted with
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(price: u64, url: &str) -> Listing {
        Listing {
            title: "Daire".to_string(),
            price,
            url: url.to_string(),
            site: Site::Emlakjet,
        }
    }

    #[test]
    fn site_round_trips_through_str() {
        for site in Site::ALL {
            assert_eq!(site.as_str().parse::<Site>().unwrap(), site);
        }
        assert_eq!(" EmlakJet ".parse::<Site>().unwrap(), Site::Emlakjet);
        assert!("sahibinden".parse::<Site>().is_err());
    }

    #[test]
    fn average_ignores_zero_prices() {
        let listings = vec![listing(0, "a"), listing(100, "b"), listing(300, "c")];
        assert_eq!(average_price(&listings), 200.0);
        assert_eq!(average_price(&[listing(0, "a")]), 0.0);
        assert_eq!(average_price(&[]), 0.0);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(333_466.333_333), 333_466.33);
        assert_eq!(round2(200.0), 200.0);
    }
}
