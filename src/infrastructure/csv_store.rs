//! CSV persistence for survey outputs and inputs
//!
//! Minimal RFC-4180 handling: quoted fields, doubled quotes, CRLF tolerant.
//! Files written for spreadsheet users carry a UTF-8 BOM; readers strip it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::mem::take;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{DetailRow, FlagCount, Location, OutlierRow, RawSummaryRow, SummaryRow};

const BOM: &str = "\u{feff}";

pub const DETAIL_HEADERS: [&str; 6] = ["city", "district", "site", "title", "price", "url"];
pub const SUMMARY_HEADERS: [&str; 5] = ["city", "district", "site", "num_listings", "avg_price"];
pub const OUTLIER_HEADERS: [&str; 16] = [
    "city",
    "district",
    "site",
    "num_listings",
    "avg_price",
    "zscore_city",
    "iqr_outlier",
    "zscore_outlier",
    "outlier_flag",
    "city_q1",
    "city_q3",
    "city_iqr",
    "city_lower_bound",
    "city_upper_bound",
    "city_mean",
    "city_std",
];
pub const FLAG_COUNT_HEADERS: [&str; 2] = ["flag", "count"];

pub const ALL_ROWS_FILE: &str = "all_rows.csv";
pub const FLAGGED_ROWS_FILE: &str = "flagged_rows.csv";
pub const FLAG_COUNTS_FILE: &str = "flag_counts.csv";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path:?} has no column named any of {expected:?}")]
    MissingColumn { path: PathBuf, expected: Vec<String> },

    #[error("{path:?} is empty")]
    Empty { path: PathBuf },
}

pub type StoreResult<T> = Result<T, StoreError>;

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/* ---------------- Parsing ---------------- */

/// Split CSV text into rows of fields; blank lines are dropped
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if row.len() == 1 && row[0].is_empty() {
                    row.clear();
                } else {
                    rows.push(take(&mut row));
                }
            }
            _ => field.push(ch),
        }
    }

    // Trailing row without a final newline
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

/* ---------------- Writing ---------------- */

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV row to any writer
pub fn write_row<W: Write, S: AsRef<str>>(w: &mut W, row: &[S]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    writeln!(w)
}

fn ensure_parent(path: &Path) -> StoreResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(io_error(parent))
        }
        _ => Ok(()),
    }
}

/// Create (or truncate) `path` and write a header plus rows
pub fn write_table<S: AsRef<str>>(path: &Path, headers: &[S], rows: &[Vec<String>], with_bom: bool) -> StoreResult<()> {
    ensure_parent(path)?;
    let file = File::create(path).map_err(io_error(path))?;
    let mut w = BufWriter::new(file);

    let write = |w: &mut BufWriter<File>| -> io::Result<()> {
        if with_bom {
            w.write_all(BOM.as_bytes())?;
        }
        write_row(w, headers)?;
        for row in rows {
            write_row(w, row)?;
        }
        w.flush()
    };
    write(&mut w).map_err(io_error(path))?;

    debug!("Wrote {} rows to {:?}", rows.len(), path);
    Ok(())
}

/* ---------------- Tables ---------------- */

/// A header row plus data rows, columns looked up by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn from_text(text: &str) -> Option<Self> {
        let mut rows = parse_rows(text).into_iter();
        let headers = rows.next()?.into_iter().map(|h| h.trim().to_string()).collect();
        Some(Self {
            headers,
            rows: rows.collect(),
        })
    }

    /// Index of the first header matching any of `names` (case-insensitive)
    pub fn column(&self, names: &[&str]) -> Option<usize> {
        names
            .iter()
            .find_map(|name| self.headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
    }

    fn required_column(&self, path: &Path, names: &[&str]) -> StoreResult<usize> {
        self.column(names).ok_or_else(|| StoreError::MissingColumn {
            path: path.to_path_buf(),
            expected: names.iter().map(|n| (*n).to_string()).collect(),
        })
    }

    pub fn cell<'a>(row: &'a [String], index: usize) -> &'a str {
        row.get(index).map_or("", |c| c.trim())
    }
}

pub fn read_table(path: &Path) -> StoreResult<CsvTable> {
    let text = fs::read_to_string(path).map_err(io_error(path))?;
    CsvTable::from_text(&text).ok_or_else(|| StoreError::Empty {
        path: path.to_path_buf(),
    })
}

/* ---------------- Survey outputs ---------------- */

/// `listings_<City>_<District>.csv` inside `directory`
pub fn detail_path(directory: &Path, location: &Location) -> PathBuf {
    directory.join(format!("listings_{}.csv", location.file_label()))
}

/// Write one location's detail rows (BOM-prefixed for spreadsheet apps)
pub fn write_details(directory: &Path, location: &Location, rows: &[DetailRow]) -> StoreResult<PathBuf> {
    let path = detail_path(directory, location);
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.city.clone(),
                r.district.clone(),
                r.site.to_string(),
                r.title.clone(),
                r.price.to_string(),
                r.url.clone(),
            ]
        })
        .collect();
    write_table(&path, &DETAIL_HEADERS, &rows, true)?;
    info!("💾 {} detail rows saved to {:?}", rows.len(), path);
    Ok(path)
}

fn summary_record(row: &SummaryRow) -> Vec<String> {
    vec![
        row.city.clone(),
        row.district.clone(),
        row.site.to_string(),
        row.num_listings.to_string(),
        row.avg_price.to_string(),
    ]
}

/// Append summary rows to a cumulative file; the header is written only when
/// the file is new or empty
pub fn append_summaries(path: &Path, rows: &[SummaryRow]) -> StoreResult<()> {
    ensure_parent(path)?;
    let is_new = fs::metadata(path).map_or(true, |m| m.len() == 0);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_error(path))?;
    let mut w = BufWriter::new(file);

    let write = |w: &mut BufWriter<File>| -> io::Result<()> {
        if is_new {
            write_row(w, &SUMMARY_HEADERS)?;
        }
        for row in rows {
            write_row(w, &summary_record(row))?;
        }
        w.flush()
    };
    write(&mut w).map_err(io_error(path))?;

    info!("📊 {} summary rows appended to {:?}", rows.len(), path);
    Ok(())
}

/// Replace `path` with the given summary rows
pub fn write_summaries(path: &Path, rows: &[SummaryRow]) -> StoreResult<()> {
    let records: Vec<Vec<String>> = rows.iter().map(summary_record).collect();
    write_table(path, &SUMMARY_HEADERS, &records, false)
}

fn outlier_record(row: &OutlierRow) -> Vec<String> {
    vec![
        row.city.clone(),
        row.district.clone(),
        row.site.clone(),
        row.num_listings.map(|n| n.to_string()).unwrap_or_default(),
        row.avg_price.to_string(),
        row.zscore_city.to_string(),
        row.iqr_outlier.to_string(),
        row.zscore_outlier.to_string(),
        row.outlier_flag.to_string(),
        row.stats.q1.to_string(),
        row.stats.q3.to_string(),
        row.stats.iqr.to_string(),
        row.stats.lower_bound.to_string(),
        row.stats.upper_bound.to_string(),
        row.stats.mean.to_string(),
        row.stats.std.to_string(),
    ]
}

pub fn write_outlier_rows(path: &Path, rows: &[OutlierRow]) -> StoreResult<()> {
    let records: Vec<Vec<String>> = rows.iter().map(outlier_record).collect();
    write_table(path, &OUTLIER_HEADERS, &records, true)
}

pub fn write_flag_counts(path: &Path, counts: &[FlagCount]) -> StoreResult<()> {
    let records: Vec<Vec<String>> = counts
        .iter()
        .map(|c| vec![c.flag.clone(), c.count.to_string()])
        .collect();
    write_table(path, &FLAG_COUNT_HEADERS, &records, true)
}

/* ---------------- Inputs ---------------- */

/// Locations from a CSV with an `il,ilce` or `city,district` header
pub fn read_locations(path: &Path) -> StoreResult<Vec<Location>> {
    let table = read_table(path)?;
    let city = table.required_column(path, &["il", "city"])?;
    let district = table.required_column(path, &["ilce", "ilçe", "district"])?;

    let mut locations = Vec::with_capacity(table.rows.len());
    for (index, row) in table.rows.iter().enumerate() {
        let (c, d) = (CsvTable::cell(row, city), CsvTable::cell(row, district));
        if c.is_empty() || d.is_empty() {
            warn!("Skipping location row {} of {:?}: missing city or district", index + 2, path);
            continue;
        }
        locations.push(Location::new(c, d));
    }

    info!("📍 {} locations read from {:?}", locations.len(), path);
    Ok(locations)
}

/// Summary rows for anomaly detection; `city` and `avg_price` are required,
/// `district`, `site` and `num_listings` are read when present
pub fn read_summaries(path: &Path) -> StoreResult<Vec<RawSummaryRow>> {
    let table = read_table(path)?;
    let city = table.required_column(path, &["city", "il"])?;
    let avg_price = table.required_column(path, &["avg_price"])?;
    let district = table.column(&["district", "ilce"]);
    let site = table.column(&["site"]);
    let num_listings = table.column(&["num_listings"]);

    Ok(table
        .rows
        .iter()
        .map(|row| RawSummaryRow {
            city: CsvTable::cell(row, city).to_string(),
            district: district.map(|i| CsvTable::cell(row, i).to_string()).unwrap_or_default(),
            site: site.map(|i| CsvTable::cell(row, i).to_string()),
            num_listings: num_listings.and_then(|i| CsvTable::cell(row, i).parse().ok()),
            avg_price: CsvTable::cell(row, avg_price).to_string(),
        })
        .collect())
}

/// Copy the rows of `input` whose `site` column equals `site` into `output`;
/// returns the number of rows kept
pub fn filter_site(input: &Path, site: &str, output: &Path) -> StoreResult<usize> {
    let table = read_table(input)?;
    let column = table.required_column(input, &["site"])?;

    let kept: Vec<Vec<String>> = table
        .rows
        .into_iter()
        .filter(|row| CsvTable::cell(row, column) == site)
        .collect();

    write_table(output, &table.headers, &kept, true)?;
    info!("Kept {} '{}' rows from {:?} in {:?}", kept.len(), site, input, output);
    Ok(kept.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Site, SummaryRow};

    fn summary(city: &str, district: &str, site: Site, n: usize, avg: f64) -> SummaryRow {
        SummaryRow {
            city: city.to_string(),
            district: district.to_string(),
            site,
            num_listings: n,
            avg_price: avg,
        }
    }

    #[test]
    fn test_parse_rows_quotes_and_crlf() {
        let rows = parse_rows("\u{feff}a,b\r\n\"x, y\",\"say \"\"hi\"\"\"\r\n\r\nlast,row");
        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["x, y".to_string(), "say \"hi\"".to_string()],
                vec!["last".to_string(), "row".to_string()],
            ]
        );
    }

    #[test]
    fn test_write_row_quotes_when_needed() {
        let mut buf = Vec::new();
        write_row(&mut buf, &["plain", "3+1, Ferah", "22\" TV"]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "plain,\"3+1, Ferah\",\"22\"\" TV\"\n");
    }

    #[test]
    fn test_details_have_bom_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let location = Location::new("Adana", "Çukurova");
        let rows = vec![DetailRow {
            city: "Adana".to_string(),
            district: "Çukurova".to_string(),
            site: Site::Emlakjet,
            title: "2+1, site içi".to_string(),
            price: 1_500_000,
            url: "https://www.emlakjet.com/ilan/1".to_string(),
        }];

        let path = write_details(dir.path(), &location, &rows).unwrap();
        assert!(path.ends_with("listings_Adana_Çukurova.csv"));

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with('\u{feff}'));
        assert!(text.contains("city,district,site,title,price,url\n"));
        assert!(text.contains("\"2+1, site içi\",1500000"));
    }

    #[test]
    fn test_summary_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ozet.csv");

        append_summaries(&path, &[summary("Adana", "Seyhan", Site::Emlakjet, 3, 200.0)]).unwrap();
        append_summaries(&path, &[summary("Adana", "Cukurova", Site::Tapu, 2, 150.5)]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("num_listings").count(), 1);
        assert_eq!(text.lines().count(), 3);
        assert!(text.ends_with("Adana,Cukurova,tapu,2,150.5\n"));
    }

    #[test]
    fn test_read_locations_accepts_turkish_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("il_ilce.csv");
        fs::write(&path, "il,ilce\nAdana,Aladağ\n,Eksik\nAdana, Ceyhan \n").unwrap();

        let locations = read_locations(&path).unwrap();
        assert_eq!(
            locations,
            vec![Location::new("Adana", "Aladağ"), Location::new("Adana", "Ceyhan")]
        );
    }

    #[test]
    fn test_read_locations_requires_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "name,value\nx,y\n").unwrap();
        assert!(matches!(read_locations(&path), Err(StoreError::MissingColumn { .. })));
    }

    #[test]
    fn test_read_summaries_without_site_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ozet.csv");
        fs::write(&path, "city,district,avg_price\nAdana,Seyhan,1200.5\nAdana,Ceyhan,n/a\n").unwrap();

        let rows = read_summaries(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].site, None);
        assert_eq!(rows[0].avg_price, "1200.5");
        assert_eq!(rows[1].avg_price, "n/a");
    }

    #[test]
    fn test_filter_site_keeps_matching_rows() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("all.csv");
        let output = dir.path().join("emlakjet.csv");
        write_summaries(
            &input,
            &[
                summary("Adana", "Seyhan", Site::Emlakjet, 3, 200.0),
                summary("Adana", "Seyhan", Site::Tapu, 2, 150.0),
                summary("Adana", "Ceyhan", Site::Emlakjet, 4, 300.0),
            ],
        )
        .unwrap();

        assert_eq!(filter_site(&input, "emlakjet", &output).unwrap(), 2);
        let table = read_table(&output).unwrap();
        assert_eq!(table.headers, SUMMARY_HEADERS.map(String::from).to_vec());
        assert!(table.rows.iter().all(|r| r[2] == "emlakjet"));
    }
}
