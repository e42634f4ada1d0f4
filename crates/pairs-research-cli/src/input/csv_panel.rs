use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use pairs_research_core::data::PriceSource;
use pairs_research_core::{PairsError, PairsResult, PricePanel, TimeSeries};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Closing prices stored as one `<symbol>.csv` per instrument.
///
/// The first column is the date and the second the close. Rows whose first
/// cell is not a date (header lines) and rows with an empty close are skipped.
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch_closes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> PairsResult<TimeSeries> {
        let path = self.path_for(symbol);
        let unavailable = |reason: String| PairsError::DataUnavailable {
            symbol: symbol.to_string(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .map_err(|e| unavailable(format!("cannot open {}: {}", path.display(), e)))?;

        let mut points = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| unavailable(e.to_string()))?;
            let date = match record.get(0).and_then(|d| NaiveDate::parse_from_str(d.trim(), DATE_FORMAT).ok()) {
                Some(d) => d,
                None => continue,
            };
            let close = record.get(1).map(str::trim).unwrap_or_default();
            if close.is_empty() {
                continue;
            }
            let close = parse_price(close).ok_or_else(|| {
                unavailable(format!("line {}: invalid close '{}'", line + 1, close))
            })?;
            points.push((date, close));
        }

        let series = TimeSeries::from_points(symbol, points)?.between(start, end);
        if series.is_empty() {
            return Err(unavailable(format!(
                "no prices between {} and {} in {}",
                start,
                end,
                path.display()
            )));
        }
        Ok(series)
    }
}

/// Read a merged panel CSV: a `date` column followed by one column per symbol.
pub fn read_panel(path: &Path) -> Result<PricePanel, Box<dyn std::error::Error>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(format!("'{}' has no symbol columns", path.display()).into());
    }
    let symbols: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut dates = Vec::new();
    let mut columns: Vec<Vec<Decimal>> = vec![Vec::new(); symbols.len()];
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date.trim(), DATE_FORMAT)
            .map_err(|e| format!("line {}: invalid date '{}': {}", line + 2, raw_date, e))?;
        dates.push(date);
        for (col, symbol) in symbols.iter().enumerate() {
            let cell = record.get(col + 1).unwrap_or_default();
            let price = parse_price(cell)
                .ok_or_else(|| format!("line {}: invalid {} price '{}'", line + 2, symbol, cell))?;
            columns[col].push(price);
        }
    }

    let series = symbols
        .into_iter()
        .zip(columns)
        .map(|(symbol, values)| TimeSeries::new(symbol, dates.clone(), values))
        .collect::<PairsResult<Vec<_>>>()?;
    Ok(PricePanel::merge(&series)?)
}

/// Write a panel as `date,SYM1,SYM2,...`.
pub fn write_panel(panel: &PricePanel, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
    let mut header = vec!["date".to_string()];
    header.extend(panel.symbols().iter().cloned());
    wtr.write_record(&header)?;
    for (date, row) in panel.rows() {
        let mut record = vec![date.format(DATE_FORMAT).to_string()];
        record.extend(row.iter().map(Decimal::to_string));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn parse_price(cell: &str) -> Option<Decimal> {
    let cell = cell.trim();
    Decimal::from_str(cell)
        .or_else(|_| Decimal::from_scientific(cell))
        .ok()
}
