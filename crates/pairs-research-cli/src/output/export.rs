use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use pairs_research_core::cointegration::{CointegratedPair, SummaryRow};
use pairs_research_core::signals::SpreadRow;
use pairs_research_core::TimeSeries;

/// Cointegration summary file name inside an output directory.
pub const SUMMARY_FILE: &str = "cointegration_results.csv";

#[derive(Serialize)]
struct PnlRow {
    date: chrono::NaiveDate,
    pnl: rust_decimal::Decimal,
    cumulative_pnl: rust_decimal::Decimal,
}

/// `pair,p_value,beta`, one row per accepted pair.
pub fn write_summary(rows: &[SummaryRow], path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    write_rows(rows, path)
}

/// `date,spread,z_score` with an empty cell where the z-score is undefined.
pub fn write_spread_table(rows: &[SpreadRow], path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    write_rows(rows, path)
}

/// `date,pnl,cumulative_pnl`.
pub fn write_pnl(
    pnl: &TimeSeries,
    cumulative: &TimeSeries,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    pnl.ensure_aligned(cumulative)?;
    let rows: Vec<PnlRow> = pnl
        .iter()
        .zip(cumulative.values())
        .map(|((date, p), c)| PnlRow {
            date,
            pnl: *p,
            cumulative_pnl: *c,
        })
        .collect();
    write_rows(&rows, path)
}

/// Output path for a per-pair file, e.g. `zscore_ES=F_NQ=F.csv`.
pub fn pair_file(dir: &Path, prefix: &str, pair: &CointegratedPair) -> PathBuf {
    let stem: String = format!("{}_{}_{}", prefix, pair.symbol_a, pair.symbol_b)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || "=-_.".contains(c) { c } else { '_' })
        .collect();
    dir.join(format!("{}.csv", stem))
}

/// Create `dir` (and parents) if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create '{}': {}", dir.display(), e))?;
    Ok(())
}

fn write_rows<T: Serialize>(rows: &[T], path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
