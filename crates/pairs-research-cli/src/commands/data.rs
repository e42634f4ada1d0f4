use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use pairs_research_core::data::UnavailableSymbol;

use super::{load_panel_args, PanelArgs};
use crate::input::csv_panel::write_panel;
use crate::output::export::ensure_dir;

/// Arguments for merging per-symbol closes into one panel
#[derive(Args)]
pub struct MergeArgs {
    #[command(flatten)]
    pub panel: PanelArgs,

    /// Write the merged panel to this CSV file
    #[arg(long)]
    pub out: Option<String>,
}

#[derive(Serialize)]
struct MergeOutput {
    symbols: Vec<String>,
    observations: usize,
    first_date: Option<NaiveDate>,
    last_date: Option<NaiveDate>,
    unavailable: Vec<UnavailableSymbol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    written_to: Option<String>,
}

pub fn run_merge(args: MergeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let loaded = load_panel_args(&args.panel)?;
    let warnings = loaded.warnings();
    let panel = &loaded.panel;

    let written_to = match args.out {
        Some(ref out) => {
            let path = PathBuf::from(out);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                ensure_dir(parent)?;
            }
            write_panel(panel, &path)?;
            info!(path = %path.display(), rows = panel.len(), "merged panel written");
            Some(path.display().to_string())
        }
        None => None,
    };

    let output = MergeOutput {
        symbols: panel.symbols().to_vec(),
        observations: panel.len(),
        first_date: panel.index().first().copied(),
        last_date: panel.index().last().copied(),
        unavailable: loaded.unavailable.clone(),
        written_to,
    };

    super::envelope(
        "Inner join of daily closes on date; rows with any missing close dropped",
        &json!({
            "symbols": args.panel.symbols,
            "start": args.panel.start,
            "end_exclusive": args.panel.end,
        }),
        warnings,
        start,
        output,
    )
}
