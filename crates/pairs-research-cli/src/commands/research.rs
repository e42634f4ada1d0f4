use std::path::Path;

use clap::Args;
use serde_json::Value;
use tracing::info;

use pairs_research_core::pipeline::{run_research as run_pipeline, ResearchConfig};

use super::{load_panel_args, PanelArgs};
use crate::input;
use crate::output::export;

/// Arguments for the full screen-then-backtest research run
#[derive(Args)]
pub struct ResearchArgs {
    #[command(flatten)]
    pub panel: PanelArgs,

    /// Research config file (JSON or YAML); a config piped on stdin is used otherwise
    #[arg(long)]
    pub config: Option<String>,

    /// Directory for the summary, z-score and PnL CSV files
    #[arg(long)]
    pub out_dir: Option<String>,
}

pub fn run_research(args: ResearchArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config: ResearchConfig = if let Some(ref path) = args.config {
        input::file::read_config(path)?
    } else if let Some(config) = input::stdin::read_stdin()? {
        config
    } else {
        return Err("--config <file.json|file.yaml> or stdin required for a research run".into());
    };

    let loaded = load_panel_args(&args.panel)?;
    let mut output = run_pipeline(&loaded.panel, &config)?;
    let mut warnings = loaded.warnings();
    warnings.append(&mut output.warnings);
    output.warnings = warnings;

    if let Some(ref dir) = args.out_dir {
        let dir = Path::new(dir);
        export::ensure_dir(dir)?;
        export::write_summary(&output.result.screening.summary, &dir.join(export::SUMMARY_FILE))?;
        for analysis in &output.result.analyses {
            export::write_spread_table(
                &analysis.spread_table,
                &export::pair_file(dir, "zscore", &analysis.pair),
            )?;
            export::write_pnl(
                &analysis.pnl,
                &analysis.summary.cumulative_pnl,
                &export::pair_file(dir, "pnl", &analysis.pair),
            )?;
        }
        info!(
            dir = %dir.display(),
            pairs = output.result.analyses.len(),
            "research outputs written"
        );
    }

    Ok(serde_json::to_value(output)?)
}
