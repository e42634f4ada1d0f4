use serde_json::Value;

use super::{format_value, result_of};

/// Print just the headline number of a result.
///
/// Looks for well-known fields in priority order, then falls back to the
/// first field of the result object.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    let priority_keys = [
        "p_value",
        "total_pnl",
        "latest_position",
        "latest_z_score",
        "divergences",
        "statistic",
        "hedge_ratio",
        "observations",
    ];

    if let Value::Object(map) = result {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_value(val));
                    return;
                }
            }
        }

        // Screen / research reports: one line per accepted pair
        let summary = map
            .get("summary")
            .or_else(|| map.get("screening").and_then(|s| s.get("summary")));
        if let Some(Value::Array(rows)) = summary {
            for row in rows {
                println!(
                    "{} {} {}",
                    row.get("pair").map(format_value).unwrap_or_default(),
                    row.get("p_value").map(format_value).unwrap_or_default(),
                    row.get("beta").map(format_value).unwrap_or_default(),
                );
            }
            return;
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_value(val));
            return;
        }
    }

    println!("{}", format_value(result));
}
