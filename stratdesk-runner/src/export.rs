//! Result artifacts on disk — the server CSV download plus local exports
//! of the backtest trade tape and equity curve.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use stratdesk_core::api::types::TradeRow;
use stratdesk_core::domain::chart::SeriesPoint;

/// File name for a downloaded optimization results CSV.
pub fn results_csv_name(job_id: &str) -> String {
    format!("optimization_results_{job_id}.csv")
}

/// Write the server-provided CSV bytes under `dir`, creating it if needed.
pub fn save_results_csv(dir: &Path, job_id: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(results_csv_name(job_id));
    std::fs::write(&path, bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Export backtest trades as CSV. Column sets vary by strategy, so the
/// header is the sorted union of keys across all rows.
pub fn export_trades_csv(trades: &[TradeRow]) -> Result<String> {
    let columns: BTreeSet<&String> = trades.iter().flat_map(|row| row.keys()).collect();
    let columns: Vec<&String> = columns.into_iter().collect();

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(columns.iter().map(|c| c.as_str()))?;
    for row in trades {
        let record: Vec<String> = columns
            .iter()
            .map(|c| row.get(*c).map(value_to_cell).unwrap_or_default())
            .collect();
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export an equity or drawdown curve as CSV with time and value columns.
pub fn export_curve_csv(points: &[SeriesPoint], value_column: &str) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["time", value_column])?;
    for p in points {
        wtr.write_record([p.time.to_string(), format!("{:.2}", p.value)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn value_to_cell(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn download_name_embeds_job_id() {
        assert_eq!(results_csv_name("J42"), "optimization_results_J42.csv");
    }

    #[test]
    fn save_writes_bytes_under_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_results_csv(dir.path(), "J1", b"a,b\n1,2\n").unwrap();
        assert!(path.ends_with("optimization_results_J1.csv"));
        assert_eq!(std::fs::read(&path).unwrap(), b"a,b\n1,2\n");
    }

    #[test]
    fn trades_csv_uses_union_of_columns() {
        let trades: Vec<TradeRow> = vec![
            serde_json::from_value(json!({"entry_price": 101.5, "side": "BUY"})).unwrap(),
            serde_json::from_value(json!({"entry_price": 99.0, "pnl": -2.5})).unwrap(),
        ];
        let csv = export_trades_csv(&trades).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("entry_price,pnl,side"));
        assert_eq!(lines.next(), Some("101.5,,BUY"));
        assert_eq!(lines.next(), Some("99.0,-2.5,"));
    }

    #[test]
    fn curve_csv_rows() {
        let points = vec![
            SeriesPoint { time: 10, value: 100_000.0 },
            SeriesPoint { time: 20, value: 100_250.5 },
        ];
        let csv = export_curve_csv(&points, "equity").unwrap();
        assert_eq!(csv, "time,equity\n10,100000.00\n20,100250.50\n");
    }
}
