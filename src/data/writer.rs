use crate::metrics::{EquityPoint, MetricsReport};
use crate::portfolio::Trade;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TradeRow {
    entry_timestamp: String,
    exit_timestamp: String,
    entry_price: f64,
    exit_price: f64,
    pnl: f64,
    duration_bars: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EquityRow {
    timestamp: String,
    equity: f64,
    drawdown_pct: f64,
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339()
}

//writes the trade ledger: entryTimestamp,exitTimestamp,entryPrice,exitPrice,pnl,durationBars
pub fn write_trades_csv<P: AsRef<Path>>(trades: &[Trade], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .context(format!("Failed to create trades file {:?}", path))?;

    for trade in trades {
        writer.serialize(TradeRow {
            entry_timestamp: format_timestamp(&trade.entry_timestamp),
            exit_timestamp: format_timestamp(&trade.exit_timestamp),
            entry_price: trade.entry_price,
            exit_price: trade.exit_price,
            pnl: trade.pnl,
            duration_bars: trade.duration_bars,
        })?;
    }

    //an empty ledger still gets its header
    if trades.is_empty() {
        writer.write_record([
            "entryTimestamp",
            "exitTimestamp",
            "entryPrice",
            "exitPrice",
            "pnl",
            "durationBars",
        ])?;
    }

    writer.flush()?;
    Ok(())
}

//writes the equity curve: timestamp,equity,drawdownPct
pub fn write_equity_csv<P: AsRef<Path>>(equity_curve: &[EquityPoint], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .context(format!("Failed to create equity file {:?}", path))?;

    for point in equity_curve {
        writer.serialize(EquityRow {
            timestamp: format_timestamp(&point.timestamp),
            equity: point.equity,
            drawdown_pct: point.drawdown_pct,
        })?;
    }

    if equity_curve.is_empty() {
        writer.write_record(["timestamp", "equity", "drawdownPct"])?;
    }

    writer.flush()?;
    Ok(())
}

//writes the metrics report as a flat json object
pub fn write_metrics_json<P: AsRef<Path>>(report: &MetricsReport, path: P) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).context(format!("Failed to write metrics file {:?}", path))?;
    Ok(())
}
