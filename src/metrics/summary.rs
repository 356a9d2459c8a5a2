use crate::metrics::timeseries::{calculate_returns, drawdown_runs, max_drawdown_pct, EquityPoint};
use crate::portfolio::Trade;
use indexmap::IndexMap;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const CALENDAR_DAYS_PER_YEAR: f64 = 365.0;

//report keys, in output order
pub const METRIC_KEYS: [&str; 21] = [
    "durationDays",
    "exposurePct",
    "equityFinal",
    "equityPeak",
    "returnPct",
    "buyAndHoldReturnPct",
    "returnAnnualPct",
    "volatilityAnnualPct",
    "sharpeRatio",
    "sortinoRatio",
    "maxDrawdownPct",
    "calmarRatio",
    "maxDrawdownDuration",
    "avgDrawdownDuration",
    "tradeCount",
    "winRatePct",
    "bestTradePct",
    "worstTradePct",
    "avgTradePct",
    "maxTradeDuration",
    "avgTradeDuration",
];

//summary metrics for a backtest
//every degenerate case (no trades, zero variance, zero duration) resolves to 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    pub duration_days: f64,
    pub exposure_pct: f64,
    pub equity_final: f64,
    pub equity_peak: f64,
    pub return_pct: f64,
    pub buy_and_hold_return_pct: f64,
    pub return_annual_pct: f64,
    pub volatility_annual_pct: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown_pct: f64,
    pub calmar_ratio: f64,
    pub max_drawdown_duration: usize,
    pub avg_drawdown_duration: f64,
    pub trade_count: usize,
    pub win_rate_pct: f64,
    pub best_trade_pct: f64,
    pub worst_trade_pct: f64,
    pub avg_trade_pct: f64,
    pub max_trade_duration: usize,
    pub avg_trade_duration: f64,
}

//flat string-keyed view of the summary with a fixed key set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricsReport(IndexMap<String, f64>);

impl MetricsReport {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl SummaryMetrics {
    //calculate summary metrics from equity curve and trade ledger
    //closes is the raw price series used for the buy-and-hold comparison
    pub fn from_backtest(
        equity_curve: &[EquityPoint],
        trades: &[Trade],
        initial_balance: f64,
        closes: Option<&[f64]>,
    ) -> Self {
        //the two groups share nothing mutable
        let (equity, trade) = rayon::join(
            || EquityStats::compute(equity_curve, initial_balance),
            || TradeStats::compute(trades),
        );

        let buy_and_hold_return_pct = closes.map(buy_and_hold_return_pct).unwrap_or(0.0);

        SummaryMetrics {
            duration_days: equity.duration_days,
            exposure_pct: equity.exposure_pct,
            equity_final: equity.equity_final,
            equity_peak: equity.equity_peak,
            return_pct: equity.return_pct,
            buy_and_hold_return_pct,
            return_annual_pct: equity.return_annual_pct,
            volatility_annual_pct: equity.volatility_annual_pct,
            sharpe_ratio: equity.sharpe_ratio,
            sortino_ratio: equity.sortino_ratio,
            max_drawdown_pct: equity.max_drawdown_pct,
            calmar_ratio: equity.calmar_ratio,
            max_drawdown_duration: equity.max_drawdown_duration,
            avg_drawdown_duration: equity.avg_drawdown_duration,
            trade_count: trade.trade_count,
            win_rate_pct: trade.win_rate_pct,
            best_trade_pct: trade.best_trade_pct,
            worst_trade_pct: trade.worst_trade_pct,
            avg_trade_pct: trade.avg_trade_pct,
            max_trade_duration: trade.max_trade_duration,
            avg_trade_duration: trade.avg_trade_duration,
        }
    }

    //flattens into the fixed-key report
    pub fn to_report(&self) -> MetricsReport {
        let values = [
            self.duration_days,
            self.exposure_pct,
            self.equity_final,
            self.equity_peak,
            self.return_pct,
            self.buy_and_hold_return_pct,
            self.return_annual_pct,
            self.volatility_annual_pct,
            self.sharpe_ratio,
            self.sortino_ratio,
            self.max_drawdown_pct,
            self.calmar_ratio,
            self.max_drawdown_duration as f64,
            self.avg_drawdown_duration,
            self.trade_count as f64,
            self.win_rate_pct,
            self.best_trade_pct,
            self.worst_trade_pct,
            self.avg_trade_pct,
            self.max_trade_duration as f64,
            self.avg_trade_duration,
        ];

        MetricsReport(
            METRIC_KEYS
                .iter()
                .zip(values)
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        )
    }

    //builds a formatted table of the metrics
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();

        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));

        let rows: Vec<(&str, String)> = vec![
            ("Duration", format!("{} days", self.duration_days)),
            ("Exposure Time", format!("{:.2}%", self.exposure_pct)),
            ("Equity Final", format!("${:.2}", self.equity_final)),
            ("Equity Peak", format!("${:.2}", self.equity_peak)),
            ("Return", format!("{:.2}%", self.return_pct)),
            (
                "Buy & Hold Return",
                format!("{:.2}%", self.buy_and_hold_return_pct),
            ),
            ("Return (Ann.)", format!("{:.2}%", self.return_annual_pct)),
            (
                "Volatility (Ann.)",
                format!("{:.2}%", self.volatility_annual_pct),
            ),
            ("Sharpe Ratio", format!("{:.3}", self.sharpe_ratio)),
            ("Sortino Ratio", format!("{:.3}", self.sortino_ratio)),
            ("Calmar Ratio", format!("{:.3}", self.calmar_ratio)),
            ("Max Drawdown", format!("{:.2}%", self.max_drawdown_pct)),
            (
                "Max Drawdown Duration",
                format!("{} bars", self.max_drawdown_duration),
            ),
            (
                "Avg Drawdown Duration",
                format!("{:.1} bars", self.avg_drawdown_duration),
            ),
            ("Number of Trades", format!("{}", self.trade_count)),
            ("Win Rate", format!("{:.2}%", self.win_rate_pct)),
            ("Best Trade", format!("{:.2}%", self.best_trade_pct)),
            ("Worst Trade", format!("{:.2}%", self.worst_trade_pct)),
            ("Avg Trade", format!("{:.2}%", self.avg_trade_pct)),
            (
                "Max Trade Duration",
                format!("{} bars", self.max_trade_duration),
            ),
            (
                "Avg Trade Duration",
                format!("{:.1} bars", self.avg_trade_duration),
            ),
        ];

        for (label, value) in rows {
            table.add_row(Row::new(vec![Cell::new(label), Cell::new(&value)]));
        }

        table
    }

    //prints metrics in a formatted table
    pub fn pretty_print_table(&self) {
        self.to_table().printstd();
    }
}

struct EquityStats {
    duration_days: f64,
    exposure_pct: f64,
    equity_final: f64,
    equity_peak: f64,
    return_pct: f64,
    return_annual_pct: f64,
    volatility_annual_pct: f64,
    sharpe_ratio: f64,
    sortino_ratio: f64,
    max_drawdown_pct: f64,
    calmar_ratio: f64,
    max_drawdown_duration: usize,
    avg_drawdown_duration: f64,
}

impl EquityStats {
    fn compute(equity_curve: &[EquityPoint], initial_balance: f64) -> Self {
        let equity_values: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();

        let equity_final = equity_values.last().copied().unwrap_or(initial_balance);
        let equity_peak = equity_values
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let equity_peak = if equity_peak.is_finite() {
            equity_peak
        } else {
            initial_balance
        };

        let duration_days = match (equity_curve.first(), equity_curve.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_days() as f64,
            _ => 0.0,
        };

        let exposure_pct = if equity_curve.is_empty() {
            0.0
        } else {
            let exposed = equity_curve.iter().filter(|p| p.exposed).count();
            exposed as f64 / equity_curve.len() as f64 * 100.0
        };

        let return_pct = if initial_balance != 0.0 {
            (equity_final - initial_balance) / initial_balance * 100.0
        } else {
            0.0
        };

        let return_annual_pct = if duration_days > 0.0 {
            finite_or_zero(
                ((1.0 + return_pct / 100.0).powf(CALENDAR_DAYS_PER_YEAR / duration_days) - 1.0)
                    * 100.0,
            )
        } else {
            0.0
        };

        let returns = calculate_returns(&equity_values);
        let mean = mean(&returns);
        let std_dev = sample_std_dev(&returns);
        let annualizer = TRADING_DAYS_PER_YEAR.sqrt();

        let volatility_annual_pct = std_dev * annualizer * 100.0;

        let sharpe_ratio = if std_dev > 0.0 {
            finite_or_zero(mean / std_dev * annualizer)
        } else {
            0.0
        };

        //downside deviation over negative returns only
        let negative_returns: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
        let downside_dev = sample_std_dev(&negative_returns);
        let sortino_ratio = if downside_dev > 0.0 {
            finite_or_zero(mean / downside_dev * annualizer)
        } else {
            0.0
        };

        let max_drawdown_pct = max_drawdown_pct(equity_curve);
        let calmar_ratio = if max_drawdown_pct != 0.0 {
            finite_or_zero(return_annual_pct / max_drawdown_pct.abs())
        } else {
            0.0
        };

        let runs = drawdown_runs(&equity_values);
        let max_drawdown_duration = runs.iter().copied().fold(0, usize::max);
        let avg_drawdown_duration = if runs.is_empty() {
            0.0
        } else {
            runs.iter().sum::<usize>() as f64 / runs.len() as f64
        };

        EquityStats {
            duration_days,
            exposure_pct,
            equity_final,
            equity_peak,
            return_pct,
            return_annual_pct,
            volatility_annual_pct,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown_pct,
            calmar_ratio,
            max_drawdown_duration,
            avg_drawdown_duration,
        }
    }
}

struct TradeStats {
    trade_count: usize,
    win_rate_pct: f64,
    best_trade_pct: f64,
    worst_trade_pct: f64,
    avg_trade_pct: f64,
    max_trade_duration: usize,
    avg_trade_duration: f64,
}

impl TradeStats {
    fn compute(trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return TradeStats {
                trade_count: 0,
                win_rate_pct: 0.0,
                best_trade_pct: 0.0,
                worst_trade_pct: 0.0,
                avg_trade_pct: 0.0,
                max_trade_duration: 0,
                avg_trade_duration: 0.0,
            };
        }

        let total = trades.len() as f64;
        let winners = trades.iter().filter(|t| t.is_winner()).count();

        let pnl_pcts: Vec<f64> = trades.iter().map(|t| t.pnl_pct).collect();
        let best_trade_pct = pnl_pcts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let worst_trade_pct = pnl_pcts.iter().copied().fold(f64::INFINITY, f64::min);

        let max_trade_duration = trades.iter().map(|t| t.duration_bars).fold(0, usize::max);
        let total_duration: usize = trades.iter().map(|t| t.duration_bars).sum();

        TradeStats {
            trade_count: trades.len(),
            win_rate_pct: winners as f64 / total * 100.0,
            best_trade_pct: finite_or_zero(best_trade_pct),
            worst_trade_pct: finite_or_zero(worst_trade_pct),
            avg_trade_pct: finite_or_zero(mean(&pnl_pcts)),
            max_trade_duration,
            avg_trade_duration: total_duration as f64 / total,
        }
    }
}

fn buy_and_hold_return_pct(closes: &[f64]) -> f64 {
    match (closes.first(), closes.last()) {
        (Some(&first), Some(&last)) if first != 0.0 => {
            finite_or_zero((last - first) / first * 100.0)
        }
        _ => 0.0,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    finite_or_zero(values.mean())
}

//sample (n - 1) standard deviation; 0 with fewer than two observations
fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    finite_or_zero(values.std_dev())
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::timeseries::calculate_equity_curve;
    use crate::portfolio::Position;
    use approx::assert_relative_eq;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn curve(values: &[f64]) -> Vec<EquityPoint> {
        let samples: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| (day(i as i64), v, false))
            .collect();
        calculate_equity_curve(&samples)
    }

    fn trade(entry: f64, exit: f64, bars: usize) -> Trade {
        let position = Position::open(day(0), 0, entry);
        Trade::close(&position, day(bars as i64), bars, exit)
    }

    #[test]
    fn zero_trade_run_reports_zero_trade_stats() {
        let metrics = SummaryMetrics::from_backtest(&curve(&[100.0; 5]), &[], 100.0, None);

        assert_eq!(metrics.trade_count, 0);
        assert_eq!(metrics.win_rate_pct, 0.0);
        assert_eq!(metrics.best_trade_pct, 0.0);
        assert_eq!(metrics.worst_trade_pct, 0.0);
        assert_eq!(metrics.avg_trade_pct, 0.0);
        assert_eq!(metrics.max_trade_duration, 0);
        assert_eq!(metrics.avg_trade_duration, 0.0);

        //flat equity: zero variance resolves to zero ratios
        assert_eq!(metrics.volatility_annual_pct, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.sortino_ratio, 0.0);
        assert_eq!(metrics.max_drawdown_pct, 0.0);
        assert_eq!(metrics.calmar_ratio, 0.0);
        assert_eq!(metrics.max_drawdown_duration, 0);
    }

    #[test]
    fn drawdown_duration_from_equity_runs() {
        let metrics = SummaryMetrics::from_backtest(
            &curve(&[100.0, 110.0, 90.0, 95.0, 120.0]),
            &[],
            100.0,
            None,
        );

        assert_eq!(metrics.max_drawdown_duration, 2);
        assert_eq!(metrics.avg_drawdown_duration, 2.0);
        assert_relative_eq!(metrics.max_drawdown_pct, (90.0 / 110.0 - 1.0) * 100.0);
        assert_eq!(metrics.equity_peak, 120.0);
        assert_eq!(metrics.equity_final, 120.0);
        assert_relative_eq!(metrics.return_pct, 20.0);
        assert_eq!(metrics.duration_days, 4.0);
    }

    #[test]
    fn return_and_ratio_formulas() {
        let values = [100.0, 110.0, 99.0, 104.0];
        let metrics = SummaryMetrics::from_backtest(&curve(&values), &[], 100.0, None);

        let returns = [0.1, -0.1, 5.0 / 99.0];
        let mean = returns.iter().sum::<f64>() / 3.0;
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 2.0;
        let sd = var.sqrt();

        assert_relative_eq!(
            metrics.volatility_annual_pct,
            sd * 252f64.sqrt() * 100.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(metrics.sharpe_ratio, mean / sd * 252f64.sqrt(), epsilon = 1e-9);

        //a single negative return has no sample deviation
        assert_eq!(metrics.sortino_ratio, 0.0);

        let annual = ((1.04f64).powf(365.0 / 3.0) - 1.0) * 100.0;
        assert_relative_eq!(metrics.return_annual_pct, annual, epsilon = 1e-6);
        assert_relative_eq!(
            metrics.calmar_ratio,
            annual / 10.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn sortino_uses_negative_returns_only() {
        let values = [100.0, 90.0, 99.0, 94.05, 120.0];
        let metrics = SummaryMetrics::from_backtest(&curve(&values), &[], 100.0, None);

        let returns = calculate_returns(&values);
        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let negatives = [-0.1, -0.05];
        let neg_mean = negatives.iter().sum::<f64>() / 2.0;
        //n - 1 == 1
        let downside = negatives
            .iter()
            .map(|r| (r - neg_mean).powi(2))
            .sum::<f64>()
            .sqrt();

        assert_relative_eq!(
            metrics.sortino_ratio,
            mean / downside * 252f64.sqrt(),
            max_relative = 1e-9
        );
    }

    #[test]
    fn zero_duration_has_zero_annual_return() {
        let metrics = SummaryMetrics::from_backtest(&curve(&[100.0]), &[], 50.0, None);
        assert_eq!(metrics.duration_days, 0.0);
        assert_eq!(metrics.return_annual_pct, 0.0);
        assert_relative_eq!(metrics.return_pct, 100.0);
    }

    #[test]
    fn trade_stats_use_percentage_pnl() {
        let trades = vec![trade(100.0, 110.0, 2), trade(200.0, 190.0, 4), trade(50.0, 51.0, 3)];
        let metrics = SummaryMetrics::from_backtest(&curve(&[100.0, 101.0]), &trades, 100.0, None);

        assert_eq!(metrics.trade_count, 3);
        assert_relative_eq!(metrics.win_rate_pct, 200.0 / 3.0);
        assert_relative_eq!(metrics.best_trade_pct, 10.0);
        assert_relative_eq!(metrics.worst_trade_pct, -5.0);
        assert_relative_eq!(metrics.avg_trade_pct, (10.0 - 5.0 + 2.0) / 3.0);
        assert_eq!(metrics.max_trade_duration, 4);
        assert_relative_eq!(metrics.avg_trade_duration, 3.0);
    }

    #[test]
    fn exposure_counts_exposed_bars() {
        let samples = vec![
            (day(0), 100.0, false),
            (day(1), 100.0, true),
            (day(2), 100.0, true),
            (day(3), 100.0, false),
        ];
        let metrics =
            SummaryMetrics::from_backtest(&calculate_equity_curve(&samples), &[], 100.0, None);
        assert_eq!(metrics.exposure_pct, 50.0);
    }

    #[test]
    fn buy_and_hold_uses_raw_closes() {
        let closes = [100.0, 102.0, 101.0, 103.0, 105.0];
        let metrics = SummaryMetrics::from_backtest(&curve(&[1.0, 1.0]), &[], 1.0, Some(&closes));
        assert_relative_eq!(metrics.buy_and_hold_return_pct, 5.0);

        let metrics = SummaryMetrics::from_backtest(&curve(&[1.0, 1.0]), &[], 1.0, None);
        assert_eq!(metrics.buy_and_hold_return_pct, 0.0);
    }

    #[test]
    fn report_always_carries_every_key_in_order() {
        let report = SummaryMetrics::from_backtest(&curve(&[100.0]), &[], 100.0, None).to_report();

        assert_eq!(report.len(), METRIC_KEYS.len());
        assert!(report.keys().eq(METRIC_KEYS.iter().copied()));
        assert_eq!(report.get("tradeCount"), Some(0.0));
        assert_eq!(report.get("equityFinal"), Some(100.0));
        assert_eq!(report.get("unknown"), None);
    }

    #[test]
    fn report_iter_pairs_keys_with_values() {
        let report = SummaryMetrics::from_backtest(&curve(&[100.0, 105.0]), &[], 100.0, None)
            .to_report();

        let pairs: Vec<(&str, f64)> = report.iter().collect();
        assert_eq!(pairs.len(), METRIC_KEYS.len());
        for ((key, value), expected) in pairs.iter().zip(METRIC_KEYS.iter()) {
            assert_eq!(key, expected);
            assert_eq!(report.get(key), Some(*value));
        }
    }

    #[test]
    fn report_serializes_as_flat_object() {
        let report = SummaryMetrics::from_backtest(&curve(&[100.0, 105.0]), &[], 100.0, None)
            .to_report();
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();

        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 21);
        assert_eq!(object["returnPct"].as_f64(), Some(5.0));
    }

    #[test]
    fn table_has_header_plus_one_row_per_metric() {
        let metrics = SummaryMetrics::from_backtest(&curve(&[100.0]), &[], 100.0, None);
        assert_eq!(metrics.to_table().len(), METRIC_KEYS.len() + 1);
    }
}
