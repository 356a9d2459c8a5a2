use crate::data::{attach_relative_strength, closes, Bar, DataProvider};
use crate::engine::simulator::TradeSimulator;
use crate::error::ValidationError;
use crate::metrics::{EquityPoint, MetricsReport, SummaryMetrics};
use crate::portfolio::{Position, Trade};
use crate::strategy::{Action, Strategy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

//result of a backtest
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub summary: SummaryMetrics,
    pub actions: Vec<Action>,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub open_position: Option<Position>,
    pub final_cash: f64,
}

impl BacktestResult {
    //flat metrics report with the fixed key set
    pub fn report(&self) -> MetricsReport {
        self.summary.to_report()
    }
}

//configuration for the trade simulator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_balance: f64,
    //fractional cost on notional, per side
    pub fee_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_balance: 10000.0,
            fee_rate: 0.001,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(ValidationError::InvalidConfig {
                field: "initial_balance",
                reason: format!("must be positive, got {}", self.initial_balance),
            });
        }

        if !(0.0..1.0).contains(&self.fee_rate) {
            return Err(ValidationError::InvalidConfig {
                field: "fee_rate",
                reason: format!("must be in [0, 1), got {}", self.fee_rate),
            });
        }

        Ok(())
    }
}

//main backtest engine: signals -> simulation -> metrics
pub struct BacktestEngine {
    simulator: TradeSimulator,
}

impl BacktestEngine {
    //creates a new backtest engine
    pub fn new(config: BacktestConfig) -> Result<Self, ValidationError> {
        Ok(BacktestEngine {
            simulator: TradeSimulator::new(config)?,
        })
    }

    pub fn config(&self) -> &BacktestConfig {
        self.simulator.config()
    }

    //runs the backtest with the given strategy
    pub fn run(&self, bars: &[Bar], strategy: &dyn Strategy) -> Result<BacktestResult, ValidationError> {
        let actions = strategy.actions(bars)?;

        tracing::info!(
            strategy = strategy.name(),
            bars = bars.len(),
            "running backtest"
        );

        self.run_with_actions(bars, actions)
    }

    //runs the backtest with externally supplied actions (one per bar)
    pub fn run_with_actions(
        &self,
        bars: &[Bar],
        actions: Vec<Action>,
    ) -> Result<BacktestResult, ValidationError> {
        let simulation = self.simulator.run(bars, &actions)?;

        let closes = closes(bars);
        let summary = SummaryMetrics::from_backtest(
            &simulation.equity_curve,
            &simulation.trades,
            self.config().initial_balance,
            Some(&closes),
        );

        tracing::info!(
            trades = summary.trade_count,
            equity_final = summary.equity_final,
            return_pct = summary.return_pct,
            "backtest finished"
        );

        Ok(BacktestResult {
            summary,
            actions,
            equity_curve: simulation.equity_curve,
            trades: simulation.trades,
            open_position: simulation.open_position,
            final_cash: simulation.final_cash,
        })
    }

    //fetches asset and benchmark bars, attaches relative strength, then runs
    pub fn run_from_provider(
        &self,
        provider: &dyn DataProvider,
        symbol: &str,
        benchmark_symbol: &str,
        strategy: &dyn Strategy,
    ) -> Result<BacktestResult> {
        let asset = provider
            .fetch_bars(symbol)
            .context(format!("Failed to fetch asset data for {}", symbol))?;
        let benchmark = provider
            .fetch_bars(benchmark_symbol)
            .context(format!("Failed to fetch benchmark data for {}", benchmark_symbol))?;

        tracing::info!(
            symbol,
            benchmark = benchmark_symbol,
            asset_bars = asset.len(),
            benchmark_bars = benchmark.len(),
            "fetched market data"
        );

        let bars = attach_relative_strength(&asset, &benchmark)
            .context("Failed to compute relative strength")?;

        let result = self.run(&bars, strategy).context("Backtest rejected input")?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::SignalGenerator;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn default_config_is_valid() {
        assert!(BacktestConfig::default().validate().is_ok());
    }

    #[test]
    fn fee_rate_must_be_below_one() {
        let config = BacktestConfig {
            initial_balance: 100.0,
            fee_rate: -0.1,
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidConfig {
                field: "fee_rate",
                ..
            })
        ));
    }

    #[test]
    fn run_produces_actions_curve_and_summary() {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let bars: Vec<Bar> = [(100.0, 1.0), (102.0, 1.05), (104.0, 0.9)]
            .iter()
            .enumerate()
            .map(|(i, &(close, rrs))| {
                Bar::new(start + Duration::days(i as i64), close).with_indicator(rrs)
            })
            .collect();

        let engine = BacktestEngine::new(BacktestConfig {
            initial_balance: 1_000.0,
            fee_rate: 0.0,
        })
        .unwrap();
        let strategy = SignalGenerator::new(1.02, 0.98).unwrap();

        let result = engine.run(&bars, &strategy).unwrap();
        assert_eq!(result.actions, vec![Action::Hold, Action::Buy, Action::Sell]);
        assert_eq!(result.equity_curve.len(), 3);
        assert_eq!(result.summary.trade_count, 1);
        assert_eq!(result.summary.equity_final, 1_002.0);
        assert_eq!(result.report().get("tradeCount"), Some(1.0));
    }

    #[test]
    fn missing_indicator_aborts_without_result() {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let bars = vec![Bar::new(start, 100.0)];
        let engine = BacktestEngine::new(BacktestConfig::default()).unwrap();
        let strategy = SignalGenerator::new(1.02, 0.98).unwrap();

        assert!(engine.run(&bars, &strategy).is_err());
    }
}
