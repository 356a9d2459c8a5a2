use crate::data::Bar;
use crate::engine::backtest::BacktestConfig;
use crate::error::ValidationError;
use crate::metrics::{calculate_equity_curve, EquityPoint};
use crate::portfolio::{Account, Position, Trade};
use crate::strategy::Action;

//output of a single simulation run
#[derive(Debug, Clone)]
pub struct SimulationResult {
    //one point per bar
    pub equity_curve: Vec<EquityPoint>,

    //closed trades in exit order
    pub trades: Vec<Trade>,

    //position still open after the last bar, if any
    pub open_position: Option<Position>,

    pub final_cash: f64,
}

//sequential flat/long state machine over (bar, action) pairs
//bars are consumed strictly in order; each step depends on the previous cash and position
#[derive(Debug, Clone)]
pub struct TradeSimulator {
    config: BacktestConfig,
}

impl TradeSimulator {
    pub fn new(config: BacktestConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(TradeSimulator { config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    //runs the simulation; the whole input is validated before any bar is processed
    pub fn run(&self, bars: &[Bar], actions: &[Action]) -> Result<SimulationResult, ValidationError> {
        validate_inputs(bars, actions)?;

        let mut account = Account::new(self.config.initial_balance, self.config.fee_rate);
        let mut samples = Vec::with_capacity(bars.len());

        for (index, (bar, action)) in bars.iter().zip(actions).enumerate() {
            match action {
                Action::Buy => {
                    if account.open_long(bar.timestamp, index, bar.close) {
                        tracing::debug!(
                            bar = index,
                            price = bar.close,
                            cash = account.cash,
                            "opened long"
                        );
                    }
                }
                Action::Sell => {
                    if let Some(trade) = account.close_long(bar.timestamp, index, bar.close) {
                        tracing::debug!(
                            bar = index,
                            entry = trade.entry_price,
                            exit = trade.exit_price,
                            pnl = trade.pnl,
                            "closed long"
                        );
                    }
                }
                //redundant buys/sells above and holds are no-ops
                Action::Hold => {}
            }

            samples.push((bar.timestamp, account.equity(bar.close), !account.is_flat()));
        }

        let open_position = account.position().cloned();
        if let (Some(position), Some(last)) = (&open_position, bars.last()) {
            tracing::debug!(
                entry = position.entry_price,
                mark = last.close,
                unrealized_pnl = position.unrealized_pnl(last.close),
                "position open at end of data"
            );
        }

        Ok(SimulationResult {
            equity_curve: calculate_equity_curve(&samples),
            trades: account.trade_log,
            open_position,
            final_cash: account.cash,
        })
    }
}

fn validate_inputs(bars: &[Bar], actions: &[Action]) -> Result<(), ValidationError> {
    if bars.is_empty() {
        return Err(ValidationError::EmptySeries { series: "bars" });
    }

    if bars.len() != actions.len() {
        return Err(ValidationError::Misaligned {
            bars: bars.len(),
            actions: actions.len(),
        });
    }

    for (index, bar) in bars.iter().enumerate() {
        if bar.close.is_nan() {
            return Err(ValidationError::MissingField {
                field: "close",
                index,
            });
        }

        if !bar.close.is_finite() || bar.close <= 0.0 {
            return Err(ValidationError::InvalidField {
                field: "close",
                index,
                reason: format!("price must be positive, got {}", bar.close),
            });
        }

        if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
            return Err(ValidationError::NonMonotonic { index });
        }
    }

    Ok(())
}
