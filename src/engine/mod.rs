pub mod backtest;
pub mod simulator;

pub use backtest::{BacktestConfig, BacktestEngine, BacktestResult};
pub use simulator::{SimulationResult, TradeSimulator};
