//a Rust-based relative-strength trade simulator and performance metrics engine

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod portfolio;
pub mod strategy;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::BacktestConfiguration;
    pub use crate::data::{
        attach_relative_strength, load_csv, write_equity_csv, write_metrics_json,
        write_trades_csv, Bar, CsvDataProvider, DataProvider,
    };
    pub use crate::engine::{
        BacktestConfig, BacktestEngine, BacktestResult, SimulationResult, TradeSimulator,
    };
    pub use crate::error::ValidationError;
    pub use crate::metrics::{EquityPoint, MetricsReport, SummaryMetrics, METRIC_KEYS};
    pub use crate::portfolio::{Account, Position, Trade};
    pub use crate::strategy::{Action, SignalGenerator, Strategy};
}
