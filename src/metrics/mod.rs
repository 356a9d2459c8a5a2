pub mod summary;
pub mod timeseries;

pub use summary::{MetricsReport, SummaryMetrics, METRIC_KEYS};
pub use timeseries::{calculate_equity_curve, drawdown_runs, EquityPoint};
