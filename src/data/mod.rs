pub mod bar;
pub mod indicator;
pub mod loader;
pub mod provider;
pub mod writer;

pub use bar::{closes, Bar};
pub use indicator::attach_relative_strength;
pub use loader::load_csv;
pub use provider::{CsvDataProvider, DataProvider};
pub use writer::{write_equity_csv, write_metrics_json, write_trades_csv};
