use crate::engine::BacktestConfig;
use crate::error::ValidationError;
use crate::strategy::SignalGenerator;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

//complete backtest configuration
//missing keys in a json file fall back to the defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfiguration {
    //data
    pub data_dir: PathBuf,
    pub symbol: String,
    pub benchmark_symbol: String,

    //account settings
    pub initial_balance: f64,
    pub fee_rate: f64,

    //signal thresholds on relative return strength
    pub buy_threshold: f64,
    pub sell_threshold: f64,

    //optional output paths
    pub output_equity_csv: Option<PathBuf>,
    pub output_trades_csv: Option<PathBuf>,
    pub output_metrics_json: Option<PathBuf>,
}

impl Default for BacktestConfiguration {
    fn default() -> Self {
        BacktestConfiguration {
            data_dir: PathBuf::from("data"),
            symbol: "SOLUSDT".to_string(),
            benchmark_symbol: "BTCUSDT".to_string(),
            initial_balance: 10000.0,
            fee_rate: 0.001,
            buy_threshold: 1.02,
            sell_threshold: 0.98,
            output_equity_csv: None,
            output_trades_csv: None,
            output_metrics_json: None,
        }
    }
}

impl BacktestConfiguration {
    //load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read configuration file: {}", path.display()))?;
        let config: BacktestConfiguration = serde_json::from_str(&contents)
            .context(format!("Failed to parse configuration file: {}", path.display()))?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(path, json)
            .context(format!("Failed to write configuration file: {}", path.display()))?;
        Ok(())
    }

    //simulator settings
    pub fn backtest_config(&self) -> BacktestConfig {
        BacktestConfig {
            initial_balance: self.initial_balance,
            fee_rate: self.fee_rate,
        }
    }

    pub fn signal_generator(&self) -> Result<SignalGenerator, ValidationError> {
        SignalGenerator::new(self.buy_threshold, self.sell_threshold)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.symbol.trim().is_empty() {
            return Err(ValidationError::InvalidConfig {
                field: "symbol",
                reason: "must not be empty".to_string(),
            });
        }
        if self.benchmark_symbol.trim().is_empty() {
            return Err(ValidationError::InvalidConfig {
                field: "benchmark_symbol",
                reason: "must not be empty".to_string(),
            });
        }

        self.backtest_config().validate()?;
        self.signal_generator()?;
        Ok(())
    }
}
