use crate::data::bar::Bar;
use crate::data::loader::load_csv;
use anyhow::{Context, Result};
use std::path::PathBuf;

//source of historical bars; the pipeline receives one instead of building its own
pub trait DataProvider {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>>;
}

//reads "<data_dir>/<SYMBOL>_data.csv" files written by an upstream fetcher
#[derive(Debug, Clone)]
pub struct CsvDataProvider {
    data_dir: PathBuf,
}

impl CsvDataProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        CsvDataProvider {
            data_dir: data_dir.into(),
        }
    }

    //returns the path a symbol's data is expected at
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{}_data.csv", symbol))
    }
}

impl DataProvider for CsvDataProvider {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>> {
        let path = self.path_for(symbol);
        let bars = load_csv(&path).context(format!("Failed to load bars for {}", symbol))?;

        tracing::debug!(symbol, bars = bars.len(), path = %path.display(), "loaded bars");

        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_symbol_file_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("SOLUSDT_data.csv"),
            "timestamp,close\n2023-01-01,20.5\n2023-01-02,21.0\n",
        )
        .unwrap();

        let provider = CsvDataProvider::new(dir.path());
        let bars = provider.fetch_bars("SOLUSDT").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 21.0);
    }

    #[test]
    fn missing_symbol_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CsvDataProvider::new(dir.path());

        let err = provider.fetch_bars("BTCUSDT").unwrap_err();
        assert!(err.to_string().contains("BTCUSDT"));
    }
}
