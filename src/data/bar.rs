use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//represents a single priced bar of market data
//close is required, the rest is optional for the simulation core
//a nan close marks a missing value and is rejected before simulation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
    //indicator driving signal generation (eg relative return strength)
    pub indicator: Option<f64>,
}

impl Bar {
    //creates a bar with only a close price
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Bar {
            timestamp,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
            indicator: None,
        }
    }

    //sets the indicator value
    pub fn with_indicator(mut self, indicator: f64) -> Self {
        self.indicator = Some(indicator);
        self
    }

    //sets the optional ohlv fields
    pub fn with_ohlv(
        mut self,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        volume: Option<f64>,
    ) -> Self {
        self.open = open;
        self.high = high;
        self.low = low;
        self.volume = volume;
        self
    }
}

//extracts the close price series
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|bar| bar.close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn builder_sets_optional_fields() {
        let ts = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let bar = Bar::new(ts, 101.0)
            .with_indicator(1.03)
            .with_ohlv(Some(100.0), Some(102.0), Some(99.5), None);

        assert_eq!(bar.close, 101.0);
        assert_eq!(bar.indicator, Some(1.03));
        assert_eq!(bar.high, Some(102.0));
        assert_eq!(bar.volume, None);
        assert_eq!(closes(&[bar]), vec![101.0]);
    }
}
