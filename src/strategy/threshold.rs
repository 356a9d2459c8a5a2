use crate::data::Bar;
use crate::error::ValidationError;
use crate::strategy::{Action, Strategy};

//stateless threshold classifier over an indicator series
//buy when indicator > buy_threshold, sell when indicator < sell_threshold, hold otherwise
//
//the buy test runs first and the sell test second, so when buy_threshold <= sell_threshold
//a value satisfying both is classified as sell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalGenerator {
    buy_threshold: f64,
    sell_threshold: f64,
}

impl SignalGenerator {
    pub fn new(buy_threshold: f64, sell_threshold: f64) -> Result<Self, ValidationError> {
        if !buy_threshold.is_finite() {
            return Err(ValidationError::InvalidConfig {
                field: "buy_threshold",
                reason: format!("must be finite, got {}", buy_threshold),
            });
        }
        if !sell_threshold.is_finite() {
            return Err(ValidationError::InvalidConfig {
                field: "sell_threshold",
                reason: format!("must be finite, got {}", sell_threshold),
            });
        }

        if buy_threshold <= sell_threshold {
            tracing::warn!(
                buy_threshold,
                sell_threshold,
                "buy threshold not above sell threshold; overlapping values resolve to sell"
            );
        }

        Ok(SignalGenerator {
            buy_threshold,
            sell_threshold,
        })
    }

    pub fn buy_threshold(&self) -> f64 {
        self.buy_threshold
    }

    pub fn sell_threshold(&self) -> f64 {
        self.sell_threshold
    }

    //classifies a single indicator value
    pub fn classify(&self, value: f64) -> Action {
        let mut action = Action::Hold;
        if value > self.buy_threshold {
            action = Action::Buy;
        }
        if value < self.sell_threshold {
            action = Action::Sell;
        }
        action
    }

    //one action per indicator value
    pub fn generate(&self, indicator: &[f64]) -> Result<Vec<Action>, ValidationError> {
        validate_indicator(indicator)?;

        let actions: Vec<Action> = indicator.iter().map(|&v| self.classify(v)).collect();

        tracing::debug!(
            bars = actions.len(),
            buys = actions.iter().filter(|a| **a == Action::Buy).count(),
            sells = actions.iter().filter(|a| **a == Action::Sell).count(),
            "generated signals"
        );

        Ok(actions)
    }

    //one action per bar, reading each bar's indicator
    pub fn generate_for_bars(&self, bars: &[Bar]) -> Result<Vec<Action>, ValidationError> {
        self.generate(&indicator_series(bars)?)
    }

    //distance beyond the crossed threshold; 0 inside the hold band
    pub fn signal_strength(&self, indicator: &[f64]) -> Result<Vec<f64>, ValidationError> {
        validate_indicator(indicator)?;

        Ok(indicator
            .iter()
            .map(|&value| {
                let mut strength = 0.0;
                if value > self.buy_threshold {
                    strength = value - self.buy_threshold;
                }
                if value < self.sell_threshold {
                    strength = self.sell_threshold - value;
                }
                strength
            })
            .collect())
    }
}

impl Strategy for SignalGenerator {
    fn actions(&self, bars: &[Bar]) -> Result<Vec<Action>, ValidationError> {
        self.generate_for_bars(bars)
    }

    fn name(&self) -> &str {
        "RRS Threshold"
    }
}

//extracts the indicator column, rejecting bars where it is absent
pub fn indicator_series(bars: &[Bar]) -> Result<Vec<f64>, ValidationError> {
    if bars.is_empty() {
        return Err(ValidationError::EmptySeries { series: "bars" });
    }

    bars.iter()
        .enumerate()
        .map(|(index, bar)| {
            bar.indicator.ok_or(ValidationError::MissingField {
                field: "indicator",
                index,
            })
        })
        .collect()
}

fn validate_indicator(indicator: &[f64]) -> Result<(), ValidationError> {
    if indicator.is_empty() {
        return Err(ValidationError::EmptySeries {
            series: "indicator",
        });
    }

    //nan marks a missing value
    if let Some(index) = indicator.iter().position(|v| v.is_nan()) {
        return Err(ValidationError::MissingField {
            field: "indicator",
            index,
        });
    }

    Ok(())
}
