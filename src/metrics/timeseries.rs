use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//a point in the equity curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    //(equity / running peak - 1) * 100, zero or negative
    pub drawdown_pct: f64,
    //a position was open after this bar's action
    pub exposed: bool,
}

impl EquityPoint {
    pub fn new(timestamp: DateTime<Utc>, equity: f64, drawdown_pct: f64, exposed: bool) -> Self {
        EquityPoint {
            timestamp,
            equity,
            drawdown_pct,
            exposed,
        }
    }
}

//calculates the equity curve with drawdowns against the running peak
//inputs are (timestamp, equity, exposed) per bar
pub fn calculate_equity_curve(samples: &[(DateTime<Utc>, f64, bool)]) -> Vec<EquityPoint> {
    let mut curve = Vec::with_capacity(samples.len());
    let mut peak = f64::NEG_INFINITY;

    for &(timestamp, equity, exposed) in samples {
        //update peak
        if equity > peak {
            peak = equity;
        }

        let drawdown_pct = drawdown_from_peak(equity, peak);

        curve.push(EquityPoint::new(timestamp, equity, drawdown_pct, exposed));
    }

    curve
}

//percentage below the running peak; a non-positive peak has no defined drawdown
fn drawdown_from_peak(equity: f64, peak: f64) -> f64 {
    if peak > 0.0 {
        (equity / peak - 1.0) * 100.0
    } else {
        0.0
    }
}

//most negative drawdown percentage; 0 when never below peak
pub fn max_drawdown_pct(equity_curve: &[EquityPoint]) -> f64 {
    equity_curve
        .iter()
        .map(|point| point.drawdown_pct)
        .fold(0.0, f64::min)
}

//calculates per-bar returns from equity values
//a zero previous value yields a zero return
pub fn calculate_returns(equity_values: &[f64]) -> Vec<f64> {
    equity_values
        .windows(2)
        .map(|w| {
            if w[0] != 0.0 {
                (w[1] - w[0]) / w[0]
            } else {
                0.0
            }
        })
        .collect()
}

//lengths (in bars) of contiguous stretches strictly below the running peak
//uses the same peak rule as the drawdown column so both metrics agree
pub fn drawdown_runs(equity_values: &[f64]) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut peak = f64::NEG_INFINITY;
    let mut current = 0usize;

    for &equity in equity_values {
        if equity > peak {
            peak = equity;
        }

        if drawdown_from_peak(equity, peak) < 0.0 {
            current += 1;
        } else if current > 0 {
            runs.push(current);
            current = 0;
        }
    }

    if current > 0 {
        runs.push(current);
    }

    runs
}
