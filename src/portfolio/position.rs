use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//units bought per entry; partial sizing is not modelled
pub const UNIT_SIZE: f64 = 1.0;

//an open long position; only exists while the account is long
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub entry_timestamp: DateTime<Utc>,

    //bar index of the entry, used for trade duration
    pub entry_index: usize,

    pub entry_price: f64,

    pub size: f64,
}

impl Position {
    //opens a unit-size position
    pub fn open(entry_timestamp: DateTime<Utc>, entry_index: usize, entry_price: f64) -> Self {
        Position {
            entry_timestamp,
            entry_index,
            entry_price,
            size: UNIT_SIZE,
        }
    }

    //mark-to-market value at the given price
    pub fn market_value(&self, current_price: f64) -> f64 {
        self.size * current_price
    }

    //price move since entry, times size
    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        (current_price - self.entry_price) * self.size
    }
}
