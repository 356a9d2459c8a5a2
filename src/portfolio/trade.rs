use crate::portfolio::position::Position;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//a completed round trip; immutable once appended to the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub entry_timestamp: DateTime<Utc>,
    pub exit_timestamp: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,

    //absolute price difference (exit - entry), fees excluded
    pub pnl: f64,

    //pnl relative to entry price, in percent
    pub pnl_pct: f64,

    pub duration_bars: usize,
}

impl Trade {
    //closes a position into a trade record
    pub fn close(
        position: &Position,
        exit_timestamp: DateTime<Utc>,
        exit_index: usize,
        exit_price: f64,
    ) -> Self {
        let pnl = exit_price - position.entry_price;
        let pnl_pct = if position.entry_price > 0.0 {
            pnl / position.entry_price * 100.0
        } else {
            0.0
        };

        Trade {
            entry_timestamp: position.entry_timestamp,
            exit_timestamp,
            entry_price: position.entry_price,
            exit_price,
            size: position.size,
            pnl,
            pnl_pct,
            duration_bars: exit_index.saturating_sub(position.entry_index),
        }
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}
