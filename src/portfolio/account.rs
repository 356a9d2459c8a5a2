use crate::portfolio::position::Position;
use crate::portfolio::trade::Trade;
use chrono::{DateTime, Utc};

//cash account holding at most one long position
//flat when position is none, long otherwise
#[derive(Debug, Clone)]
pub struct Account {
    //current cash (fees deducted on both legs)
    pub cash: f64,

    //fractional fee applied on notional per side
    pub fee_rate: f64,

    position: Option<Position>,

    //closed trades in exit order
    pub trade_log: Vec<Trade>,
}

impl Account {
    //creates a flat account with initial balance
    pub fn new(initial_balance: f64, fee_rate: f64) -> Self {
        Account {
            cash: initial_balance,
            fee_rate,
            position: None,
            trade_log: Vec::new(),
        }
    }

    //opens a long position at price
    //returns false (no-op) if already long
    pub fn open_long(&mut self, timestamp: DateTime<Utc>, index: usize, price: f64) -> bool {
        if self.position.is_some() {
            return false;
        }

        let position = Position::open(timestamp, index, price);
        self.cash -= position.size * price * (1.0 + self.fee_rate);
        self.position = Some(position);
        true
    }

    //closes the open position at price and records the trade
    //returns none (no-op) if flat
    pub fn close_long(
        &mut self,
        timestamp: DateTime<Utc>,
        index: usize,
        price: f64,
    ) -> Option<&Trade> {
        let position = self.position.take()?;

        self.cash += position.size * price * (1.0 - self.fee_rate);
        self.trade_log.push(Trade::close(&position, timestamp, index, price));
        self.trade_log.last()
    }

    //cash plus mark-to-market value of the open position
    pub fn equity(&self, mark_price: f64) -> f64 {
        match &self.position {
            Some(position) => self.cash + position.market_value(mark_price),
            None => self.cash,
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn round_trip_charges_fee_on_both_legs() {
        let mut account = Account::new(10_000.0, 0.001);

        assert!(account.open_long(ts(2), 1, 102.0));
        assert_relative_eq!(account.cash, 10_000.0 - 102.0 * 1.001, epsilon = 1e-9);
        assert_relative_eq!(account.equity(102.0), account.cash + 102.0, epsilon = 1e-9);

        let trade = account.close_long(ts(4), 3, 103.0).cloned().unwrap();
        assert_eq!(trade.pnl, 1.0);
        assert_relative_eq!(
            account.cash,
            10_000.0 - 102.0 * 1.001 + 103.0 * 0.999,
            epsilon = 1e-9
        );
        assert!(account.is_flat());
        assert_eq!(account.equity(500.0), account.cash);
    }

    #[test]
    fn redundant_orders_are_no_ops() {
        let mut account = Account::new(1_000.0, 0.0);

        assert!(account.close_long(ts(1), 0, 10.0).is_none());
        assert_eq!(account.cash, 1_000.0);

        assert!(account.open_long(ts(2), 1, 10.0));
        assert!(!account.open_long(ts(3), 2, 20.0));

        let position = account.position().unwrap();
        assert_eq!(position.entry_price, 10.0);
        assert_eq!(position.entry_index, 1);
        assert_eq!(account.cash, 990.0);
    }
}
