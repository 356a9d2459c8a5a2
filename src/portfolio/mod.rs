pub mod account;
pub mod position;
pub mod trade;

pub use account::Account;
pub use position::{Position, UNIT_SIZE};
pub use trade::Trade;
