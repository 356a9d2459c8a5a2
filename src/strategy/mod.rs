pub mod threshold;

use crate::data::Bar;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use threshold::SignalGenerator;

//trading decision for a single bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Hold,
    Buy,
    Sell,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Hold => "hold",
            Action::Buy => "buy",
            Action::Sell => "sell",
        };
        f.write_str(name)
    }
}

//strategy interface: one action per bar, aligned by index
pub trait Strategy {
    fn actions(&self, bars: &[Bar]) -> Result<Vec<Action>, ValidationError>;

    //returns the strategy name
    fn name(&self) -> &str;
}
