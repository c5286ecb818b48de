use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Metric values strictly below this are a buy.
pub const BUY_BELOW: f64 = 30.0;

/// Metric values strictly above this are a sell.
pub const SELL_ABOVE: f64 = 40.0;

/// Valuation signal derived from the latest CAPE reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Hold,
    Sell,
}

impl Signal {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Sell => "SELL",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Buy => "BUY (undervalued)",
            Self::Hold => "HOLD (neutral)",
            Self::Sell => "SELL (overvalued)",
        }
    }
}

impl Display for Signal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Both thresholds are inclusive to HOLD. NaN classifies as HOLD.
pub fn classify(metric: f64) -> Signal {
    if metric < BUY_BELOW {
        Signal::Buy
    } else if metric > SELL_ABOVE {
        Signal::Sell
    } else {
        Signal::Hold
    }
}
