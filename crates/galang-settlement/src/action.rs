use std::fmt;
use std::str::FromStr;

use crate::error::SettlementError;

/// Default deadline extension when the operator gives no day count.
const DEFAULT_EXTEND_DAYS: i64 = 30;

/// Operator-triggered single-campaign settlement action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleAction {
    /// Convert the campaign's donations to wallet credits now, without
    /// waiting out the grace window.
    Credits,
    /// Push the deadline forward and reopen the campaign for donations.
    Extend { days: i64 },
    /// Force-mark completion, bypassing the percentage check. An
    /// administrative override, expected to be rare and audited.
    Complete,
}

impl FromStr for SettleAction {
    type Err = SettlementError;

    /// Parse an operator action string: `credits`, `complete`, `extend`,
    /// or `extend:<days>`. Anything else is rejected before any state
    /// change.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credits" => Ok(Self::Credits),
            "complete" => Ok(Self::Complete),
            "extend" => Ok(Self::Extend {
                days: DEFAULT_EXTEND_DAYS,
            }),
            other => {
                if let Some(days) = other.strip_prefix("extend:") {
                    let days: i64 = days
                        .parse()
                        .map_err(|_| SettlementError::InvalidAction(other.to_string()))?;
                    if days <= 0 {
                        return Err(SettlementError::InvalidAction(other.to_string()));
                    }
                    return Ok(Self::Extend { days });
                }
                Err(SettlementError::InvalidAction(other.to_string()))
            }
        }
    }
}

impl fmt::Display for SettleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credits => write!(f, "credits"),
            Self::Extend { days } => write!(f, "extend:{days}"),
            Self::Complete => write!(f, "complete"),
        }
    }
}
