use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::errors::Error;
use crate::portfolio::holdings::HoldingView;

/// Column the holdings table can be ordered by.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SortField {
    Symbol,
    Shares,
    Price,
    /// Average cost per share.
    Cost,
    /// Market value.
    Value,
    Gain,
    GainPercent,
}

impl SortField {
    pub const ALL: [SortField; 7] = [
        SortField::Symbol,
        SortField::Shares,
        SortField::Price,
        SortField::Cost,
        SortField::Value,
        SortField::Gain,
        SortField::GainPercent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::Shares => "shares",
            Self::Price => "price",
            Self::Cost => "cost",
            Self::Value => "value",
            Self::Gain => "gain",
            Self::GainPercent => "gain-percent",
        }
    }

    fn numeric_key(&self, holding: &HoldingView) -> Option<Decimal> {
        match self {
            Self::Symbol => None,
            Self::Shares => Some(holding.shares),
            Self::Price => Some(holding.current_price),
            Self::Cost => Some(holding.average_cost),
            Self::Value => Some(holding.market_value),
            Self::Gain => Some(holding.unrealized_gain),
            Self::GainPercent => Some(holding.unrealized_gain_pct),
        }
    }

    /// Ascending comparison for this field.
    fn compare(&self, a: &HoldingView, b: &HoldingView) -> Ordering {
        match (self.numeric_key(a), self.numeric_key(b)) {
            (Some(x), Some(y)) => x
                .checked_sub(y)
                .map(|d| d.cmp(&Decimal::ZERO))
                .unwrap_or_else(|| x.cmp(&y)),
            _ => a.symbol.cmp(&b.symbol),
        }
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        SortField::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| Error::InvalidConfigValue(format!("Unknown sort field '{}'", s)))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(Error::InvalidConfigValue(format!(
                "Unknown sort direction '{}'",
                other
            ))),
        }
    }
}

/// Active ordering of the holdings table.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: SortField::Value,
            direction: SortDirection::Desc,
        }
    }
}

impl SortState {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Header click: the active field flips direction, a new field starts ascending.
    pub fn select(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Asc;
        }
    }
}

impl std::fmt::Display for SortState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.field, self.direction)
    }
}

/// Parses `field` or `field:direction`, e.g. `gain-percent:desc`.
impl FromStr for SortState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((field, direction)) => Ok(Self::new(field.parse()?, direction.parse()?)),
            None => Ok(Self::new(s.parse()?, SortDirection::Asc)),
        }
    }
}

/// Orders holdings in place.
///
/// Descending order is the exact reverse of ascending order, ties included.
pub fn sort_holdings(holdings: &mut [HoldingView], state: &SortState) {
    holdings.sort_by(|a, b| state.field.compare(a, b));
    if state.direction == SortDirection::Desc {
        holdings.reverse();
    }
}
