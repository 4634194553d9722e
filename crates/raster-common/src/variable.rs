//! Variable classification and daily statistics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a variable's samples relate to time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// Direct measurement at each timestamp (temperature, wind).
    Instantaneous,
    /// Running total since the start of the day (precipitation).
    Accumulating,
}

impl VariableKind {
    /// Statistics produced per day for this kind.
    pub fn statistics(&self) -> &'static [Statistic] {
        match self {
            VariableKind::Instantaneous => &[Statistic::Min, Statistic::Max],
            VariableKind::Accumulating => &[Statistic::Min, Statistic::Max, Statistic::Sum],
        }
    }
}

/// A daily summary statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Min,
    Max,
    Sum,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Sum => "sum",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_per_kind() {
        assert_eq!(VariableKind::Instantaneous.statistics().len(), 2);
        assert_eq!(
            VariableKind::Accumulating.statistics(),
            &[Statistic::Min, Statistic::Max, Statistic::Sum]
        );
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&VariableKind::Accumulating).unwrap();
        assert_eq!(json, "\"accumulating\"");
        assert_eq!(Statistic::Sum.to_string(), "sum");
    }
}
