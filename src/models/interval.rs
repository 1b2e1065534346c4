// Analytics window accepted by Cookie.fun. Wire names keep the leading underscore.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AgentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "_3Days")]
    ThreeDays,
    #[default]
    #[serde(rename = "_7Days")]
    SevenDays,
}

impl Interval {
    pub const ALL: [Interval; 2] = [Interval::ThreeDays, Interval::SevenDays];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::ThreeDays => "_3Days",
            Interval::SevenDays => "_7Days",
        }
    }

    /// Parse an optional query value; `None` falls back to `_7Days`.
    pub fn parse_or_default(raw: Option<&str>) -> Result<Self, AgentError> {
        match raw {
            Some(s) => s.parse(),
            None => Ok(Self::default()),
        }
    }
}

impl FromStr for Interval {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "_3Days" => Ok(Interval::ThreeDays),
            "_7Days" => Ok(Interval::SevenDays),
            other => Err(AgentError::Validation(format!(
                "invalid interval {other:?}: must be _3Days or _7Days"
            ))),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
