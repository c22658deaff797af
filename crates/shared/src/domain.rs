use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvalidCount;

/// Latest known number of participants with a hand raised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RaisedHandCount(pub u32);

impl RaisedHandCount {
    pub const ZERO: Self = Self(0);

    pub fn any_raised(self) -> bool {
        self.0 >= 1
    }
}

impl TryFrom<i64> for RaisedHandCount {
    type Error = InvalidCount;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .map(Self)
            .map_err(|_| InvalidCount { count: value })
    }
}

impl fmt::Display for RaisedHandCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandPosition {
    #[default]
    Down,
    Up,
}

impl HandPosition {
    pub fn for_count(count: RaisedHandCount) -> Self {
        if count.any_raised() {
            Self::Up
        } else {
            Self::Down
        }
    }
}

/// Imperative move the coordinator can ask of an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorCommand {
    Raise,
    Lower,
    Wiggle,
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Raise => "raise",
            Self::Lower => "lower",
            Self::Wiggle => "wiggle",
        };
        f.write_str(name)
    }
}
