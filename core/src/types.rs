//! Shared primitive types used across the customer model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One timeslot = one simulated hour.
pub type Timeslot = u64;

/// Identifier handed out by the customer repository.
pub type CustomerId = u64;

/// Social group and activity identifiers as they appear in configuration.
pub type GroupId = u32;
pub type ActivityId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male   => "male",
            Self::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male"   => Ok(Self::Male),
            "female" => Ok(Self::Female),
            other    => Err(format!("unknown gender '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerType {
    ElectricVehicle,
}
