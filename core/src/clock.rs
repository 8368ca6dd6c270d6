//! Simulation clock; owns the current timeslot.
//!
//! One timeslot is one hour, counted from the base time.

use crate::types::Timeslot;
use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub base:             DateTime<Utc>,
    pub current_timeslot: Timeslot,
}

impl SimClock {
    pub fn new(base: DateTime<Utc>) -> Self {
        Self {
            base,
            current_timeslot: 0,
        }
    }

    /// Advance one timeslot. Returns the new timeslot number.
    pub fn advance(&mut self) -> Timeslot {
        self.current_timeslot += 1;
        self.current_timeslot
    }

    pub fn current_time(&self) -> DateTime<Utc> {
        self.base + Duration::hours(self.current_timeslot as i64)
    }

    pub fn hour(&self) -> u32 {
        self.current_time().hour()
    }

    pub fn is_weekend(&self) -> bool {
        is_weekend(&self.current_time())
    }
}

pub fn is_weekend(t: &DateTime<Utc>) -> bool {
    matches!(t.weekday(), Weekday::Sat | Weekday::Sun)
}
