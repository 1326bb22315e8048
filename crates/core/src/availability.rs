//! Whether a messenger integration is currently staffed.
//!
//! The integration's `messenger_data` carries the settings. With the
//! `manual` availability method the stored `isOnline` flag is the answer.
//! Otherwise the answer comes from the configured online hours: the first
//! entry that applies to the current day (`everyday`, then `weekdays` or
//! `weekends`, then the day's own name) decides, and no applicable entry
//! means offline. Hours are compared in UTC.

use chrono::{Datelike, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Availability method where staff toggle the online flag by hand.
pub const METHOD_MANUAL: &str = "manual";

pub const DAY_EVERYDAY: &str = "everyday";
pub const DAY_WEEKDAYS: &str = "weekdays";
pub const DAY_WEEKENDS: &str = "weekends";

/// Accepted formats for `from` / `to`, tried in order.
const TIME_FORMATS: [&str; 3] = ["%H:%M", "%I:%M %p", "%I:%M%p"];

/// One online-hours entry, e.g. `{ "day": "weekdays", "from": "09:00", "to": "17:00" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineHours {
    pub day: String,
    pub from: String,
    pub to: String,
}

/// Availability settings read from an integration's `messenger_data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessengerAvailability {
    pub availability_method: Option<String>,
    pub is_online: bool,
    pub online_hours: Vec<OnlineHours>,
}

impl MessengerAvailability {
    /// Parse from `messenger_data`. `null` yields the defaults, i.e. offline.
    pub fn from_messenger_data(data: &serde_json::Value) -> Result<Self, serde_json::Error> {
        if data.is_null() {
            return Ok(Self::default());
        }
        Self::deserialize(data)
    }

    pub fn is_manual(&self) -> bool {
        self.availability_method.as_deref() == Some(METHOD_MANUAL)
    }

    /// Whether the messenger counts as online at `now`.
    pub fn is_online_at(&self, now: Timestamp) -> bool {
        if self.is_manual() {
            return self.is_online;
        }

        let weekday = now.weekday();
        let time = now.time();
        let find = |day: &str| self.online_hours.iter().find(|hours| hours.day == day);

        if let Some(hours) = find(DAY_EVERYDAY) {
            return hours.contains(time);
        }
        if is_weekend(weekday) {
            if let Some(hours) = find(DAY_WEEKENDS) {
                return hours.contains(time);
            }
        } else if let Some(hours) = find(DAY_WEEKDAYS) {
            return hours.contains(time);
        }
        find(day_name(weekday)).is_some_and(|hours| hours.contains(time))
    }
}

impl OnlineHours {
    /// `from <= time <= to`. An entry with an unreadable bound never matches.
    pub fn contains(&self, time: NaiveTime) -> bool {
        match (parse_time(&self.from), parse_time(&self.to)) {
            (Some(from), Some(to)) => from <= time && time <= to,
            _ => false,
        }
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}
