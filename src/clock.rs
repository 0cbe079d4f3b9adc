use chrono::{DateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) enum ClockStyle {
    #[serde(rename = "24h")]
    TwentyFour,
    #[serde(rename = "12h")]
    Twelve,
}

pub(crate) fn format_clock<Tz>(time: &DateTime<Tz>, style: ClockStyle) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let fmt = match style {
        ClockStyle::TwentyFour => "%H:%M",
        ClockStyle::Twelve => "%I:%M",
    };
    time.format(fmt).to_string()
}

/// Delay until the next wall-clock minute boundary.
pub(crate) fn ms_until_next_minute<Tz: TimeZone>(time: &DateTime<Tz>) -> u64 {
    let into_minute = time.second() as u64 * 1_000 + (time.nanosecond() / 1_000_000) as u64;
    60_000 - into_minute.min(59_999)
}

pub(crate) struct ClockDisplay {
    style: ClockStyle,
    text: String,
}

impl ClockDisplay {
    pub(crate) fn new(style: ClockStyle) -> Self {
        Self {
            style,
            text: String::new(),
        }
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    /// Re-format for `now`; true if the visible text changed.
    pub(crate) fn refresh<Tz>(&mut self, now: &DateTime<Tz>) -> bool
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let next = format_clock(now, self.style);
        if next == self.text {
            return false;
        }
        self.text = next;
        true
    }
}
