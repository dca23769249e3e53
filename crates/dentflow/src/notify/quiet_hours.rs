//! Quiet-hours window handling.

use chrono::NaiveTime;

/// A customer's quiet-hours window, `[start, end)` in local time-of-day.
///
/// `start > end` means the window wraps past midnight (e.g. 22:00-08:00).
/// `start == end` is treated as an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietHours {
    start: NaiveTime,
    end: NaiveTime,
}

impl QuietHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parses a pair of "HH:MM" strings. Returns `None` if either is malformed.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        let start = NaiveTime::parse_from_str(start, "%H:%M").ok()?;
        let end = NaiveTime::parse_from_str(end, "%H:%M").ok()?;
        Some(Self { start, end })
    }

    /// Whether `t` falls inside the window. Start is inclusive, end exclusive.
    pub fn contains(&self, t: NaiveTime) -> bool {
        use std::cmp::Ordering;
        match self.start.cmp(&self.end) {
            Ordering::Less => t >= self.start && t < self.end,
            // Wraps past midnight.
            Ordering::Greater => t >= self.start || t < self.end,
            Ordering::Equal => false,
        }
    }
}
