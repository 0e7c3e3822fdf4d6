//! Source of "now" for session logic.
//!
//! Calendar-day comparisons and greetings depend on the host's local offset,
//! so the clock hands out offset-aware timestamps and can be swapped for a
//! fixed one in tests.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Offset, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;

    /// Zone deadlines are typed and shown in.
    fn zone(&self) -> Zone;
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> DateTime<FixedOffset> {
        (**self).now()
    }

    fn zone(&self) -> Zone {
        (**self).zone()
    }
}

/// Wall-clock zone for deadlines.
///
/// `Local` follows the host's daylight-saving rules per instant, so a deadline
/// in summer keeps its summer offset when viewed in winter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Local,
    Fixed(FixedOffset),
}

impl Zone {
    pub fn utc() -> Self {
        Zone::Fixed(Utc.fix())
    }

    /// The instant a wall-clock time names. Times skipped by a DST jump have
    /// none; repeated times resolve to the earlier instant.
    pub fn to_utc(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Zone::Local => naive
                .and_local_timezone(Local)
                .earliest()
                .map(|ts| ts.with_timezone(&Utc)),
            Zone::Fixed(offset) => naive
                .and_local_timezone(*offset)
                .single()
                .map(|ts| ts.with_timezone(&Utc)),
        }
    }

    pub fn wall_clock(&self, ts: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Zone::Local => ts.with_timezone(&Local).naive_local(),
            Zone::Fixed(offset) => ts.with_timezone(offset).naive_local(),
        }
    }
}

/// Wall clock in the host's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }

    fn zone(&self) -> Zone {
        Zone::Local
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    /// Parse an RFC 3339 timestamp such as `2025-03-01T09:30:00+09:00`.
    pub fn parse(value: &str) -> crate::Result<Self> {
        DateTime::parse_from_rfc3339(value).map(FixedClock).map_err(|err| {
            crate::Error::InvalidArgument(format!("invalid timestamp '{value}': {err}"))
        })
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }

    fn zone(&self) -> Zone {
        Zone::Fixed(*self.0.offset())
    }
}
