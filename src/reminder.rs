//! Daily new-task reminder.
//!
//! On startup the previous session's timestamp is compared with "now". If the
//! previous session was on an earlier calendar day (in the clock's timezone),
//! the reminder is shown. The marker is overwritten with "now" right after the
//! comparison, whether or not the reminder fires.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::clock::Zone;
use crate::storage::{BlobStore, Persistence};

/// Text of the reminder prompt.
pub const REMINDER_MESSAGE: &str =
    "A day has passed since your last visit. Any new tasks to add?";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptState {
    #[default]
    Hidden,
    Shown,
}

/// True when `prev` falls on a different calendar day than `now`, both read
/// as wall-clock dates in `zone`.
pub fn is_new_day(prev: DateTime<Utc>, now: &DateTime<FixedOffset>, zone: &Zone) -> bool {
    zone.wall_clock(prev).date() != zone.wall_clock(now.with_timezone(&Utc)).date()
}

/// Prompt state for a session that starts at `now`.
pub fn evaluate(
    prev: Option<DateTime<Utc>>,
    now: &DateTime<FixedOffset>,
    zone: &Zone,
) -> PromptState {
    match prev {
        Some(prev) if is_new_day(prev, now, zone) => PromptState::Shown,
        _ => PromptState::Hidden,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reminder {
    state: PromptState,
}

impl Reminder {
    /// Run the startup transition and overwrite the last-access marker.
    ///
    /// With `enabled = false` the comparison is skipped; the marker is still
    /// written. A failed write is logged and otherwise ignored.
    pub fn on_startup<S: BlobStore>(
        persistence: &mut Persistence<S>,
        now: &DateTime<FixedOffset>,
        zone: &Zone,
        enabled: bool,
    ) -> Self {
        let prev = persistence.load_last_access();
        let state = if enabled {
            evaluate(prev, now, zone)
        } else {
            PromptState::Hidden
        };
        tracing::debug!(?prev, now = %now, ?state, "reminder evaluated");

        if let Err(err) = persistence.save_last_access(now.with_timezone(&Utc)) {
            tracing::warn!(error = %err, "failed to write last-access marker");
        }

        Self { state }
    }

    pub fn state(&self) -> PromptState {
        self.state
    }

    pub fn is_shown(&self) -> bool {
        self.state == PromptState::Shown
    }

    pub fn dismiss(&mut self) {
        self.state = PromptState::Hidden;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryBlobStore, StorageKeys, LAST_ACCESS_KEY};

    fn at(value: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(value).expect("timestamp")
    }

    fn utc() -> Zone {
        Zone::utc()
    }

    fn persistence_with(prev: Option<&str>) -> Persistence<MemoryBlobStore> {
        let blobs = match prev {
            Some(value) => MemoryBlobStore::new().with_entry(LAST_ACCESS_KEY, value),
            None => MemoryBlobStore::new(),
        };
        Persistence::new(blobs, StorageKeys::default())
    }

    #[test]
    fn prior_day_shows_prompt() {
        let mut persistence = persistence_with(Some("2025-02-28T10:00:00.000Z"));
        let reminder =
            Reminder::on_startup(&mut persistence, &at("2025-03-01T08:00:00Z"), &utc(), true);
        assert!(reminder.is_shown());
    }

    #[test]
    fn same_day_stays_hidden() {
        let mut persistence = persistence_with(Some("2025-03-01T01:00:00.000Z"));
        let reminder =
            Reminder::on_startup(&mut persistence, &at("2025-03-01T23:00:00Z"), &utc(), true);
        assert_eq!(reminder.state(), PromptState::Hidden);
    }

    #[test]
    fn calendar_day_uses_clock_offset() {
        // 23:30 UTC on the 28th is already the 1st in Tokyo.
        let prev = at("2025-02-28T23:30:00Z").with_timezone(&Utc);
        let tokyo = at("2025-03-01T10:00:00+09:00");
        assert!(!is_new_day(prev, &tokyo, &Zone::Fixed(*tokyo.offset())));
        assert!(is_new_day(prev, &at("2025-03-01T10:00:00Z"), &utc()));
    }

    #[test]
    fn absent_or_garbled_marker_stays_hidden() {
        let now = at("2025-03-01T08:00:00Z");
        let mut persistence = persistence_with(None);
        assert!(!Reminder::on_startup(&mut persistence, &now, &utc(), true).is_shown());

        let mut persistence = persistence_with(Some("not a date"));
        assert!(!Reminder::on_startup(&mut persistence, &now, &utc(), true).is_shown());
    }

    #[test]
    fn marker_is_overwritten_even_when_disabled() {
        let mut persistence = persistence_with(Some("2025-01-01T00:00:00.000Z"));
        let now = at("2025-03-01T08:00:00Z");
        let reminder = Reminder::on_startup(&mut persistence, &now, &utc(), false);
        assert!(!reminder.is_shown());
        assert_eq!(
            persistence.blobs().entry(LAST_ACCESS_KEY),
            Some("2025-03-01T08:00:00.000Z")
        );
    }

    #[test]
    fn dismiss_hides_prompt() {
        let mut persistence = persistence_with(Some("2025-02-01T00:00:00.000Z"));
        let now = at("2025-03-01T08:00:00Z");
        let mut reminder = Reminder::on_startup(&mut persistence, &now, &utc(), true);
        assert!(reminder.is_shown());
        reminder.dismiss();
        assert_eq!(reminder.state(), PromptState::Hidden);
    }
}
