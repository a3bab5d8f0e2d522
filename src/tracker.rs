use crate::errors::StoreError;
use crate::kv::KeyValueStore;
use crate::models::{week_state_from_value, ArchiveEntry, ExerciseEntry, ExerciseUpdate, WeekState};
use crate::report::format_report;
use crate::week::{current_week_key, WeekKey};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

pub const CURRENT_WEEK_KEY: &str = "winterarc_current_week";
pub const ARCHIVE_KEY: &str = "winterarc_archive";
const TRACKER_KEY_PREFIX: &str = "winterarc_tracker_";

pub fn tracker_key(week: &WeekKey) -> String {
    format!("{TRACKER_KEY_PREFIX}{week}")
}

fn unreadable_archive_key(now: DateTime<Utc>) -> String {
    format!("{ARCHIVE_KEY}_unreadable_{}", now.timestamp_millis())
}

pub struct WeekTracker<S> {
    store: S,
}

impl<S: KeyValueStore> WeekTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ensure_current_week(&mut self) -> Result<WeekKey, StoreError> {
        self.ensure_current_week_at(Local::now())
    }

    /// Rotation only moves forward: a stored pointer later than `now`'s week
    /// stays active and nothing is archived.
    pub fn ensure_current_week_at<Tz: TimeZone>(
        &mut self,
        now: DateTime<Tz>,
    ) -> Result<WeekKey, StoreError> {
        let current = current_week_key(&now);

        match self.stored_pointer() {
            Some(stored) if stored > current => {
                warn!(
                    stored = %stored,
                    computed = %current,
                    "stored week is ahead of the clock, keeping it active"
                );
                return Ok(stored);
            }
            Some(stored) if stored < current => {
                self.rotate(stored, now.with_timezone(&Utc))?;
            }
            _ => {}
        }

        self.store.set(CURRENT_WEEK_KEY, current.to_string())?;
        Ok(current)
    }

    fn stored_pointer(&self) -> Option<WeekKey> {
        let raw = self.store.get(CURRENT_WEEK_KEY).filter(|raw| !raw.is_empty())?;
        match raw.parse() {
            Ok(week) => Some(week),
            Err(err) => {
                warn!("ignoring current week pointer: {err}");
                None
            }
        }
    }

    fn rotate(&mut self, stale: WeekKey, now: DateTime<Utc>) -> Result<(), StoreError> {
        let data = self.get_state(&stale);
        if data.is_empty() {
            info!(week = %stale, "dropping empty week");
        } else {
            let mut archive = self.stored_archive(now)?;
            let stale_key = stale.to_string();
            let already_archived = archive
                .last()
                .and_then(|entry| entry.get("week"))
                .and_then(Value::as_str)
                == Some(stale_key.as_str());

            if already_archived {
                info!(week = %stale, "week already archived, finishing rotation");
            } else {
                archive.push(serde_json::to_value(ArchiveEntry {
                    week: stale,
                    data,
                    archived_at: now,
                })?);
                self.store.set_json(ARCHIVE_KEY, &archive)?;
                info!(week = %stale, archived = archive.len(), "archived week");
            }
        }
        self.store.remove(&tracker_key(&stale))
    }

    // Entries stay untyped so that appending never rewrites one we cannot
    // decode. A value that is not an array at all is moved aside first.
    fn stored_archive(&mut self, now: DateTime<Utc>) -> Result<Vec<Value>, StoreError> {
        let Some(raw) = self.store.get(ARCHIVE_KEY).filter(|raw| !raw.is_empty()) else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                let backup = unreadable_archive_key(now);
                error!(backup = %backup, "archive is not a JSON array, moving it aside: {err}");
                self.store.set(&backup, raw)?;
                Ok(Vec::new())
            }
        }
    }

    /// Live state for `week`; empty when nothing was recorded or the stored
    /// value is not JSON.
    pub fn get_state(&self, week: &WeekKey) -> WeekState {
        week_state_from_value(&self.store.get_json(&tracker_key(week), Value::Null))
    }

    /// Archived weeks, oldest first. Entries that cannot be read are skipped
    /// here but left in storage.
    pub fn archive(&self) -> Vec<ArchiveEntry> {
        let entries: Vec<Value> = self.store.get_json(ARCHIVE_KEY, Vec::new());
        entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(index, "skipping unreadable archive entry: {err}");
                    None
                }
            })
            .collect()
    }

    /// Writes one field of one exercise and persists the whole week in a
    /// single store write. Never rotates.
    pub fn update_exercise(
        &mut self,
        week: &WeekKey,
        day: &str,
        exercise: &str,
        update: ExerciseUpdate,
    ) -> Result<ExerciseEntry, StoreError> {
        let mut state = self.get_state(week);
        let entry = state
            .entry(day.to_string())
            .or_default()
            .entry(exercise.to_string())
            .or_default();
        entry.apply(update);
        let updated = entry.clone();

        self.store.set_json(&tracker_key(week), &state)?;
        debug!(
            week = %week,
            day,
            exercise,
            field = update.field().as_str(),
            "updated exercise"
        );
        Ok(updated)
    }

    /// Report over `week` followed by the archive, newest first.
    pub fn export(&self, week: &WeekKey, exported_at: NaiveDateTime) -> String {
        format_report(week, &self.get_state(week), &self.archive(), exported_at)
    }
}
