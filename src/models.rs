use crate::errors::UpdateError;
use crate::week::WeekKey;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, str::FromStr};
use tracing::warn;

/// A weight or RPE reading. `Unset` is a recorded "cleared" value and is
/// stored as an empty string; a missing field is a different thing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Unset,
    Value(f64),
}

impl Reading {
    /// Coerces a loosely typed JSON value. Numbers and numeric strings are
    /// readings, anything else counts as unset.
    pub fn coerce(raw: &Value) -> Self {
        match raw {
            Value::Number(n) => n.as_f64().map_or(Reading::Unset, Reading::Value),
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Reading::Value(v),
                _ => Reading::Unset,
            },
            _ => Reading::Unset,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Value(v) => Some(*v),
            Reading::Unset => None,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{v}"),
            Reading::Unset => Ok(()),
        }
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reading::Value(v) => serializer.serialize_f64(*v),
            Reading::Unset => serializer.serialize_str(""),
        }
    }
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Reading::coerce(&Value::deserialize(deserializer)?))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExerciseEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<Reading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpe: Option<Reading>,
}

impl ExerciseEntry {
    /// Decodes whatever is stored for an exercise. A value that is not an
    /// object still counts as a recorded exercise, with no fields set.
    pub fn from_value(raw: &Value) -> Self {
        let Some(fields) = raw.as_object() else {
            return Self::default();
        };
        let reading = |name: &str| {
            fields
                .get(name)
                .filter(|value| !value.is_null())
                .map(Reading::coerce)
        };
        Self {
            done: fields.get("done").and_then(truthy),
            weight: reading("weight"),
            rpe: reading("rpe"),
        }
    }

    pub fn is_done(&self) -> bool {
        self.done.unwrap_or(false)
    }

    pub fn recorded_weight(&self) -> Option<f64> {
        self.weight.and_then(|r| r.value())
    }

    pub fn recorded_rpe(&self) -> Option<f64> {
        self.rpe.and_then(|r| r.value())
    }

    /// Sets one field, leaving the others as they were.
    pub fn apply(&mut self, update: ExerciseUpdate) {
        match update {
            ExerciseUpdate::Done(done) => self.done = Some(done),
            ExerciseUpdate::Weight(weight) => self.weight = Some(weight),
            ExerciseUpdate::Rpe(rpe) => self.rpe = Some(rpe),
        }
    }
}

impl<'de> Deserialize<'de> for ExerciseEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(ExerciseEntry::from_value(&Value::deserialize(deserializer)?))
    }
}

fn truthy(raw: &Value) -> Option<bool> {
    match raw {
        Value::Null => None,
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|v| v != 0.0)),
        Value::String(s) => Some(!s.is_empty()),
        Value::Array(_) | Value::Object(_) => Some(true),
    }
}

/// Exercises recorded for one day, in the order they were first written.
pub type DayState = IndexMap<String, ExerciseEntry>;

/// Everything recorded for one week, keyed by day identifier.
pub type WeekState = BTreeMap<String, DayState>;

/// Decodes a stored week one day at a time. Days that are not objects are
/// skipped; the rest of the week survives.
pub fn week_state_from_value(raw: &Value) -> WeekState {
    let Some(days) = raw.as_object() else {
        if !raw.is_null() {
            warn!("stored week is not an object, treating it as empty");
        }
        return WeekState::new();
    };

    let mut state = WeekState::new();
    for (day, exercises) in days {
        let Some(exercises) = exercises.as_object() else {
            warn!(day = %day, "skipping day that is not an object");
            continue;
        };
        let day_state: DayState = exercises
            .iter()
            .map(|(id, entry)| (id.clone(), ExerciseEntry::from_value(entry)))
            .collect();
        state.insert(day.clone(), day_state);
    }
    state
}

fn lenient_week_state<'de, D: Deserializer<'de>>(deserializer: D) -> Result<WeekState, D::Error> {
    Ok(week_state_from_value(&Value::deserialize(deserializer)?))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Done,
    Weight,
    Rpe,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Done => "done",
            Field::Weight => "weight",
            Field::Rpe => "rpe",
        }
    }
}

impl FromStr for Field {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "done" => Ok(Field::Done),
            "weight" => Ok(Field::Weight),
            "rpe" => Ok(Field::Rpe),
            other => Err(UpdateError::UnknownField(other.to_string())),
        }
    }
}

/// One field write against an exercise entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExerciseUpdate {
    Done(bool),
    Weight(Reading),
    Rpe(Reading),
}

impl ExerciseUpdate {
    pub fn field(&self) -> Field {
        match self {
            ExerciseUpdate::Done(_) => Field::Done,
            ExerciseUpdate::Weight(_) => Field::Weight,
            ExerciseUpdate::Rpe(_) => Field::Rpe,
        }
    }

    /// Builds an update from a field name and an untyped value, as sent by
    /// the page script.
    pub fn from_parts(field: &str, value: &Value) -> Result<Self, UpdateError> {
        let field: Field = field.parse()?;
        let invalid = || UpdateError::InvalidValue {
            field: field.as_str(),
            value: value.to_string(),
        };
        match field {
            Field::Done => value.as_bool().map(ExerciseUpdate::Done).ok_or_else(invalid),
            Field::Weight | Field::Rpe => {
                let reading = match value {
                    Value::Null => Reading::Unset,
                    Value::Number(_) => Reading::coerce(value),
                    Value::String(s) if s.trim().is_empty() => Reading::Unset,
                    Value::String(_) => match Reading::coerce(value) {
                        Reading::Unset => return Err(invalid()),
                        reading => reading,
                    },
                    _ => return Err(invalid()),
                };
                Ok(if field == Field::Weight {
                    ExerciseUpdate::Weight(reading)
                } else {
                    ExerciseUpdate::Rpe(reading)
                })
            }
        }
    }
}

/// A past week moved out of live storage. Never edited after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub week: WeekKey,
    #[serde(default, deserialize_with = "lenient_week_state")]
    pub data: WeekState,
    #[serde(rename = "archivedAt")]
    pub archived_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ExerciseRequest {
    pub week: String,
    pub day: String,
    pub exercise: String,
    pub field: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeekResponse {
    pub week: WeekKey,
    pub state: WeekState,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExerciseResponse {
    pub week: WeekKey,
    pub day: String,
    pub exercise: String,
    pub entry: ExerciseEntry,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_keeps_absent_and_unset_apart() {
        let entry: ExerciseEntry =
            serde_json::from_value(json!({ "done": false, "weight": "" })).unwrap();
        assert_eq!(entry.done, Some(false));
        assert_eq!(entry.weight, Some(Reading::Unset));
        assert_eq!(entry.rpe, None);
        assert_eq!(entry.recorded_weight(), None);

        let encoded = serde_json::to_value(&entry).unwrap();
        assert_eq!(encoded, json!({ "done": false, "weight": "" }));
    }

    #[test]
    fn entry_decoding_coerces_loose_types() {
        let entry: ExerciseEntry =
            serde_json::from_value(json!({ "done": 1, "weight": "82.5", "rpe": 8 })).unwrap();
        assert!(entry.is_done());
        assert_eq!(entry.recorded_weight(), Some(82.5));
        assert_eq!(entry.recorded_rpe(), Some(8.0));
    }

    #[test]
    fn apply_touches_only_one_field() {
        let mut entry = ExerciseEntry {
            done: Some(true),
            weight: Some(Reading::Value(60.0)),
            rpe: None,
        };
        entry.apply(ExerciseUpdate::Rpe(Reading::Value(7.0)));
        assert_eq!(entry.done, Some(true));
        assert_eq!(entry.recorded_weight(), Some(60.0));
        assert_eq!(entry.recorded_rpe(), Some(7.0));
    }

    #[test]
    fn from_parts_checks_field_and_value_types() {
        assert_eq!(
            ExerciseUpdate::from_parts("done", &json!(true)).unwrap(),
            ExerciseUpdate::Done(true)
        );
        assert_eq!(
            ExerciseUpdate::from_parts("weight", &json!(80)).unwrap(),
            ExerciseUpdate::Weight(Reading::Value(80.0))
        );
        assert_eq!(
            ExerciseUpdate::from_parts("rpe", &json!("")).unwrap(),
            ExerciseUpdate::Rpe(Reading::Unset)
        );
        assert_eq!(
            ExerciseUpdate::from_parts("sets", &json!(3)).unwrap_err(),
            UpdateError::UnknownField("sets".to_string())
        );
        assert!(ExerciseUpdate::from_parts("done", &json!("yes")).is_err());
        assert!(ExerciseUpdate::from_parts("weight", &json!("heavy")).is_err());
        assert!(ExerciseUpdate::from_parts("rpe", &json!([8])).is_err());
    }

    #[test]
    fn readings_render_without_trailing_zeros() {
        assert_eq!(Reading::Value(80.0).to_string(), "80");
        assert_eq!(Reading::Value(82.5).to_string(), "82.5");
        assert_eq!(Reading::Unset.to_string(), "");
    }

    #[test]
    fn archive_entry_uses_camel_case_timestamp() {
        let raw = json!({
            "week": "2024-W01",
            "data": { "monday": { "squat": { "done": true } } },
            "archivedAt": "2024-01-08T09:00:00Z"
        });
        let entry: ArchiveEntry = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(entry.week.to_string(), "2024-W01");
        assert!(entry.data["monday"]["squat"].is_done());
        let encoded = serde_json::to_value(&entry).unwrap();
        assert_eq!(encoded["archivedAt"], raw["archivedAt"]);
    }
}
