use crate::models::{ArchiveEntry, ExerciseEntry, WeekState};
use crate::week::WeekKey;
use chrono::NaiveDateTime;

pub const REPORT_TITLE: &str = "WINTER ARC — Workout Log";

/// Days rendered in a report, in order. Other day keys are kept in storage
/// but never printed.
pub const REPORT_DAYS: [&str; 5] = ["monday", "tuesday", "wednesday", "thursday", "friday"];

const RULE_WIDTH: usize = 50;
const WEEK_RULE_WIDTH: usize = 30;

/// Plain-text log: the current week first, then archived weeks newest first.
pub fn format_report(
    current_week: &WeekKey,
    current_state: &WeekState,
    archive: &[ArchiveEntry],
    exported_at: NaiveDateTime,
) -> String {
    let mut out = String::new();
    out.push_str(REPORT_TITLE);
    out.push('\n');
    out.push_str(&format!(
        "Exported: {}\n",
        exported_at.format("%-m/%-d/%Y, %-I:%M:%S %p")
    ));
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push_str("\n\n");

    format_week(&mut out, current_week, current_state, true);
    for entry in archive.iter().rev() {
        format_week(&mut out, &entry.week, &entry.data, false);
    }
    out
}

/// Name of the downloaded report for `week`.
pub fn export_filename(week: &WeekKey) -> String {
    format!("winter-arc-log-{week}.txt")
}

fn format_week(out: &mut String, week: &WeekKey, data: &WeekState, is_current: bool) {
    let suffix = if is_current { " (current)" } else { "" };
    out.push_str(&format!("WEEK: {week}{suffix}\n"));
    out.push_str(&"-".repeat(WEEK_RULE_WIDTH));
    out.push('\n');

    let mut any = false;
    for day in REPORT_DAYS {
        let Some(exercises) = data.get(day).filter(|exercises| !exercises.is_empty()) else {
            continue;
        };
        any = true;
        out.push_str(&format!("  {}:\n", capitalize(day)));
        for (id, entry) in exercises {
            out.push_str(&format!("    {}\n", exercise_line(id, entry)));
        }
    }

    if !any {
        out.push_str("  (no exercises tracked)\n");
    }
    out.push('\n');
}

fn exercise_line(id: &str, entry: &ExerciseEntry) -> String {
    let mark = if entry.is_done() { "[x]" } else { "[ ]" };
    let label = id.replace('-', " ");

    let details: Vec<String> = [
        entry.recorded_weight().map(|w| format!("{w}kg")),
        entry.recorded_rpe().map(|r| format!("RPE {r}")),
    ]
    .into_iter()
    .flatten()
    .collect();

    if details.is_empty() {
        format!("{mark} {label}")
    } else {
        format!("{mark} {label} — {}", details.join(" @ "))
    }
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
