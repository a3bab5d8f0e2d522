use crate::models::{ExerciseEntry, Reading, WeekState};
use crate::report::capitalize;
use crate::week::WeekKey;

/// Exercises shown on the page for each training day.
pub const PROGRAM: [(&str, &[&str]); 5] = [
    ("monday", &["bench-press", "overhead-press", "tricep-dips"]),
    ("tuesday", &["back-squat", "romanian-deadlift", "walking-lunges"]),
    ("wednesday", &["pull-ups", "barbell-row", "face-pulls"]),
    ("thursday", &["deadlift", "front-squat", "hanging-leg-raise"]),
    ("friday", &["incline-bench", "push-press", "farmer-carry"]),
];

pub fn render_index(week: &WeekKey, state: &WeekState) -> String {
    let days: String = PROGRAM
        .iter()
        .map(|(day, exercises)| render_day(day, exercises, state))
        .collect();

    INDEX_HTML
        .replace("{{WEEK}}", &week.to_string())
        .replace("{{DAYS}}", &days)
}

fn render_day(day: &str, exercises: &[&str], state: &WeekState) -> String {
    let title = capitalize(day);

    let rows: String = exercises
        .iter()
        .map(|exercise| {
            let entry = state
                .get(day)
                .and_then(|exercises| exercises.get(*exercise))
                .cloned()
                .unwrap_or_default();
            render_row(day, exercise, &entry)
        })
        .collect();

    format!(
        "      <section class=\"day\">\n        <h2>{title}</h2>\n{rows}      </section>\n"
    )
}

fn render_row(day: &str, exercise: &str, entry: &ExerciseEntry) -> String {
    let checked = if entry.is_done() { " checked" } else { "" };
    let label = exercise.replace('-', " ");
    let weights = options((0..=80u32).map(|step| f64::from(step) * 2.5), entry.weight);
    let rpes = options((10..=20u32).map(|step| f64::from(step) * 0.5), entry.rpe);

    format!(
        "        <div class=\"exercise\">\n          \
         <label><input type=\"checkbox\" class=\"exercise-checkbox\" data-day=\"{day}\" data-exercise=\"{exercise}\"{checked} /> {label}</label>\n          \
         <select class=\"exercise-weight\" data-day=\"{day}\" data-exercise=\"{exercise}\" aria-label=\"{label} weight\">{weights}</select>\n          \
         <select class=\"exercise-rpe\" data-day=\"{day}\" data-exercise=\"{exercise}\" aria-label=\"{label} RPE\">{rpes}</select>\n        \
         </div>\n"
    )
}

fn options(values: impl Iterator<Item = f64>, current: Option<Reading>) -> String {
    let selected = current.and_then(|reading| reading.value());
    let mut found = selected.is_none();
    let mut html = String::from("<option value=\"\">-</option>");

    for value in values {
        let mark = if Some(value) == selected {
            found = true;
            " selected"
        } else {
            ""
        };
        html.push_str(&format!("<option value=\"{value}\"{mark}>{value}</option>"));
    }

    if let (false, Some(value)) = (found, selected) {
        html.push_str(&format!("<option value=\"{value}\" selected>{value}</option>"));
    }
    html
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Winter Arc Tracker</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #e8eef3;
      --bg-2: #b9cfdf;
      --ink: #1f2a33;
      --accent: #3a7ca5;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.88);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #f4f8fb 60%, #eef3f7 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(900px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      align-items: flex-end;
      justify-content: space-between;
      gap: 12px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(2rem, 4vw, 2.6rem);
      margin: 0;
    }

    #week-label {
      margin: 6px 0 0;
      color: #5f6b73;
    }

    .days {
      display: grid;
      gap: 16px;
    }

    .day {
      background: white;
      border-radius: 18px;
      padding: 16px 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 10px;
    }

    .day h2 {
      margin: 0;
      font-size: 1.1rem;
      color: var(--accent-2);
    }

    .exercise {
      display: grid;
      grid-template-columns: 1fr auto auto;
      align-items: center;
      gap: 10px;
      text-transform: capitalize;
    }

    select {
      font: inherit;
      padding: 4px 8px;
      border-radius: 10px;
      border: 1px solid rgba(47, 72, 88, 0.2);
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 14px 20px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
      box-shadow: 0 10px 24px rgba(58, 124, 165, 0.3);
    }

    .status {
      font-size: 0.95rem;
      color: #6b645d;
      min-height: 1.2em;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .status[data-type="ok"] {
      color: #2d7a4b;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <div>
        <h1>Winter Arc</h1>
        <p id="week-label" data-week="{{WEEK}}">Week: {{WEEK}}</p>
      </div>
      <button id="export-btn" type="button">Export log</button>
    </header>

    <div class="days">
{{DAYS}}    </div>

    <div id="status" class="status" role="status"></div>
  </main>

  <script>
    const weekKey = document.getElementById('week-label').dataset.week;
    const statusEl = document.getElementById('status');

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type;
    };

    const save = async (el, field, value) => {
      const res = await fetch('/api/exercise', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({
          week: weekKey,
          day: el.dataset.day,
          exercise: el.dataset.exercise,
          field,
          value
        })
      });
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || 'Save failed');
      }
      setStatus('Saved', 'ok');
      setTimeout(() => setStatus('', ''), 1200);
    };

    document.querySelectorAll('.exercise-checkbox').forEach((cb) => {
      cb.addEventListener('change', () => {
        save(cb, 'done', cb.checked).catch((err) => setStatus(err.message, 'error'));
      });
    });

    [['.exercise-weight', 'weight'], ['.exercise-rpe', 'rpe']].forEach(([selector, field]) => {
      document.querySelectorAll(selector).forEach((sel) => {
        sel.addEventListener('change', () => {
          const value = sel.value === '' ? '' : Number(sel.value);
          save(sel, field, value).catch((err) => setStatus(err.message, 'error'));
        });
      });
    });

    document.getElementById('export-btn').addEventListener('click', () => {
      window.location.href = '/api/export';
    });
  </script>
</body>
</html>
"#;
