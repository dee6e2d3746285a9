use crate::stats::WeekSummary;
use axum::http::StatusCode;

pub fn render_index(summary: &WeekSummary) -> String {
    let rows: String = summary
        .days
        .iter()
        .map(|point| {
            DAY_ROW
                .replace("{{DAY}}", point.day.as_str())
                .replace("{{COUNT}}", &point.count.to_string())
        })
        .collect();

    INDEX_HTML
        .replace("{{WEEK}}", &summary.week_id.to_string())
        .replace("{{END}}", &summary.end_date)
        .replace("{{ROWS}}", &rows)
        .replace("{{TOTAL}}", &summary.total.to_string())
        .replace("{{GOAL}}", &summary.goal.to_string())
        .replace("{{PERCENT}}", &format!("{:.0}", summary.progress_percent))
        .replace("{{TIER}}", summary.tier.as_str())
}

pub fn render_error(status: StatusCode, message: &str) -> String {
    ERROR_HTML
        .replace("{{STATUS}}", status.as_str())
        .replace("{{REASON}}", status.canonical_reason().unwrap_or("Error"))
        .replace("{{MESSAGE}}", &escape_html(message))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const ERROR_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>{{STATUS}} {{REASON}}</title>
</head>
<body>
  <main>
    <h1>{{REASON}}</h1>
    <p class="error">{{MESSAGE}}</p>
    <p><a href="/">Back to this week</a></p>
  </main>
</body>
</html>
"#;

const DAY_ROW: &str = r#"      <li class="day">
        <span class="name">{{DAY}}</span>
        <form method="post" action="/day/{{DAY}}/sub"><button class="btn-sub" aria-label="one less">&minus;</button></form>
        <span class="count" id="{{DAY}}-count">{{COUNT}}</span>
        <form method="post" action="/day/{{DAY}}/add"><button class="btn-add" aria-label="one more">+</button></form>
      </li>
"#;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Weekly Problem Tracker</title>
  <style>
    :root {
      --bg: #f4f1ea;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: #ffffff;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 24px 16px;
    }

    .app {
      width: min(420px, 100%);
      background: var(--card);
      border-radius: 20px;
      box-shadow: 0 16px 40px rgba(47, 72, 88, 0.16);
      padding: 24px;
      display: grid;
      gap: 18px;
    }

    h1 {
      margin: 0;
      font-size: 1.5rem;
    }

    .subtitle {
      margin: 4px 0 0;
      color: #6b645d;
      font-size: 0.9rem;
    }

    .progress {
      height: 12px;
      border-radius: 999px;
      background: rgba(47, 72, 88, 0.1);
      overflow: hidden;
    }

    .progress-fill {
      height: 100%;
      background: linear-gradient(90deg, #4caf50, #45a049);
    }

    .progress-fill.halfway {
      background: linear-gradient(90deg, #ff9800, #f57c00);
    }

    .progress-fill.complete {
      background: linear-gradient(90deg, #ffd700, #ffa500);
    }

    ul {
      list-style: none;
      margin: 0;
      padding: 0;
      display: grid;
      gap: 8px;
    }

    .day {
      display: grid;
      grid-template-columns: 1fr auto 3ch auto;
      align-items: center;
      gap: 10px;
    }

    .day .name {
      text-transform: capitalize;
    }

    .day .count {
      text-align: center;
      font-weight: 600;
    }

    form {
      margin: 0;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      width: 32px;
      height: 32px;
      font-size: 1rem;
      font-weight: 600;
      color: white;
      cursor: pointer;
    }

    .btn-add {
      background: var(--accent);
    }

    .btn-sub {
      background: var(--accent-2);
    }

    .btn-reset {
      width: 100%;
      height: auto;
      padding: 12px;
      background: #8b857d;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>This week</h1>
      <p class="subtitle">{{WEEK}} to {{END}}</p>
    </header>
    <section>
      <p><strong id="currentCount">{{TOTAL}}</strong> / {{GOAL}} problems ({{PERCENT}}%)</p>
      <div class="progress"><div id="progressFill" class="progress-fill {{TIER}}" style="width: {{PERCENT}}%"></div></div>
    </section>
    <ul>
{{ROWS}}    </ul>
    <form method="post" action="/reset" onsubmit="return confirm('Reset this week\'s progress?');">
      <button class="btn-reset">Reset week</button>
    </form>
  </main>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, WeekId, WeekRecord};
    use crate::stats::build_summary;
    use chrono::NaiveDate;

    #[test]
    fn page_lists_every_day_and_progress() {
        let wednesday = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut record = WeekRecord::empty(WeekId::containing(wednesday));
        record.counts.set(Day::Wednesday, 30);
        let html = render_index(&build_summary(&record, 50));

        for day in Day::ALL {
            assert!(html.contains(&format!("action=\"/day/{day}/add\"")), "{day}");
        }
        assert!(html.contains(r#"<span class="count" id="wednesday-count">30</span>"#));
        assert!(html.contains("width: 60%"));
        assert!(html.contains("progress-fill halfway"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn error_page_escapes_message() {
        let html = render_error(StatusCode::BAD_REQUEST, "unknown day '<b>'");
        assert!(html.contains("<title>400 Bad Request</title>"));
        assert!(html.contains("unknown day &#39;&lt;b&gt;&#39;"));
        assert!(html.contains(r#"href="/""#));
    }
}
