use crate::controller::Phase;
use crate::table::MentionCard;
use crate::view::{DashboardFrame, DashboardSnapshot};
use serde_json::json;

pub fn render_index(phase: Phase, snapshot: &DashboardSnapshot) -> String {
    let content = snapshot.content.as_ref();
    let hidden = |hide: bool| if hide { "hidden" } else { "" };

    fill(INDEX_HTML, |key| {
        let value = match key {
            "PHASE" => phase_name(phase).to_string(),
            "COMPANY_OPTIONS" => company_options(snapshot),
            "LOADING_HIDDEN" => hidden(!snapshot.loading).to_string(),
            "ERROR_HIDDEN" => hidden(snapshot.error.is_none()).to_string(),
            "ERROR_MESSAGE" => escape_html(snapshot.error.as_deref().unwrap_or_default()),
            "CONTENT_HIDDEN" => hidden(content.is_none()).to_string(),
            "CHARTS_JSON" => charts_json(content),
            _ => content.map(|frame| frame_value(frame, key)).unwrap_or_default(),
        };
        Some(value)
    })
}

fn frame_value(frame: &DashboardFrame, key: &str) -> String {
    let metrics = &frame.metrics;
    match key {
        "COMPANY_NAME" => {
            escape_html(frame.company.as_ref().map_or("", |company| company.name.as_str()))
        }
        "TOTAL" => metrics.total.to_string(),
        "AVG_SCORE" => escape_html(&metrics.avg_score),
        "TREND_ARROW" => metrics.trend.arrow().to_string(),
        "TREND_STYLE" => metrics.trend.style().to_string(),
        "POSITIVE_PCT" => escape_html(&metrics.positive_pct),
        "NEUTRAL_PCT" => escape_html(&metrics.neutral_pct),
        "NEGATIVE_PCT" => escape_html(&metrics.negative_pct),
        "POSITIVE_WIDTH" => format!("{}", metrics.positive_bar_width_pct),
        "NEGATIVE_WIDTH" => format!("{}", metrics.negative_bar_width_pct),
        "TABLE" => frame.table.to_html(),
        "RECENT" => recent_cards(&frame.recent),
        _ => String::new(),
    }
}

fn phase_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "idle",
        Phase::LoadingCompanies => "loading_companies",
        Phase::LoadingDashboard => "loading_dashboard",
        Phase::Ready => "ready",
        Phase::Error => "error",
    }
}

/// Replaces every `{{KEY}}` in one pass, so inserted text is never rescanned.
fn fill(template: &str, mut lookup: impl FnMut(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match lookup(key) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&rest[start..start + end + 4]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn company_options(snapshot: &DashboardSnapshot) -> String {
    snapshot
        .companies
        .iter()
        .map(|option| {
            let selected = if snapshot.selected_company_id == Some(option.id) {
                " selected"
            } else {
                ""
            };
            format!(
                "<option value=\"{}\"{selected}>{}</option>",
                option.id,
                escape_html(&option.label)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn recent_cards(cards: &[MentionCard]) -> String {
    cards
        .iter()
        .map(|card| {
            let class = card.style.map_or("mention-card".to_string(), |style| {
                format!("mention-card {}", style.as_str())
            });
            let title = if is_web_link(&card.url) {
                format!(
                    "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
                    escape_html(&card.url),
                    escape_html(&card.title)
                )
            } else {
                escape_html(&card.title)
            };
            format!(
                "<li class=\"{class}\">{title}<span class=\"meta\">{}</span></li>",
                escape_html(&card.meta)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Chart specs for the inline script. `<` is escaped so a title can never
/// close the surrounding script element.
fn charts_json(content: Option<&DashboardFrame>) -> String {
    let charts = match content {
        Some(frame) => json!({
            "distribution": frame.distribution.to_plotly(),
            "timeline": frame.timeline.to_plotly(),
        }),
        None => json!(null),
    };
    charts.to_string().replace('<', "\\u003c")
}

pub(crate) fn is_web_link(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

pub(crate) fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Company Reputation Dashboard</title>
  <script src="https://cdn.plot.ly/plotly-2.27.0.min.js" charset="utf-8"></script>
  <style>
    :root {
      --bg: #f4f6f8;
      --ink: #24292f;
      --muted: #6c757d;
      --card: #ffffff;
      --positive: #28a745;
      --neutral: #6c757d;
      --negative: #dc3545;
      --shadow: 0 12px 32px rgba(36, 41, 47, 0.08);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Segoe UI", "Helvetica Neue", Arial, sans-serif;
    }

    .app {
      width: min(1200px, 100%);
      margin: 0 auto;
      padding: 24px;
      display: grid;
      gap: 24px;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 16px;
    }

    h1 {
      margin: 0;
      font-size: clamp(1.6rem, 3vw, 2.2rem);
    }

    .selector {
      display: flex;
      gap: 8px;
      align-items: center;
    }

    select,
    button {
      font: inherit;
      padding: 8px 12px;
      border-radius: 8px;
      border: 1px solid #ced4da;
      background: white;
    }

    button {
      cursor: pointer;
    }

    .status {
      color: var(--muted);
    }

    .alert {
      padding: 16px;
      border-radius: 12px;
      background: #f8d7da;
      color: #842029;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
      gap: 16px;
    }

    .stat,
    .chart-card,
    .table-card {
      background: var(--card);
      border-radius: 12px;
      padding: 18px;
      box-shadow: var(--shadow);
    }

    .stat .label {
      display: block;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
    }

    .stat .value {
      display: block;
      font-size: 2rem;
      font-weight: 600;
    }

    .trend.success { color: var(--positive); }
    .trend.secondary { color: var(--neutral); }
    .trend.danger { color: var(--negative); }

    .gauge {
      height: 10px;
      border-radius: 5px;
      background: #e9ecef;
      overflow: hidden;
      margin: 8px 0;
    }

    .gauge span {
      display: block;
      height: 100%;
    }

    #positive-bar { background: var(--positive); }
    #negative-bar { background: var(--negative); }

    .charts {
      display: grid;
      grid-template-columns: 1fr 1fr;
      gap: 16px;
    }

    .charts .wide {
      grid-column: 1 / -1;
    }

    .filters {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
      margin-bottom: 12px;
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th,
    td {
      text-align: left;
      padding: 8px;
      border-bottom: 1px solid #dee2e6;
    }

    tr.table-success { background: #d1e7dd; }
    tr.table-danger { background: #f8d7da; }

    .recent {
      list-style: none;
      margin: 0;
      padding: 0;
      display: grid;
      gap: 8px;
    }

    .mention-card {
      padding: 10px 12px;
      border-left: 4px solid var(--neutral);
      background: white;
      border-radius: 6px;
    }

    .mention-card.success { border-color: var(--positive); }
    .mention-card.danger { border-color: var(--negative); }

    .mention-card .meta {
      display: block;
      font-size: 0.85rem;
      color: var(--muted);
    }

    @media (max-width: 991px) {
      .charts {
        grid-template-columns: 1fr;
      }
    }
  </style>
</head>
<body>
  <main class="app" data-phase="{{PHASE}}">
    <header>
      <h1>Company Reputation Dashboard</h1>
      <form class="selector" id="company-form" method="post" action="/select">
        <select id="company-select" name="company_id" aria-label="Company">
{{COMPANY_OPTIONS}}
        </select>
        <noscript><button type="submit">Show</button></noscript>
        <button type="button" id="refresh-btn">Refresh</button>
      </form>
    </header>

    <div class="status" id="loading" {{LOADING_HIDDEN}}>Loading...</div>
    <div class="alert" id="error-message" role="alert" {{ERROR_HIDDEN}}>{{ERROR_MESSAGE}}</div>

    <div id="dashboard-content" {{CONTENT_HIDDEN}}>
      <h2 id="company-name">{{COMPANY_NAME}}</h2>

      <section class="panel">
        <div class="stat">
          <span class="label">Total mentions</span>
          <span class="value" id="total-mentions">{{TOTAL}}</span>
        </div>
        <div class="stat">
          <span class="label">Sentiment score</span>
          <span class="value" id="sentiment-score">{{AVG_SCORE}} <span class="trend {{TREND_STYLE}}" id="sentiment-trend">{{TREND_ARROW}}</span></span>
        </div>
        <div class="stat">
          <span class="label">Positive <span id="positive-percentage">{{POSITIVE_PCT}}</span></span>
          <div class="gauge"><span id="positive-bar" style="width: {{POSITIVE_WIDTH}}%"></span></div>
          <span class="label">Neutral <span id="neutral-percentage">{{NEUTRAL_PCT}}</span></span>
          <span class="label">Negative <span id="negative-percentage">{{NEGATIVE_PCT}}</span></span>
          <div class="gauge"><span id="negative-bar" style="width: {{NEGATIVE_WIDTH}}%"></span></div>
        </div>
      </section>

      <section class="charts">
        <div class="chart-card">
          <div id="sentiment-distribution-chart"></div>
        </div>
        <div class="chart-card">
          <h3>Recent mentions</h3>
          <ul class="recent" id="recent-mentions">
{{RECENT}}
          </ul>
        </div>
        <div class="chart-card wide">
          <div id="sentiment-timeline-chart"></div>
        </div>
      </section>

      <section class="table-card">
        <div class="filters">
          <select id="sentiment-filter" aria-label="Sentiment">
            <option value="">All sentiments</option>
            <option value="POSITIVE">Positive</option>
            <option value="NEUTRAL">Neutral</option>
            <option value="NEGATIVE">Negative</option>
          </select>
          <select id="period-filter" aria-label="Period">
            <option value="">All time</option>
            <option value="7">Last 7 days</option>
            <option value="30">Last 30 days</option>
            <option value="90">Last 90 days</option>
          </select>
          <span class="date-range" id="date-range-filter">
            <input type="date" id="from-filter" aria-label="From date" />
            <input type="date" id="to-filter" aria-label="To date" />
          </span>
          <select id="sort-filter" aria-label="Sort">
            <option value="">Original order</option>
            <option value="date:desc">Newest first</option>
            <option value="date:asc">Oldest first</option>
            <option value="score:desc">Highest score</option>
            <option value="score:asc">Lowest score</option>
          </select>
        </div>
        <div id="mentions-table">{{TABLE}}</div>
      </section>
    </div>
  </main>

  <script id="chart-data" type="application/json">{{CHARTS_JSON}}</script>
  <script>
    const charts = JSON.parse(document.getElementById('chart-data').textContent);
    const distributionEl = document.getElementById('sentiment-distribution-chart');
    const timelineEl = document.getElementById('sentiment-timeline-chart');
    const tableEl = document.getElementById('mentions-table');
    const errorEl = document.getElementById('error-message');
    const loadingEl = document.getElementById('loading');

    const plot = (el, spec) => {
      if (window.Plotly && spec) {
        Plotly.react(el, spec.data, spec.layout, spec.config);
      }
    };

    const showError = (message) => {
      errorEl.textContent = message;
      errorEl.hidden = false;
    };

    if (charts) {
      plot(distributionEl, charts.distribution);
      plot(timelineEl, charts.timeline);
    }

    document.getElementById('company-select').addEventListener('change', () => {
      loadingEl.hidden = false;
      document.getElementById('company-form').submit();
    });

    document.getElementById('refresh-btn').addEventListener('click', async () => {
      loadingEl.hidden = false;
      await fetch('/api/refresh', { method: 'POST' });
      window.location.reload();
    });

    let resizeTimer = null;
    const sendViewport = async () => {
      const res = await fetch('/api/resize', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ width: window.innerWidth, height: window.innerHeight })
      });
      if (!res.ok) {
        return;
      }
      const rebuilt = await res.json();
      plot(distributionEl, rebuilt.distribution);
      plot(timelineEl, rebuilt.timeline);
    };

    window.addEventListener('resize', () => {
      clearTimeout(resizeTimer);
      resizeTimer = setTimeout(() => sendViewport().catch(() => {}), 250);
    });

    const applyFilters = async () => {
      const params = new URLSearchParams();
      const sentiment = document.getElementById('sentiment-filter').value;
      const days = document.getElementById('period-filter').value;
      const sort = document.getElementById('sort-filter').value;
      const from = document.getElementById('from-filter').value;
      const to = document.getElementById('to-filter').value;
      if (sentiment) {
        params.set('sentiment', sentiment);
      }
      if (days) {
        params.set('days', days);
      } else {
        if (from) {
          params.set('from', from);
        }
        if (to) {
          params.set('to', to);
        }
      }
      if (sort) {
        const [column, order] = sort.split(':');
        params.set('sort', column);
        params.set('order', order);
      }

      const res = await fetch(`/api/mentions?${params}`);
      if (!res.ok) {
        throw new Error(await res.text());
      }
      const body = await res.json();
      tableEl.innerHTML = body.html;
      plot(timelineEl, body.timeline);
    };

    ['sentiment-filter', 'period-filter', 'sort-filter', 'from-filter', 'to-filter'].forEach((id) => {
      document.getElementById(id).addEventListener('change', () => {
        applyFilters().catch((err) => showError(err.message));
      });
    });

    if (charts) {
      sendViewport().catch(() => {});
    }
  </script>
</body>
</html>
"#;
