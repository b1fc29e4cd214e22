//! Report page generator: resumes the stored session, fetches the
//! profile, and writes a self-contained HTML page with the same text
//! block and charts the dashboard shows.
//!
//! Output: REPORT_PATH (default out/report/index.html)

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Serialize;

use xpboard::api;
use xpboard::session::SessionStore;
use xpboard::state::Config;
use xpboard::view::build_profile_view;

#[derive(Debug, Serialize)]
struct SkillSlice {
    label: String,
    value: f64,
}

#[derive(Debug, Serialize)]
struct XpPoint {
    label: String,
    value: f64,
}

/// All data feeding the report page.
#[derive(Debug, Serialize)]
struct ReportData {
    generated: String,
    username: String,
    welcome: String,
    info_lines: Vec<String>,
    skills: Vec<SkillSlice>,
    xp: Vec<XpPoint>,
}

fn main() -> Result<()> {
    println!("=== XPBoard Report Generator ===");

    let config = Config::from_env();
    let store = SessionStore::open(&config.sqlite_path)?;
    let session = store
        .current()?
        .ok_or_else(|| anyhow!("no stored session; sign in from the dashboard first"))?;
    println!("  session: {}", session.username);

    let api = api::build(&config);
    let runtime = tokio::runtime::Runtime::new()?;
    let profile = runtime
        .block_on(api.fetch_profile(&session.token))
        .map_err(|err| anyhow!("profile load failed: {}", err))?;
    println!("  xp entries: {}", profile.user.xps.len());
    println!("  transactions: {}", profile.transactions.len());

    let vm = build_profile_view(Some(&profile), &session.username, None);
    let data = ReportData {
        generated: chrono::Utc::now().to_rfc3339(),
        username: session.username.clone(),
        welcome: vm.welcome.clone(),
        info_lines: vm.info_lines.clone(),
        skills: vm
            .pie
            .iter()
            .flat_map(|pie| pie.slices.iter())
            .map(|slice| SkillSlice {
                label: slice.label.clone(),
                value: slice.value,
            })
            .collect(),
        xp: vm
            .line
            .iter()
            .flat_map(|line| line.points.iter())
            .map(|(label, value)| XpPoint {
                label: label.clone(),
                value: *value,
            })
            .collect(),
    };

    // The blob lands inside single quotes in the template.
    let json_blob = serde_json::to_string(&data)?
        .replace('\\', "\\\\")
        .replace('\'', "\\'");
    let html = TEMPLATE.replace("__REPORT_DATA__", &json_blob);

    if let Some(parent) = Path::new(&config.report_path).parent() {
        fs::create_dir_all(parent).ok();
    }
    fs::write(&config.report_path, &html)?;
    println!("  report: {}", config.report_path);
    Ok(())
}

const TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>XPBoard Report</title>
<style>
  :root {
    --bg: #12121a;
    --card: #1b1b26;
    --border: #2c2c3a;
    --fg: #e6e6ef;
    --fg-muted: #8a8a9e;
    --accent: rgba(255, 105, 180, 1);
    --mono: "SF Mono", Consolas, monospace;
  }
  body { background: var(--bg); color: var(--fg); font-family: var(--mono); margin: 0; padding: 24px; }
  h1 { font-size: 20px; margin: 0 0 4px; }
  .meta { color: var(--fg-muted); font-size: 12px; margin-bottom: 20px; }
  .card { background: var(--card); border: 1px solid var(--border); border-radius: 8px; padding: 16px; margin-bottom: 16px; }
  .card h2 { font-size: 14px; margin: 0 0 12px; color: var(--accent); }
  .info li { list-style: none; padding: 2px 0; font-size: 13px; }
  .info { margin: 0; padding: 0; }
  .charts { display: flex; gap: 16px; flex-wrap: wrap; }
  .charts .card { flex: 1; min-width: 320px; }
  .pie { max-width: 260px; display: block; margin: 0 auto; }
  .line { width: 100%; }
  .legend { margin: 12px 0 0; padding: 0; }
  .legend li { list-style: none; font-size: 12px; padding: 2px 0; }
  .swatch { display: inline-block; width: 10px; height: 10px; border-radius: 2px; margin-right: 6px; }
  .empty { color: var(--fg-muted); text-align: center; padding: 40px 0; }
  text { fill: var(--fg-muted); font-size: 10px; font-family: var(--mono); }
  text.val { fill: var(--fg); }
  text.title { fill: var(--fg); font-size: 12px; }
</style>
</head>
<body>
  <h1 id="welcome"></h1>
  <div class="meta" id="meta"></div>
  <div class="card">
    <h2>Profile</h2>
    <ul class="info" id="info"></ul>
  </div>
  <div class="charts">
    <div class="card"><h2>Skills</h2><div id="pie"></div></div>
    <div class="card"><h2>XP per Project</h2><div id="line"></div></div>
  </div>
<script>
  const D = JSON.parse('__REPORT_DATA__');
  const FILL = [
    'rgba(255, 105, 180, 0.6)',
    'rgba(255, 20, 147, 0.6)',
    'rgba(255, 182, 193, 0.6)',
    'rgba(255, 160, 122, 0.6)',
    'rgba(255, 215, 0, 0.6)',
  ];
  const EDGE = [
    'rgba(255, 105, 180, 1)',
    'rgba(255, 20, 147, 1)',
    'rgba(255, 182, 193, 1)',
    'rgba(255, 160, 122, 1)',
    'rgba(255, 215, 0, 1)',
  ];

  document.getElementById('welcome').textContent = D.welcome;
  document.getElementById('meta').textContent = `generated ${D.generated} for ${D.username}`;
  document.getElementById('info').innerHTML =
    D.info_lines.map(l => `<li>${l}</li>`).join('');

  function polar(cx, cy, r, angle) {
    return [cx + r * Math.cos(angle), cy + r * Math.sin(angle)];
  }

  function renderPie(el, slices) {
    if (!slices.length) { el.innerHTML = '<p class="empty">No skill data available</p>'; return; }
    const total = slices.reduce((s, x) => s + x.value, 0);
    const cx = 110, cy = 110, r = 100;
    let angle = -Math.PI / 2;
    let svg = '<svg viewBox="0 0 220 220" class="pie">';
    slices.forEach((slice, i) => {
      const frac = total > 0 ? slice.value / total : 1 / slices.length;
      if (frac >= 0.999) {
        svg += `<circle cx="${cx}" cy="${cy}" r="${r}" fill="${FILL[i % FILL.length]}" stroke="${EDGE[i % EDGE.length]}"/>`;
        return;
      }
      const sweep = frac * Math.PI * 2;
      const [x1, y1] = polar(cx, cy, r, angle);
      const [x2, y2] = polar(cx, cy, r, angle + sweep);
      const large = sweep > Math.PI ? 1 : 0;
      svg += `<path d="M ${cx} ${cy} L ${x1.toFixed(2)} ${y1.toFixed(2)} A ${r} ${r} 0 ${large} 1 ${x2.toFixed(2)} ${y2.toFixed(2)} Z"
        fill="${FILL[i % FILL.length]}" stroke="${EDGE[i % EDGE.length]}" stroke-width="1"/>`;
      angle += sweep;
    });
    svg += '</svg>';
    let legend = '<ul class="legend">';
    slices.forEach((slice, i) => {
      legend += `<li><span class="swatch" style="background:${EDGE[i % EDGE.length]}"></span>${slice.label}: ${slice.value}</li>`;
    });
    legend += '</ul>';
    el.innerHTML = svg + legend;
  }

  function renderLine(el, points) {
    if (!points.length) { el.innerHTML = '<p class="empty">No XP data available</p>'; return; }
    const w = 420, h = 240, pad = 40;
    const max = Math.max(...points.map(p => p.value), 1);
    const step = points.length > 1 ? (w - 2 * pad) / (points.length - 1) : 0;
    const xy = points.map((p, i) => [
      points.length > 1 ? pad + i * step : w / 2,
      h - pad - (p.value / max) * (h - 2 * pad),
    ]);
    let svg = `<svg viewBox="0 0 ${w} ${h}" class="line">`;
    svg += `<line x1="${pad}" y1="${h - pad}" x2="${w - pad}" y2="${h - pad}" stroke="#2c2c3a"/>`;
    svg += `<line x1="${pad}" y1="${pad}" x2="${pad}" y2="${h - pad}" stroke="#2c2c3a"/>`;
    const pts = xy.map(([x, y]) => `${x.toFixed(1)},${y.toFixed(1)}`).join(' ');
    svg += `<polygon points="${pts} ${xy[xy.length - 1][0].toFixed(1)},${h - pad} ${xy[0][0].toFixed(1)},${h - pad}"
      fill="rgba(255, 182, 193, 0.2)"/>`;
    svg += `<polyline points="${pts}" fill="none" stroke="rgba(255, 105, 180, 1)" stroke-width="2"/>`;
    xy.forEach(([x, y], i) => {
      svg += `<circle cx="${x.toFixed(1)}" cy="${y.toFixed(1)}" r="3" fill="rgba(255, 105, 180, 1)"/>`;
      svg += `<text x="${x.toFixed(1)}" y="${h - pad + 16}" text-anchor="middle">${points[i].label}</text>`;
      svg += `<text class="val" x="${x.toFixed(1)}" y="${y - 8}" text-anchor="middle">${points[i].value}</text>`;
    });
    svg += `<text class="title" x="${w / 2}" y="16" text-anchor="middle">Total XP per Project</text>`;
    svg += '</svg>';
    el.innerHTML = svg;
  }

  renderPie(document.getElementById('pie'), D.skills);
  renderLine(document.getElementById('line'), D.xp);
</script>
</body>
</html>
"##;
