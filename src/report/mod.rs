//! JSON and HTML report generation.

use crate::diagnostics::{DiagnosticLog, Severity};
use crate::metrics::{
    btk, damage_at_range, required_ranges, ttk, ConfigStats, MetricIndex, Modifiers, RpmSelector,
};
use crate::model::CategoryTree;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Write the canonical data file.
pub fn write_json_report(tree: &CategoryTree, path: &Path) -> Result<(), String> {
    let json = tree.to_json_pretty()?;
    fs::write(path, json).map_err(|e| e.to_string())?;
    Ok(())
}

pub fn write_diagnostics(diagnostics: &DiagnosticLog, path: &Path) -> Result<(), String> {
    let json = serde_json::to_string_pretty(&diagnostics.entries).map_err(|e| e.to_string())?;
    fs::write(path, json).map_err(|e| e.to_string())?;
    Ok(())
}

pub fn write_html_report(
    index: &MetricIndex,
    diagnostics: &DiagnosticLog,
    modifiers: &Modifiers,
    out_dir: &Path,
) -> Result<(), String> {
    fs::create_dir_all(out_dir).map_err(|e| e.to_string())?;
    let pages = weapon_page_names(index.tree());
    fs::write(out_dir.join("index.html"), render_index(index.tree(), &pages))
        .map_err(|e| e.to_string())?;
    fs::write(out_dir.join("diagnostics.html"), render_diagnostics_page(diagnostics))
        .map_err(|e| e.to_string())?;
    for (name, file) in &pages {
        let content = render_weapon_page(index, name, modifiers);
        fs::write(out_dir.join(file), content).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Weapon name -> page file name. Names whose slugs collide get `-2`, `-3`, ... in tree order.
fn weapon_page_names(tree: &CategoryTree) -> HashMap<&str, String> {
    let mut taken = HashSet::new();
    let mut pages = HashMap::new();
    for weapon in tree.weapons() {
        if pages.contains_key(weapon.name.as_str()) {
            continue;
        }
        let base = crate::util::slug(&weapon.name);
        let mut file = format!("weapon_{}.html", base);
        let mut n = 2;
        while !taken.insert(file.clone()) {
            file = format!("weapon_{}-{}.html", base, n);
            n += 1;
        }
        pages.insert(weapon.name.as_str(), file);
    }
    pages
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:1rem;} table{border-collapse:collapse;} th,td{border:1px solid #ccc;padding:6px;} a{color:#06c;} .info{color:#666;} .warn{color:#c60;} .error{color:#c00;}";

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{}</title>
<style>{}</style>
</head>
<body>
{}
</body>
</html>"#,
        html_escape(title),
        STYLE,
        body
    )
}

fn render_index(tree: &CategoryTree, pages: &HashMap<&str, String>) -> String {
    let sections: String = tree
        .categories
        .iter()
        .map(|c| {
            let rows: String = c
                .weapons
                .iter()
                .map(|w| {
                    format!(
                        r#"<tr><td><a href="{}">{}</a></td><td>{}</td><td>{}</td></tr>"#,
                        pages.get(w.name.as_str()).map(String::as_str).unwrap_or(""),
                        html_escape(&w.name),
                        w.stats.len(),
                        w.ammo_stats.len()
                    )
                })
                .collect();
            format!(
                "<h2>{}</h2>\n<table><thead><tr><th>Weapon</th><th>Configurations</th><th>Ammo types</th></tr></thead><tbody>{}</tbody></table>\n",
                html_escape(&c.name),
                rows
            )
        })
        .collect();
    let body = format!(
        r#"<h1>Weapon Stats</h1>
<p>{} weapons, {} configurations. <a href="diagnostics.html">Extraction diagnostics</a></p>
<input type="text" id="search" placeholder="Search weapon…" style="margin-bottom:8px;">
{}
<script>
document.getElementById('search').oninput=function(){{
 var q=this.value.toLowerCase(), rows=document.querySelectorAll('tbody tr');
 rows.forEach(function(r){{
   r.style.display=r.textContent.toLowerCase().indexOf(q)===-1?'none':'';
 }});
}};
</script>"#,
        tree.weapon_count(),
        tree.stat_count(),
        sections
    );
    page("Weapon Stats", &body)
}

fn render_diagnostics_page(diagnostics: &DiagnosticLog) -> String {
    let items: Vec<String> = diagnostics
        .entries
        .iter()
        .map(|d| {
            let sev = match d.severity {
                Severity::Info => "info",
                Severity::Warn => "warn",
                Severity::Error => "error",
            };
            let location = [
                d.sheet.clone(),
                d.weapon.clone(),
                d.row.map(|r| format!("row {}", r + 1)),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" / ");
            format!(
                r#"<tr class="{}"><td>{}</td><td>{}</td><td>{}</td></tr>"#,
                sev,
                html_escape(&d.code),
                html_escape(&location),
                html_escape(&d.message)
            )
        })
        .collect();
    let table = if items.is_empty() {
        "<p>No diagnostics.</p>".to_string()
    } else {
        format!(
            "<table><thead><tr><th>Code</th><th>Location</th><th>Message</th></tr></thead><tbody>{}</tbody></table>",
            items.join("\n")
        )
    };
    let body = format!(
        r#"<h1>Extraction diagnostics</h1>
<p><a href="index.html">Back to weapons</a></p>
<p>{} errors, {} warnings.</p>
{}"#,
        diagnostics.count(Severity::Error),
        diagnostics.count(Severity::Warn),
        table
    );
    page("Extraction diagnostics", &body)
}

fn fmt_opt<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "–".to_string())
}

fn render_weapon_page(index: &MetricIndex, name: &str, modifiers: &Modifiers) -> String {
    let configs: Vec<ConfigStats<'_>> = index.weapon_configurations(name).collect();
    let ranges = required_ranges(&configs, |c, damage| btk(c.ammo, modifiers, damage).map(f64::from));

    let config_rows: String = configs
        .iter()
        .map(|c| {
            let dropoffs = c
                .stat
                .dropoffs
                .iter()
                .map(|d| format!("{} @ {}m", d.damage, d.range))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                html_escape(&c.stat.barrel_type),
                html_escape(&c.stat.ammo_type),
                html_escape(&dropoffs),
                fmt_opt(c.stat.velocity),
                fmt_opt(c.stat.rpm_single),
                fmt_opt(c.stat.rpm_burst),
                fmt_opt(c.stat.rpm_auto)
            )
        })
        .collect();

    let range_headers: String = ranges.iter().map(|r| format!("<th>{}m</th>", r)).collect();
    let ttk_rows: String = configs
        .iter()
        .map(|c| {
            let rpm = RpmSelector::Fastest.select(c.stat);
            let cells: String = ranges
                .iter()
                .map(|&r| {
                    let v = damage_at_range(&c.stat.dropoffs, r)
                        .and_then(|dmg| ttk(c.ammo, modifiers, dmg, rpm));
                    format!("<td>{}</td>", fmt_opt(v))
                })
                .collect();
            format!(
                "<tr><td>{} / {}</td>{}</tr>",
                html_escape(&c.stat.barrel_type),
                html_escape(&c.stat.ammo_type),
                cells
            )
        })
        .collect();

    let ammo_rows: String = index
        .weapon(name)
        .map(|w| {
            w.ammo_stats
                .iter()
                .map(|(ammo, s)| {
                    format!(
                        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                        html_escape(ammo),
                        fmt_opt(s.mag_size),
                        fmt_opt(s.empty_reload),
                        fmt_opt(s.tactical_reload),
                        fmt_opt(s.headshot_multiplier),
                        fmt_opt(s.pellet_count)
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    let body = format!(
        r#"<h1>{}</h1>
<p><a href="index.html">Back to list</a> · {}</p>
<h2>Configurations</h2>
<table><thead><tr><th>Barrel</th><th>Ammo</th><th>Dropoffs</th><th>Velocity</th><th>RPM single</th><th>RPM burst</th><th>RPM auto</th></tr></thead><tbody>{}</tbody></table>
<h2>TTK (ms, fastest fire mode)</h2>
<table><thead><tr><th>Configuration</th>{}</tr></thead><tbody>{}</tbody></table>
<h2>Ammo</h2>
<table><thead><tr><th>Ammo</th><th>Magazine</th><th>Empty reload (s)</th><th>Tactical reload (s)</th><th>Headshot</th><th>Pellets</th></tr></thead><tbody>{}</tbody></table>"#,
        html_escape(name),
        html_escape(index.category_of(name).unwrap_or("")),
        config_rows,
        range_headers,
        ttk_rows,
        ammo_rows
    );
    page(name, &body)
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
