//! HTML rendering of the interactive dashboard.
//!
//! Charts are inlined as SVG. Narrative blocks are editable textareas
//! seeded with the default prose; edits live only in the browser.

use crate::chart::Figure;
use crate::figures::{section_figures, Section};
use crate::loader::Dataset;
use crate::narrative;
use crate::render::{render_svg, PAGE_CHART_SIZE};
use crate::report::summary_table;
use crate::reports::Analysis;
use crate::util::{format_int, format_optional};
use std::fmt::Write;
use tracing::warn;

/// Canvas size of charts spanning the full page width.
const WIDE_CHART_SIZE: (u32, u32) = (1120, 480);

#[derive(Debug, Clone)]
pub struct PageOptions {
    pub title: String,
    pub sample_rows: usize,
}

const STYLE: &str = r#"
body { font-family: "DejaVu Sans", Helvetica, Arial, sans-serif; margin: 0; color: #222; background: #fafafa; }
header { background: #191970; color: #f5f5f5; padding: 1.5rem 2rem; }
header h1 { margin: 0 0 .3rem 0; }
main { max-width: 1180px; margin: 0 auto; padding: 1rem 2rem 3rem; }
nav a { margin-right: 1rem; color: #191970; }
section { margin-top: 2rem; }
h2 { color: #191970; border-bottom: 2px solid #191970; padding-bottom: .2rem; }
textarea.narrative { width: 100%; min-height: 5.5rem; font: inherit; padding: .5rem; box-sizing: border-box; }
.grid { display: grid; grid-template-columns: 1fr 1fr; gap: 1rem; }
figure { margin: 0; background: #fff; border: 1px solid #ddd; padding: .5rem; }
figure.wide { margin-top: 1rem; }
figure svg { width: 100%; height: auto; }
figcaption { font-size: .85rem; color: #666; margin-top: .3rem; }
table { border-collapse: collapse; }
th, td { border: 1px solid #bbb; padding: .25rem .6rem; }
th { background: #191970; color: #f5f5f5; }
td.num { text-align: right; }
.stats td:first-child { font-weight: bold; background: #f5f5dc; }
.chart-error, .error { color: #8b0000; }
#export-status { margin-left: 1rem; }
"#;

const EXPORT_SCRIPT: &str = r#"
(function () {
  var button = document.getElementById('export-btn');
  var status = document.getElementById('export-status');
  button.addEventListener('click', function () {
    button.disabled = true;
    status.textContent = 'Generating report…';
    fetch('report', { method: 'POST' })
      .then(function (resp) {
        if (!resp.ok) {
          return resp.json().then(function (body) { throw new Error(body.message || resp.statusText); });
        }
        var disposition = resp.headers.get('Content-Disposition') || '';
        var match = /filename="?([^";]+)"?/.exec(disposition);
        var name = match ? match[1] : 'space_missions_report.pdf';
        return resp.blob().then(function (blob) {
          var url = URL.createObjectURL(blob);
          var link = document.createElement('a');
          link.href = url;
          link.download = name;
          document.body.appendChild(link);
          link.click();
          link.remove();
          URL.revokeObjectURL(url);
          status.textContent = 'Report downloaded: ' + name;
        });
      })
      .catch(function (err) { status.textContent = 'Error generating report: ' + err.message; })
      .finally(function () { button.disabled = false; });
  });
})();
"#;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn head(out: &mut String, title: &str) {
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n",
        escape(title),
        STYLE
    );
}

fn figure_html(out: &mut String, figure: &Figure) {
    let size = if figure.spec.wide { WIDE_CHART_SIZE } else { PAGE_CHART_SIZE };
    let class = if figure.spec.wide { " class=\"wide\"" } else { "" };
    let _ = write!(out, "<figure id=\"{}\"{}>", figure.spec.id, class);
    match render_svg(figure, size) {
        Ok(svg) => out.push_str(&svg),
        Err(e) => {
            warn!(chart = figure.spec.id, error = %e, "chart skipped on page");
            let _ = write!(
                out,
                "<p class=\"chart-error\">{}: chart could not be drawn ({})</p>",
                escape(&figure.spec.title),
                escape(&e.to_string())
            );
        }
    }
    if let Some(note) = narrative::chart_note(figure.spec.id) {
        let _ = write!(out, "<figcaption>{}</figcaption>", escape(note));
    }
    out.push_str("</figure>\n");
}

fn overview(out: &mut String, dataset: &Dataset, analysis: &Analysis) {
    let table = summary_table(&analysis.summary);
    out.push_str("<section id=\"overview\">\n<h2>Dataset Overview</h2>\n");
    let _ = write!(
        out,
        "<textarea class=\"narrative\">{}</textarea>\n",
        escape(&narrative::introduction(&analysis.summary))
    );
    let _ = write!(
        out,
        "<table class=\"stats\"><tr><th>{}</th><th>{}</th></tr>",
        escape(&table.header[0]),
        escape(&table.header[1])
    );
    for [key, value] in &table.rows {
        let _ = write!(out, "<tr><td>{}</td><td class=\"num\">{}</td></tr>", escape(key), escape(value));
    }
    out.push_str("</table>\n");

    let report = &dataset.report;
    let _ = write!(
        out,
        "<p>Loaded {} rows from <code>{}</code>; {} without a usable year.",
        format_int(report.rows_read),
        escape(&dataset.source.path.display().to_string()),
        format_int(report.null_years)
    );
    if report.translated_types > 0 {
        let _ = write!(out, " {} mission type labels normalized.", format_int(report.translated_types));
    }
    if !report.missing_columns.is_empty() {
        let names: Vec<String> = report.missing_columns.iter().map(|c| c.to_string()).collect();
        let _ = write!(out, " Columns not present: {}.", escape(&names.join(", ")));
    }
    out.push_str("</p>\n");
}

fn sample_viewer(out: &mut String, dataset: &Dataset, rows: usize) {
    let shown = rows.min(dataset.len());
    let _ = write!(
        out,
        "<details id=\"sample\"><summary>Sample data (first {} of {} records)</summary>\n<table>\
         <tr><th>Country</th><th>Mission Name</th><th>Mission Type</th><th>Year</th>\
         <th>Budget (B$)</th><th>Success Rate (%)</th><th>Duration (days)</th></tr>\n",
        format_int(shown),
        format_int(dataset.len())
    );
    let num = |v: Option<f64>| format_optional(v, |v| format!("{v}"));
    for r in dataset.records.iter().take(rows) {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td>\
             <td class=\"num\">{}</td><td class=\"num\">{}</td></tr>\n",
            escape(&r.country),
            escape(&r.mission_name),
            escape(&r.mission_type),
            r.year.map(|y| y.to_string()).unwrap_or_else(|| "n/a".to_string()),
            num(r.budget),
            num(r.success_rate),
            num(r.duration)
        );
    }
    out.push_str("</table></details>\n");
}

fn section_html(out: &mut String, analysis: &Analysis, section: Section) {
    let _ = write!(
        out,
        "<section id=\"{}\">\n<h2>{}</h2>\n<textarea class=\"narrative\">{}</textarea>\n",
        section.anchor(),
        escape(section.title()),
        escape(narrative::section_intro(section))
    );
    let (wide, grid): (Vec<Figure>, Vec<Figure>) = section_figures(analysis, section)
        .into_iter()
        .partition(|f| f.spec.wide);
    out.push_str("<div class=\"grid\">\n");
    for figure in &grid {
        figure_html(out, figure);
    }
    out.push_str("</div>\n");
    for figure in &wide {
        figure_html(out, figure);
    }
    out.push_str("</section>\n");
}

fn conclusion(out: &mut String) {
    out.push_str("<section id=\"conclusion\">\n<h2>Conclusions</h2>\n");
    let _ = write!(
        out,
        "<textarea class=\"narrative\" rows=\"10\">{}</textarea>\n<h3>Key Findings</h3>\n<ul>",
        escape(&narrative::CONCLUSION.join("\n\n"))
    );
    for finding in narrative::KEY_FINDINGS {
        let _ = write!(out, "<li>{}</li>", escape(finding));
    }
    out.push_str("</ul>\n</section>\n");
}

/// The full dashboard for one loaded dataset.
pub fn dashboard(dataset: &Dataset, analysis: &Analysis, options: &PageOptions) -> String {
    let mut out = String::with_capacity(256 * 1024);
    head(&mut out, &options.title);
    let _ = write!(
        out,
        "<header><h1>{}</h1><p>Interactive exploration of global space missions: countries, \
         mission types, budgets and success rates.</p></header>\n<main>\n<nav>",
        escape(&options.title)
    );
    out.push_str("<a href=\"#overview\">Overview</a>");
    for section in Section::ALL {
        let _ = write!(out, "<a href=\"#{}\">{}</a>", section.anchor(), escape(section.title()));
    }
    out.push_str("<a href=\"#conclusion\">Conclusions</a><a href=\"#export\">Export</a></nav>\n");

    overview(&mut out, dataset, analysis);
    sample_viewer(&mut out, dataset, options.sample_rows);
    for section in Section::ALL {
        section_html(&mut out, analysis, section);
    }
    conclusion(&mut out);

    out.push_str(
        "<section id=\"export\">\n<h2>Export</h2>\n<p>Download the charts and statistics above as a PDF report.</p>\n\
         <button id=\"export-btn\" type=\"button\">Generate PDF report</button><span id=\"export-status\"></span>\n\
         </section>\n</main>\n",
    );
    let _ = write!(out, "<script>{}</script>\n</body>\n</html>\n", EXPORT_SCRIPT);
    out
}

/// Shown instead of the dashboard when the dataset cannot be loaded.
pub fn error_page(title: &str, cause: &str) -> String {
    let mut out = String::new();
    head(&mut out, title);
    let _ = write!(
        out,
        "<header><h1>{}</h1></header>\n<main>\n<h2 class=\"error\">The dataset could not be loaded</h2>\n\
         <p class=\"error\">{}</p>\n<p>Check the data path in the configuration and reload the page.</p>\n\
         </main>\n</body>\n</html>\n",
        escape(title),
        escape(cause)
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{LoadReport, Schema, SourceIdentity};
    use crate::types::MissionRecord;
    use std::path::PathBuf;

    fn dataset(n: usize) -> Dataset {
        let records = (0..n)
            .map(|i| MissionRecord {
                country: if i % 2 == 0 { "USA" } else { "R&D <Lab>" }.to_string(),
                mission_name: format!("Mission {i}"),
                mission_type: "Probe".to_string(),
                year: Some(2000 + i as i32 % 3),
                budget: Some(1.5),
                success_rate: Some(90.0),
                duration: Some(12.0),
            })
            .collect();
        Dataset {
            records,
            schema: Schema::complete(),
            source: SourceIdentity {
                path: PathBuf::from("missions.csv"),
                modified: None,
                len: 0,
            },
            report: LoadReport {
                rows_read: n,
                ..LoadReport::default()
            },
        }
    }

    fn options() -> PageOptions {
        PageOptions {
            title: "Space <Dashboard>".to_string(),
            sample_rows: 3,
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
    }

    #[test]
    fn dashboard_has_every_section_and_chart() {
        let ds = dataset(24);
        let analysis = Analysis::compute(&ds);
        let html = dashboard(&ds, &analysis, &options());

        assert!(html.contains("<title>Space &lt;Dashboard&gt;</title>"));
        for section in Section::ALL {
            assert!(html.contains(&format!("<section id=\"{}\">", section.anchor())));
        }
        assert_eq!(html.matches("<figure id=").count(), 10);
        assert_eq!(html.matches("<svg").count(), 10);
        assert_eq!(html.matches("<textarea").count(), 5);
        assert!(html.contains("id=\"export-btn\""));
        assert!(html.contains("R&amp;D &lt;Lab&gt;"));
    }

    #[test]
    fn sample_viewer_limits_rows() {
        let ds = dataset(10);
        let mut out = String::new();
        sample_viewer(&mut out, &ds, 3);
        assert!(out.contains("first 3 of 10 records"));
        assert!(out.contains("Mission 2"));
        assert!(!out.contains("Mission 3<"));
    }

    #[test]
    fn empty_dataset_shows_no_data_in_every_chart() {
        let ds = dataset(0);
        let analysis = Analysis::compute(&ds);
        let html = dashboard(&ds, &analysis, &options());
        assert_eq!(html.matches("No data to display").count(), 10);
    }

    #[test]
    fn error_page_names_cause() {
        let html = error_page("Dash", "dataset not found: x.csv");
        assert!(html.contains("dataset not found: x.csv"));
        assert!(!html.contains("<svg"));
    }
}
