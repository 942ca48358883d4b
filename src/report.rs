//! Ordered description of the PDF report.
//!
//! [`assemble`] turns an [`Analysis`] into a list of [`Block`]s; `pdf::write`
//! lays them out. Keeping the two apart lets the block order be checked
//! without decoding a PDF.

use crate::chart::Figure;
use crate::error::ReportError;
use crate::figures::{section_figures, Section};
use crate::loader::Dataset;
use crate::narrative;
use crate::pdf;
use crate::reports::Analysis;
use crate::types::SummaryStats;
use crate::util::{format_int, format_number, format_optional};
use chrono::{Local, NaiveDateTime};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct StatTable {
    pub header: [String; 2],
    pub rows: Vec<[String; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    Subtitle(String),
    Heading(String),
    Subheading(String),
    Paragraph(String),
    Bullet(String),
    /// Small print under a chart.
    Note(String),
    Table(StatTable),
    Chart(Figure),
    /// Vertical gap in points.
    Spacer(f32),
    PageBreak,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub title: String,
    pub generated_at: NaiveDateTime,
}

impl ReportOptions {
    pub fn now(title: impl Into<String>) -> Self {
        ReportOptions {
            title: title.into(),
            generated_at: Local::now().naive_local(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub generated_at: NaiveDateTime,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn figures(&self) -> impl Iterator<Item = &Figure> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Chart(f) => Some(f),
            _ => None,
        })
    }
}

pub fn report_filename(generated_at: NaiveDateTime) -> String {
    format!("space_missions_report_{}.pdf", generated_at.format("%Y%m%d_%H%M%S"))
}

pub fn summary_table(summary: &SummaryStats) -> StatTable {
    let period = match (summary.first_year, summary.last_year) {
        (Some(a), Some(b)) => format!("{a} - {b}"),
        _ => "n/a".to_string(),
    };
    let row = |k: &str, v: String| [k.to_string(), v];
    StatTable {
        header: ["Metric".to_string(), "Value".to_string()],
        rows: vec![
            row("Total missions", format_int(summary.records)),
            row("Period covered", period),
            row("Countries", format_int(summary.countries)),
            row("Mission types", format_int(summary.mission_types)),
            row(
                "Mean success rate",
                format_optional(summary.mean_success_rate, |v| format!("{}%", format_number(v, 2))),
            ),
            row(
                "Mean budget",
                format_optional(summary.mean_budget, |v| format!("${} billion", format_number(v, 2))),
            ),
        ],
    }
}

fn subheading_for(figure_id: &str) -> Option<&'static str> {
    match figure_id {
        "type-evolution" => Some("Evolution of Mission Types Over Time"),
        "success-by-budget" => Some("Budget and Success Rate"),
        _ => None,
    }
}

pub fn assemble(analysis: &Analysis, options: &ReportOptions) -> Document {
    let mut blocks = vec![
        Block::Title(options.title.clone()),
        Block::Subtitle(format!(
            "Report generated on {}",
            options.generated_at.format("%Y-%m-%d %H:%M")
        )),
        Block::Spacer(24.0),
        Block::Heading("Introduction".to_string()),
        Block::Paragraph(narrative::introduction(&analysis.summary)),
        Block::Spacer(12.0),
        Block::Subheading("General Statistics".to_string()),
        Block::Table(summary_table(&analysis.summary)),
        Block::PageBreak,
    ];

    for section in Section::ALL {
        blocks.push(Block::Heading(section.title().to_string()));
        blocks.push(Block::Paragraph(narrative::section_intro(section).to_string()));
        for figure in section_figures(analysis, section) {
            if let Some(sub) = subheading_for(figure.spec.id) {
                blocks.push(Block::Subheading(sub.to_string()));
            }
            let note = narrative::chart_note(figure.spec.id);
            blocks.push(Block::Chart(figure));
            if let Some(note) = note {
                blocks.push(Block::Note(note.to_string()));
            }
        }
        blocks.push(Block::PageBreak);
    }

    blocks.push(Block::Heading("Conclusions".to_string()));
    blocks.extend(
        narrative::CONCLUSION
            .iter()
            .map(|p| Block::Paragraph(p.to_string())),
    );
    blocks.push(Block::Spacer(12.0));
    blocks.push(Block::Subheading("Key Findings".to_string()));
    blocks.extend(
        narrative::KEY_FINDINGS
            .iter()
            .map(|f| Block::Bullet(f.to_string())),
    );

    Document {
        title: options.title.clone(),
        generated_at: options.generated_at,
        blocks,
    }
}

/// Aggregate, assemble and encode the report for one dataset.
pub fn generate(dataset: &Dataset, options: &ReportOptions) -> Result<Vec<u8>, ReportError> {
    let analysis = Analysis::compute(dataset);
    let document = assemble(&analysis, options);
    let bytes = pdf::write(&document)?;
    info!(
        records = dataset.len(),
        charts = document.figures().count(),
        bytes = bytes.len(),
        "report generated"
    );
    Ok(bytes)
}
