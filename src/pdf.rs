//! PDF encoding of a report [`Document`].
//!
//! Text uses the builtin Helvetica faces with WinAnsi encoding, so no font
//! is embedded. Charts are rasterized to PNG in a temporary directory,
//! decoded and embedded as RGB image XObjects. The temporary directory is
//! removed when the write finishes, whether it succeeds or not.
//!
//! The writer adds no random file identifier, so identical documents encode
//! to identical bytes.

use crate::chart::Figure;
use crate::error::ReportError;
use crate::render::{render_png, REPORT_CHART_SIZE};
use crate::report::{Block, Document, StatTable};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream};
use std::path::Path;
use tempfile::TempDir;
use tracing::debug;

const PAGE_W: f32 = 595.28;
const PAGE_H: f32 = 841.89;
const MARGIN: f32 = 72.0;
const LEFT: f32 = MARGIN;
const TOP: f32 = PAGE_H - MARGIN;
const BOTTOM: f32 = MARGIN;
const CONTENT_W: f32 = PAGE_W - 2.0 * MARGIN;

/// Charts are placed at 6 x 4 inches.
const CHART_W: f32 = 432.0;
const CHART_H: f32 = 288.0;

type Color = (f32, f32, f32);
const BLACK: Color = (0.0, 0.0, 0.0);
const MUTED: Color = (0.4, 0.4, 0.4);
const HEADING: Color = (0.098, 0.098, 0.439);
const BEIGE: Color = (0.961, 0.961, 0.863);
const WHITE_SMOKE: Color = (0.961, 0.961, 0.961);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Oblique => "F3",
        }
    }

    fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Oblique => "Helvetica-Oblique",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    font: Font,
    size: f32,
    leading: f32,
    color: Color,
}

const TITLE: TextStyle = TextStyle { font: Font::Bold, size: 24.0, leading: 32.0, color: HEADING };
const SUBTITLE: TextStyle = TextStyle { font: Font::Regular, size: 11.0, leading: 16.0, color: MUTED };
const H1: TextStyle = TextStyle { font: Font::Bold, size: 16.0, leading: 22.0, color: HEADING };
const H2: TextStyle = TextStyle { font: Font::Bold, size: 13.0, leading: 18.0, color: BLACK };
const BODY: TextStyle = TextStyle { font: Font::Regular, size: 11.0, leading: 15.0, color: BLACK };
const NOTE: TextStyle = TextStyle { font: Font::Oblique, size: 9.0, leading: 12.0, color: MUTED };

/// Approximate Helvetica advance width in em.
fn char_em(c: char) -> f32 {
    match c {
        ' ' | 'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' | 'I' => 0.278,
        'f' | 't' | 'r' | '(' | ')' | '-' | '/' => 0.333,
        'm' | 'w' | 'M' | 'W' | '%' => 0.86,
        '0'..='9' | '$' | '?' => 0.556,
        c if c.is_uppercase() => 0.68,
        _ => 0.556,
    }
}

fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let bold = if font == Font::Bold { 1.06 } else { 1.0 };
    text.chars().map(char_em).sum::<f32>() * size * bold
}

/// Greedy word wrap. A single word wider than the line gets a line of its own.
fn wrap(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if !current.is_empty() && text_width(&candidate, font, size) > max_width {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Text to WinAnsi bytes; characters outside the code page become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{20ac}' => 0x80,
            _ => b'?',
        })
        .collect()
}

fn reals(values: &[f32]) -> Vec<Object> {
    values.iter().map(|v| Object::Real(*v)).collect()
}

fn name(n: &str) -> Object {
    Object::Name(n.as_bytes().to_vec())
}

/// Flows blocks onto pages, top to bottom.
struct Layout {
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    y: f32,
    dirty: bool,
}

impl Layout {
    fn new() -> Self {
        Layout {
            pages: Vec::new(),
            ops: Vec::new(),
            y: TOP,
            dirty: false,
        }
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.ops));
        self.y = TOP;
        self.dirty = false;
    }

    /// Start a new page unless `height` still fits on this one.
    fn reserve(&mut self, height: f32) {
        if self.dirty && self.y - height < BOTTOM {
            self.break_page();
        }
    }

    fn gap(&mut self, height: f32) {
        if !self.dirty {
            return;
        }
        self.y -= height;
        if self.y < BOTTOM {
            self.break_page();
        }
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if self.dirty || self.pages.is_empty() {
            self.break_page();
        }
        self.pages
    }

    fn text_at(&mut self, text: &str, style: TextStyle, x: f32, baseline: f32) {
        let (r, g, b) = style.color;
        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("rg", reals(&[r, g, b])),
            Operation::new("Tf", vec![name(style.font.resource()), Object::Real(style.size)]),
            Operation::new("Td", reals(&[x, baseline])),
            Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]),
            Operation::new("ET", vec![]),
        ]);
        self.dirty = true;
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.ops.extend([
            Operation::new("rg", reals(&[color.0, color.1, color.2])),
            Operation::new("re", reals(&[x, y, w, h])),
            Operation::new("f", vec![]),
        ]);
        self.dirty = true;
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, width: f32) {
        self.ops.extend([
            Operation::new("RG", reals(&[0.0, 0.0, 0.0])),
            Operation::new("w", reals(&[width])),
            Operation::new("re", reals(&[x, y, w, h])),
            Operation::new("S", vec![]),
        ]);
        self.dirty = true;
    }

    fn lines(&mut self, text: &str, style: TextStyle, indent: f32) {
        for line in wrap(text, style.font, style.size, CONTENT_W - indent) {
            self.reserve(style.leading);
            let baseline = self.y - style.size;
            self.text_at(&line, style, LEFT + indent, baseline);
            self.y -= style.leading;
        }
    }

    fn centered(&mut self, text: &str, style: TextStyle) {
        self.reserve(style.leading);
        let x = LEFT + (CONTENT_W - text_width(text, style.font, style.size)).max(0.0) / 2.0;
        let baseline = self.y - style.size;
        self.text_at(text, style, x, baseline);
        self.y -= style.leading;
    }

    fn bullet(&mut self, text: &str) {
        let indent = 14.0;
        self.reserve(BODY.leading);
        let baseline = self.y - BODY.size;
        self.text_at("\u{2022}", BODY, LEFT + 2.0, baseline);
        self.lines(text, BODY, indent);
    }

    fn table(&mut self, table: &StatTable) {
        let widths = [216.0f32, 144.0];
        let total: f32 = widths.iter().sum();
        let x0 = LEFT + (CONTENT_W - total) / 2.0;
        let header_h = 24.0;
        let row_h = 18.0;
        let header_style = TextStyle { font: Font::Bold, size: 12.0, leading: header_h, color: WHITE_SMOKE };
        let key_style = TextStyle { font: Font::Bold, size: 10.0, leading: row_h, color: BLACK };
        let value_style = TextStyle { font: Font::Regular, size: 10.0, leading: row_h, color: BLACK };

        self.reserve(header_h + row_h * table.rows.len() as f32);
        let mut top = self.y;

        self.fill_rect(x0, top - header_h, total, header_h, HEADING);
        let mut x = x0;
        for (cell, w) in table.header.iter().zip(widths) {
            let tw = text_width(cell, Font::Bold, 12.0);
            self.text_at(cell, header_style, x + (w - tw).max(0.0) / 2.0, top - header_h + 8.0);
            self.stroke_rect(x, top - header_h, w, header_h, 1.0);
            x += w;
        }
        top -= header_h;

        for row in &table.rows {
            self.fill_rect(x0, top - row_h, total, row_h, BEIGE);
            self.text_at(&row[0], key_style, x0 + 6.0, top - row_h + 5.5);
            let vw = text_width(&row[1], Font::Regular, 10.0);
            self.text_at(&row[1], value_style, x0 + total - 6.0 - vw, top - row_h + 5.5);
            self.stroke_rect(x0, top - row_h, widths[0], row_h, 1.0);
            self.stroke_rect(x0 + widths[0], top - row_h, widths[1], row_h, 1.0);
            top -= row_h;
        }
        self.y = top;
    }

    fn image(&mut self, resource: &str, w: f32, h: f32) {
        self.reserve(h);
        let x = LEFT + (CONTENT_W - w) / 2.0;
        let y = self.y - h;
        self.ops.extend([
            Operation::new("q", vec![]),
            Operation::new("cm", reals(&[w, 0.0, 0.0, h, x, y])),
            Operation::new("Do", vec![name(resource)]),
            Operation::new("Q", vec![]),
        ]);
        self.dirty = true;
        self.y -= h;
    }

    /// Framed message in place of a chart that has nothing to draw.
    fn placeholder(&mut self, title: &str, message: &str) {
        let h = 64.0;
        self.reserve(h);
        let x = LEFT + (CONTENT_W - CHART_W) / 2.0;
        self.stroke_rect(x, self.y - h, CHART_W, h, 0.5);
        let title_style = TextStyle { font: Font::Bold, size: 11.0, leading: 14.0, color: BLACK };
        let msg_style = TextStyle { font: Font::Oblique, size: 10.0, leading: 14.0, color: MUTED };
        let top = self.y;
        let tx = x + (CHART_W - text_width(title, Font::Bold, 11.0)).max(0.0) / 2.0;
        self.text_at(title, title_style, tx, top - 24.0);
        let mx = x + (CHART_W - text_width(message, Font::Oblique, 10.0)).max(0.0) / 2.0;
        self.text_at(message, msg_style, mx, top - 44.0);
        self.y -= h;
    }

    fn footer(ops: &mut Vec<Operation>, page: usize, total: usize) {
        let text = format!("Page {page} of {total}");
        let x = LEFT + (CONTENT_W - text_width(&text, Font::Regular, 9.0)) / 2.0;
        ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("rg", reals(&[MUTED.0, MUTED.1, MUTED.2])),
            Operation::new("Tf", vec![name(Font::Regular.resource()), Object::Real(9.0)]),
            Operation::new("Td", reals(&[x, 40.0])),
            Operation::new("Tj", vec![Object::string_literal(win_ansi(&text))]),
            Operation::new("ET", vec![]),
        ]);
    }
}

/// A rasterized chart ready to embed.
struct ChartImage {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

/// Turns a chart into pixels, writing any intermediate files under the
/// scratch directory it is given.
type Rasterizer<'a> = dyn Fn(&Figure, usize, &Path) -> Result<ChartImage, ReportError> + 'a;

fn rasterize(figure: &Figure, index: usize, scratch: &Path) -> Result<ChartImage, ReportError> {
    let path = scratch.join(format!("{:02}-{}.png", index, figure.spec.id));
    render_png(figure, &path, REPORT_CHART_SIZE)?;
    let decoded = image::open(&path).map_err(|e| ReportError::Image {
        path: path.clone(),
        message: e.to_string(),
    })?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(ChartImage {
        width,
        height,
        rgb: rgb.into_raw(),
    })
}

fn new_scratch(parent: Option<&Path>) -> Result<TempDir, ReportError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("space-dashboard-");
    match parent {
        Some(dir) => builder.tempdir_in(dir),
        None => builder.tempdir(),
    }
    .map_err(ReportError::Scratch)
}

/// Encode `document` as PDF bytes. Chart images live in a fresh temporary
/// directory for the duration of the call.
pub fn write(document: &Document) -> Result<Vec<u8>, ReportError> {
    let scratch = new_scratch(None)?;
    encode(document, scratch.path(), &rasterize)
}

/// Like [`write`], with the temporary directory created under `parent`.
pub fn write_in(document: &Document, parent: &Path) -> Result<Vec<u8>, ReportError> {
    write_in_with(document, parent, &rasterize)
}

fn write_in_with(
    document: &Document,
    parent: &Path,
    raster: &Rasterizer<'_>,
) -> Result<Vec<u8>, ReportError> {
    // Dropping `scratch` removes it on both the Ok and the Err path.
    let scratch = new_scratch(Some(parent))?;
    encode(document, scratch.path(), raster)
}

fn encode(
    document: &Document,
    scratch: &Path,
    raster: &Rasterizer<'_>,
) -> Result<Vec<u8>, ReportError> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut layout = Layout::new();
    let mut xobjects = Dictionary::new();
    let mut chart_index = 0usize;

    for block in &document.blocks {
        match block {
            Block::Title(text) => {
                layout.gap(48.0);
                layout.centered(text, TITLE);
            }
            Block::Subtitle(text) => layout.centered(text, SUBTITLE),
            Block::Heading(text) => {
                layout.gap(10.0);
                layout.reserve(H1.leading + BODY.leading * 2.0);
                layout.lines(text, H1, 0.0);
                layout.gap(4.0);
            }
            Block::Subheading(text) => {
                layout.gap(8.0);
                layout.reserve(H2.leading + BODY.leading * 2.0);
                layout.lines(text, H2, 0.0);
                layout.gap(2.0);
            }
            Block::Paragraph(text) => {
                layout.lines(text, BODY, 0.0);
                layout.gap(6.0);
            }
            Block::Bullet(text) => {
                layout.bullet(text);
                layout.gap(4.0);
            }
            Block::Note(text) => {
                layout.lines(text, NOTE, 0.0);
                layout.gap(6.0);
            }
            Block::Table(table) => {
                layout.table(table);
                layout.gap(8.0);
            }
            Block::Chart(figure) => {
                chart_index += 1;
                layout.gap(6.0);
                match figure.placeholder() {
                    Some(message) => layout.placeholder(&figure.spec.title, &message),
                    None => {
                        let img = raster(figure, chart_index, scratch)?;
                        let resource = format!("Im{chart_index}");
                        let image_id = doc.add_object(Stream::new(
                            dictionary! {
                                "Type" => "XObject",
                                "Subtype" => "Image",
                                "Width" => img.width as i64,
                                "Height" => img.height as i64,
                                "ColorSpace" => "DeviceRGB",
                                "BitsPerComponent" => 8,
                            },
                            img.rgb,
                        ));
                        xobjects.set(resource.as_str(), image_id);
                        layout.image(&resource, CHART_W, CHART_H);
                    }
                }
                layout.gap(4.0);
            }
            Block::Spacer(h) => layout.gap(*h),
            Block::PageBreak => {
                if layout.dirty {
                    layout.break_page();
                }
            }
        }
    }

    let pages = layout.finish();
    let total = pages.len();

    let mut fonts = Dictionary::new();
    for font in [Font::Regular, Font::Bold, Font::Oblique] {
        let id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource(), id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
        "XObject" => xobjects,
    });

    let mut kids: Vec<Object> = Vec::with_capacity(total);
    for (i, mut ops) in pages.into_iter().enumerate() {
        Layout::footer(&mut ops, i + 1, total);
        let content = Content { operations: ops }
            .encode()
            .map_err(|e| ReportError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => total as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_W),
                Object::Real(PAGE_H),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(win_ansi(&document.title)),
        "Producer" => Object::string_literal("space-dashboard"),
        "CreationDate" => Object::string_literal(format!(
            "D:{}",
            document.generated_at.format("%Y%m%d%H%M%S")
        )),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ReportError::Pdf(e.to_string()))?;
    debug!(pages = total, charts = chart_index, bytes = bytes.len(), "pdf encoded");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Schema;
    use crate::report::{assemble, ReportOptions};
    use crate::reports::Analysis;
    use crate::types::MissionRecord;
    use chrono::NaiveDate;

    fn options() -> ReportOptions {
        ReportOptions {
            title: "Space Report".to_string(),
            generated_at: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(3, 4, 5)
                .unwrap(),
        }
    }

    fn small_analysis() -> Analysis {
        let records: Vec<_> = (0..24)
            .map(|i| MissionRecord {
                country: ["USA", "China", "India"][i % 3].to_string(),
                mission_name: format!("M{i}"),
                mission_type: ["Manned", "Probe"][i % 2].to_string(),
                year: Some(2010 + (i % 4) as i32),
                budget: Some(0.5 + i as f64),
                success_rate: Some(50.0 + i as f64),
                duration: None,
            })
            .collect();
        Analysis::from_records(&records, &Schema::complete())
    }

    #[test]
    fn wrap_respects_width() {
        let text = "one two three four five six seven eight nine ten";
        let lines = wrap(text, Font::Regular, 11.0, 80.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), text);
        for line in &lines {
            if line.contains(' ') {
                assert!(text_width(line, Font::Regular, 11.0) <= 80.0);
            }
        }
        assert!(wrap("", Font::Regular, 11.0, 80.0).is_empty());
    }

    #[test]
    fn win_ansi_maps_latin1_and_punctuation() {
        assert_eq!(win_ansi("Aé•"), vec![b'A', 0xe9, 0x95]);
        assert_eq!(win_ansi("→"), vec![b'?']);
    }

    #[test]
    fn writes_a_pdf_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let doc = assemble(&small_analysis(), &options());
        let bytes = write_in(&doc, dir.path()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert!(bytes.ends_with(b"%%EOF") || bytes.ends_with(b"%%EOF\n"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let parsed = lopdf::Document::load_mem(&bytes).unwrap();
        assert!(parsed.get_pages().len() >= 4);
    }

    #[test]
    fn failed_rasterization_still_removes_scratch_files() {
        let dir = tempfile::tempdir().unwrap();
        let doc = assemble(&small_analysis(), &options());
        let failing = |figure: &Figure, index: usize, scratch: &Path| -> Result<ChartImage, ReportError> {
            let path = scratch.join(format!("{:02}-{}.png", index, figure.spec.id));
            std::fs::write(&path, b"partial").unwrap();
            assert!(path.exists());
            Err(ReportError::Image {
                path,
                message: "decoder gave up".to_string(),
            })
        };

        let err = write_in_with(&doc, dir.path(), &failing).unwrap_err();
        assert!(matches!(err, ReportError::Image { .. }));
        assert!(err.to_string().contains("decoder gave up"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn identical_documents_encode_identically() {
        let doc = assemble(&small_analysis(), &options());
        assert_eq!(write(&doc).unwrap(), write(&doc).unwrap());
    }

    #[test]
    fn empty_dataset_still_encodes() {
        let analysis = Analysis::from_records(&[], &Schema::complete());
        let doc = assemble(&analysis, &options());
        let bytes = write(&doc).unwrap();
        let parsed = lopdf::Document::load_mem(&bytes).unwrap();
        assert!(parsed.get_pages().len() >= 4);
    }
}
