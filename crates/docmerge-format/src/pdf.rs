//! Text-only PDF export.
//!
//! Each region is flattened to lines: paragraphs by their text, tables one
//! line per row with cells joined by ` | `, anchored images as
//! `[image WxH]`. Header lines open every page and footer lines close it;
//! body lines flow between them and paginate. A `PAGE_BREAK` element starts
//! a new page.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use docmerge_config::ExportSettings;
use docmerge_model::{Document, Element, Margins, Paragraph, Region, Table, TextTarget};
use log::debug;
use lopdf::{dictionary, Document as LoDocument, Object as LoObject, ObjectId, Stream as LoStream};

use crate::{FormatError, FormatResult};

const FONT_NAME: &str = "F1";
/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH: f64 = 0.5;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Line {
    Text(String),
    PageBreak,
}

pub fn pdf_base64(document: &Document, settings: &ExportSettings) -> FormatResult<String> {
    Ok(STANDARD.encode(render_pdf(document, settings)?))
}

pub fn render_pdf(document: &Document, settings: &ExportSettings) -> FormatResult<Vec<u8>> {
    let layout = Layout::new(settings, &document.margins);
    let header = region_lines(document.header.as_ref(), layout.max_chars);
    let footer = region_lines(document.footer.as_ref(), layout.max_chars);
    let body = region_lines(Some(&document.body), layout.max_chars);
    let pages = paginate(&body, layout.body_capacity(header.len(), footer.len()));

    let mut pdf = LoDocument::with_version("1.5");
    let pages_id = pdf.new_object_id();
    let font_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = pdf.add_object(dictionary! {
        "Font" => dictionary! { FONT_NAME => font_id },
    });

    let mut kids: Vec<LoObject> = Vec::with_capacity(pages.len());
    for body_lines in &pages {
        let content = layout.page_content(&header, body_lines, &footer);
        let page_id = add_page(&mut pdf, pages_id, resources_id, content, settings);
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    pdf.objects.insert(
        pages_id,
        LoObject::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    pdf.save_to(&mut out)
        .map_err(|err| FormatError::Export(err.to_string()))?;
    debug!("exported '{}' as {count} page(s), {} bytes", document.title, out.len());
    Ok(out)
}

fn add_page(
    pdf: &mut LoDocument,
    pages_id: ObjectId,
    resources_id: ObjectId,
    content: Vec<u8>,
    settings: &ExportSettings,
) -> ObjectId {
    let content_id = pdf.add_object(LoStream::new(dictionary! {}, content));
    pdf.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            (settings.page_width as f32).into(),
            (settings.page_height as f32).into(),
        ],
    })
}

struct Layout {
    left: f64,
    top: f64,
    bottom: f64,
    font_size: f64,
    leading: f64,
    max_chars: usize,
}

impl Layout {
    fn new(settings: &ExportSettings, margins: &Margins) -> Self {
        let usable_width = (settings.page_width - margins.left - margins.right).max(0.0);
        let max_chars = (usable_width / (settings.font_size * GLYPH_WIDTH)).floor() as usize;
        Self {
            left: margins.left,
            top: settings.page_height - margins.top,
            bottom: margins.bottom,
            font_size: settings.font_size,
            leading: settings.font_size * settings.line_spacing,
            max_chars: max_chars.max(1),
        }
    }

    fn lines_between(&self) -> usize {
        ((self.top - self.bottom).max(0.0) / self.leading).floor() as usize
    }

    /// Body lines per page once header and footer are placed; at least one.
    fn body_capacity(&self, header: usize, footer: usize) -> usize {
        self.lines_between().saturating_sub(header + footer).max(1)
    }

    fn page_content(&self, header: &[Line], body: &[String], footer: &[Line]) -> Vec<u8> {
        let mut ops = Vec::new();
        let mut y = self.top - self.font_size;

        for line in texts(header).chain(body.iter().map(String::as_str)) {
            self.show(&mut ops, line, y);
            y -= self.leading;
        }

        let footer: Vec<&str> = texts(footer).collect();
        let mut y = self.bottom + self.leading * footer.len().saturating_sub(1) as f64;
        for line in footer {
            self.show(&mut ops, line, y);
            y -= self.leading;
        }

        ops
    }

    fn show(&self, ops: &mut Vec<u8>, text: &str, y: f64) {
        ops.extend_from_slice(
            format!(
                "BT /{FONT_NAME} {} Tf {} {} Td (",
                self.font_size, self.left, y
            )
            .as_bytes(),
        );
        ops.extend(encode_literal(text));
        ops.extend_from_slice(b") Tj ET\n");
    }
}

fn texts(lines: &[Line]) -> impl Iterator<Item = &str> {
    lines.iter().filter_map(|line| match line {
        Line::Text(text) => Some(text.as_str()),
        Line::PageBreak => None,
    })
}

fn paginate(lines: &[Line], capacity: usize) -> Vec<Vec<String>> {
    let mut pages = vec![Vec::new()];
    for line in lines {
        let needs_page = match line {
            Line::PageBreak => true,
            Line::Text(_) => pages.last().map_or(true, |page| page.len() >= capacity),
        };
        if needs_page {
            pages.push(Vec::new());
        }
        if let (Line::Text(text), Some(page)) = (line, pages.last_mut()) {
            page.push(text.clone());
        }
    }
    pages
}

fn region_lines(region: Option<&Region>, max_chars: usize) -> Vec<Line> {
    let mut lines = Vec::new();
    let Some(region) = region else {
        return lines;
    };

    for element in &region.elements {
        match element {
            Element::Paragraph(paragraph) => paragraph_lines(paragraph, max_chars, &mut lines),
            Element::Table(table) => table_lines(table, max_chars, &mut lines),
            Element::Other(opaque) if opaque.kind == "PAGE_BREAK" => lines.push(Line::PageBreak),
            Element::Other(opaque) => {
                for text in opaque.text.lines() {
                    push_wrapped(text, max_chars, &mut lines);
                }
            }
        }
    }
    lines
}

fn paragraph_lines(paragraph: &Paragraph, max_chars: usize, lines: &mut Vec<Line>) {
    let text = paragraph.text();
    if text.is_empty() && paragraph.images.is_empty() {
        lines.push(Line::Text(String::new()));
    }
    for text in text.lines() {
        push_wrapped(text, max_chars, lines);
    }
    for image in &paragraph.images {
        lines.push(Line::Text(format!("[image {}x{}]", image.width, image.height)));
    }
}

fn table_lines(table: &Table, max_chars: usize, lines: &mut Vec<Line>) {
    for row in &table.rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| cell.text().split_whitespace().collect::<Vec<_>>().join(" "))
            .collect();
        push_wrapped(&cells.join(" | "), max_chars, lines);
    }
}

/// Greedy word wrap; words longer than a line are split.
fn push_wrapped(text: &str, max_chars: usize, lines: &mut Vec<Line>) {
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(Line::Text(std::mem::take(&mut current)));
            }
            let rest = word.split_off(max_chars);
            lines.push(Line::Text(word.into_iter().collect()));
            word = rest;
        }

        let current_len = current.chars().count();
        let extra = if current.is_empty() { 0 } else { 1 };
        if current_len + extra + word.len() > max_chars && !current.is_empty() {
            lines.push(Line::Text(std::mem::take(&mut current)));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }
    if !current.is_empty() || text.trim().is_empty() {
        lines.push(Line::Text(current));
    }
}

/// Latin-1 bytes for a PDF literal string; other characters become `?`.
fn encode_literal(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(ch as u8);
            }
            ch if (ch as u32) < 0x20 => out.push(b' '),
            ch if (ch as u32) <= 0xFF => out.push(ch as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}
