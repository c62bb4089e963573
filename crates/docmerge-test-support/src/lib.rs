//! Shared test harness utilities for docmerge crates.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use docmerge_config::Config;
use docmerge_model::{Document, Element, OpaqueElement, Paragraph, Region, Row, Table};
use image::{ImageBuffer, ImageFormat, Rgba};
use tempfile::TempDir;

/// Returns a baseline configuration rooted at the current directory.
pub fn test_config() -> Config {
    Config::defaults_at(".")
}

/// Returns a configuration whose storage root lives in a fresh temp dir.
pub fn temp_config() -> (TempDir, Config) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut config = Config::defaults_at(dir.path());
    config.storage.root = dir.path().join("store");
    std::fs::create_dir_all(&config.storage.root).expect("create store root");
    (dir, config)
}

/// Encodes a solid `width`x`height` PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let buffer = ImageBuffer::from_pixel(width, height, Rgba([200u8, 30, 30, 255]));
    let mut out = Cursor::new(Vec::new());
    buffer
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

pub fn png_base64(width: u32, height: u32) -> String {
    STANDARD.encode(png_bytes(width, height))
}

/// Two-element template: a greeting paragraph and a one-row item table.
pub fn greeting_template() -> Document {
    let mut document = Document::blank("Greeting");
    document.body = Region::new(vec![
        Element::Paragraph(Paragraph::from_text("Hello {v8 name}")),
        Element::Table(Table::new(vec![Row::from_texts(&["{v8 item}"])])),
    ]);
    document
}

/// Invoice-shaped template with a header, footer and repeated row tables.
///
/// Body indices: 0 greeting, 1 column headings, 2 item row, 3 page break,
/// 4 total, 5 logo paragraph.
pub fn invoice_template() -> Document {
    let mut document = Document::blank("Invoice");
    document.margins.left = 54.0;
    document.body = Region::new(vec![
        Element::Paragraph(Paragraph::from_text("Dear {v8 customer},")),
        Element::Table(Table::new(vec![Row::from_texts(&["Item", "Price"])])),
        Element::Table(Table::new(vec![Row::from_texts(&[
            "{v8 item}",
            "{v8 price}",
        ])])),
        Element::Other(OpaqueElement::new("PAGE_BREAK", "")),
        Element::Paragraph(Paragraph::from_text("Total: {v8 total}")),
        Element::Paragraph(Paragraph::from_text("{v8 logo}")),
    ]);
    document
        .add_header()
        .append_paragraph(Paragraph::from_text("ACME {v8 date}"));
    document
        .add_footer()
        .append_paragraph(Paragraph::from_text("Page {v8 page}"));
    document
}
