use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use docmerge_config::ExportSettings;
use docmerge_format::{pdf_base64, render_pdf};
use docmerge_model::{Document, Element, OpaqueElement, Paragraph, PositionedImage, Region};
use docmerge_test_support::{invoice_template, png_bytes};
use lopdf::Document as LoDocument;

fn page_contents(bytes: &[u8]) -> Vec<String> {
    let pdf = LoDocument::load_mem(bytes).unwrap();
    pdf.get_pages()
        .into_values()
        .map(|page_id| String::from_utf8_lossy(&pdf.get_page_content(page_id).unwrap()).into_owned())
        .collect()
}

#[test]
fn renders_regions_tables_and_page_breaks() {
    let bytes = render_pdf(&invoice_template(), &ExportSettings::default()).unwrap();
    let pages = page_contents(&bytes);

    assert_eq!(pages.len(), 2);
    assert!(pages[0].contains("(ACME {v8 date}) Tj"));
    assert!(pages[0].contains("(Dear {v8 customer},) Tj"));
    assert!(pages[0].contains("(Item | Price) Tj"));
    assert!(pages[0].contains("(Page {v8 page}) Tj"));
    assert!(pages[1].contains("(Total: {v8 total}) Tj"));
    assert!(pages[1].contains("(ACME {v8 date}) Tj"));
}

#[test]
fn anchored_images_render_as_placeholders() {
    let mut paragraph = Paragraph::from_text("Logo");
    paragraph.images.push(PositionedImage {
        mime_type: "image/png".into(),
        data: png_bytes(4, 4),
        height: 25.0,
        width: 50.0,
    });
    let mut document = Document::blank("With image");
    document.body = Region::new(vec![Element::Paragraph(paragraph)]);

    let pages = page_contents(&render_pdf(&document, &ExportSettings::default()).unwrap());
    assert!(pages[0].contains("([image 50x25]) Tj"));
}

#[test]
fn long_bodies_paginate() {
    let mut document = Document::blank("Long");
    document.body = Region::new(
        (0..200)
            .map(|i| Element::Paragraph(Paragraph::from_text(format!("line {i}"))))
            .collect(),
    );
    let settings = ExportSettings::default();

    let pages = page_contents(&render_pdf(&document, &settings).unwrap());
    assert!(pages.len() > 1);
    assert!(pages.last().unwrap().contains("(line 199) Tj"));
}

#[test]
fn base64_output_decodes_to_pdf() {
    let mut document = Document::blank("Tiny");
    document.body = Region::new(vec![Element::Other(OpaqueElement::new("LIST_ITEM", "- one"))]);

    let encoded = pdf_base64(&document, &ExportSettings::default()).unwrap();
    let bytes = STANDARD.decode(encoded).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.5"));
    assert!(page_contents(&bytes)[0].contains("(- one) Tj"));
}
