//! Document model shared by the docmerge crates.
//!
//! A document is an ordered body plus an optional header and footer, each a
//! [`Region`] of block [`Element`]s. Elements are addressed by their position
//! inside a region; a position is only meaningful for the revision it was
//! read from.

mod locate;

pub use locate::{ImageAnchor, Position, TextTarget};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Layout properties carried verbatim through copies.
pub type Attributes = BTreeMap<String, String>;

/// One inch, in points.
pub const DEFAULT_MARGIN: f64 = 72.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    #[serde(default)]
    pub margins: Margins,
    #[serde(default)]
    pub body: Region,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Region>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<Region>,
}

impl Document {
    /// Empty document with default margins and neither header nor footer.
    pub fn blank(title: impl Into<String>) -> Self {
        Document {
            title: title.into(),
            margins: Margins::default(),
            body: Region::default(),
            header: None,
            footer: None,
        }
    }

    /// Returns the header, creating an empty one first if needed.
    pub fn add_header(&mut self) -> &mut Region {
        self.header.get_or_insert_with(Region::default)
    }

    /// Returns the footer, creating an empty one first if needed.
    pub fn add_footer(&mut self) -> &mut Region {
        self.footer.get_or_insert_with(Region::default)
    }

    pub fn region(&self, kind: RegionKind) -> Option<&Region> {
        match kind {
            RegionKind::Body => Some(&self.body),
            RegionKind::Header => self.header.as_ref(),
            RegionKind::Footer => self.footer.as_ref(),
        }
    }

    /// Present regions in body, header, footer order.
    pub fn regions(&self) -> impl Iterator<Item = (RegionKind, &Region)> {
        RegionKind::ALL
            .iter()
            .filter_map(move |kind| self.region(*kind).map(|region| (*kind, region)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Margins {
            top: DEFAULT_MARGIN,
            bottom: DEFAULT_MARGIN,
            left: DEFAULT_MARGIN,
            right: DEFAULT_MARGIN,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Body,
    Header,
    Footer,
}

impl RegionKind {
    pub const ALL: &'static [RegionKind] =
        &[RegionKind::Body, RegionKind::Header, RegionKind::Footer];

    pub fn as_str(self) -> &'static str {
        match self {
            RegionKind::Body => "body",
            RegionKind::Header => "header",
            RegionKind::Footer => "footer",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered sequence of block elements.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Region {
    pub fn new(elements: Vec<Element>) -> Self {
        Region { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn child(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Appends `paragraph` and returns its index in this region.
    pub fn append_paragraph(&mut self, paragraph: Paragraph) -> usize {
        self.elements.push(Element::Paragraph(paragraph));
        self.elements.len() - 1
    }

    /// Appends `table` and returns its index in this region.
    pub fn append_table(&mut self, table: Table) -> usize {
        self.elements.push(Element::Table(table));
        self.elements.len() - 1
    }

    pub fn table_mut(&mut self, index: usize) -> Option<&mut Table> {
        match self.elements.get_mut(index) {
            Some(Element::Table(table)) => Some(table),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Element {
    Paragraph(Paragraph),
    Table(Table),
    Other(OpaqueElement),
}

impl Element {
    /// Type name as reported to callers.
    pub fn kind(&self) -> &str {
        match self {
            Element::Paragraph(_) => "PARAGRAPH",
            Element::Table(_) => "TABLE",
            Element::Other(opaque) => &opaque.kind,
        }
    }
}

impl From<Paragraph> for Element {
    fn from(value: Paragraph) -> Self {
        Element::Paragraph(value)
    }
}

impl From<Table> for Element {
    fn from(value: Table) -> Self {
        Element::Table(value)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub runs: Vec<TextRun>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<PositionedImage>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl Paragraph {
    pub fn from_text(text: impl Into<String>) -> Self {
        Paragraph {
            runs: vec![TextRun::new(text)],
            ..Paragraph::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        TextRun {
            text: text.into(),
            attributes: Attributes::new(),
        }
    }
}

/// Image anchored to a paragraph rather than flowing inline with its text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedImage {
    pub mime_type: String,
    #[serde(with = "base64_data")]
    pub data: Vec<u8>,
    pub height: f64,
    pub width: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Table {
            rows,
            attributes: Attributes::new(),
        }
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Appends `row` and returns its index in this table.
    pub fn append_row(&mut self, row: Row) -> usize {
        self.rows.push(row);
        self.rows.len() - 1
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub cells: Vec<Cell>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl Row {
    /// Row with one single-paragraph cell per entry.
    pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Self {
        Row {
            cells: texts.iter().map(|text| Cell::from_text(text.as_ref())).collect(),
            attributes: Attributes::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl Cell {
    pub fn from_text(text: impl Into<String>) -> Self {
        Cell {
            elements: vec![Element::Paragraph(Paragraph::from_text(text))],
            attributes: Attributes::new(),
        }
    }
}

/// Element the engine passes through without interpreting (page breaks,
/// list items, rules...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpaqueElement {
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl OpaqueElement {
    pub fn new(kind: impl Into<String>, text: impl Into<String>) -> Self {
        OpaqueElement {
            kind: kind.into(),
            text: text.into(),
            attributes: Attributes::new(),
        }
    }
}

mod base64_data {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn elements_serialize_with_type_tag() {
        let region = Region::new(vec![
            Element::Paragraph(Paragraph::from_text("Hello")),
            Element::Other(OpaqueElement::new("PAGE_BREAK", "")),
        ]);

        let json = serde_json::to_value(&region).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "elements": [
                    {"type": "PARAGRAPH", "runs": [{"text": "Hello"}]},
                    {"type": "OTHER", "kind": "PAGE_BREAK"}
                ]
            })
        );
    }

    #[test]
    fn image_data_is_base64_in_json() {
        let image = PositionedImage {
            mime_type: "image/png".into(),
            data: vec![1, 2, 3],
            height: 10.0,
            width: 20.0,
        };
        let json = serde_json::to_string(&image).unwrap();
        assert!(json.contains("\"data\":\"AQID\""));
        assert!(json.contains("\"mimeType\":\"image/png\""));
        let parsed: PositionedImage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, image);
    }

    #[test]
    fn add_header_reuses_existing_region() {
        let mut document = Document::blank("Doc");
        assert!(document.header.is_none());
        document.add_header().append_paragraph(Paragraph::from_text("top"));
        document.add_header().append_paragraph(Paragraph::from_text("again"));
        assert_eq!(document.header.as_ref().map(Region::len), Some(2));

        let kinds: Vec<_> = document.regions().map(|(kind, _)| kind).collect();
        assert_eq!(kinds, vec![RegionKind::Body, RegionKind::Header]);
    }

    #[test]
    fn element_kind_names() {
        assert_eq!(Element::from(Paragraph::default()).kind(), "PARAGRAPH");
        assert_eq!(Element::from(Table::default()).kind(), "TABLE");
        assert_eq!(
            Element::Other(OpaqueElement::new("LIST_ITEM", "x")).kind(),
            "LIST_ITEM"
        );
    }
}
