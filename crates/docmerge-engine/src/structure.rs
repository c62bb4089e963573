use docmerge_model::{Document, Region, RegionKind, TextTarget};
use serde::Serialize;

use crate::placeholder::PlaceholderMatcher;

/// One element of a template, as reported to callers choosing merge indices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StructureEntry {
    pub region: RegionKind,
    pub index: usize,
    #[serde(rename = "match")]
    pub matches: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub kind: String,
}

pub fn region_structure(
    region: &Region,
    kind: RegionKind,
    matcher: &PlaceholderMatcher,
) -> Vec<StructureEntry> {
    region
        .elements
        .iter()
        .enumerate()
        .map(|(index, element)| StructureEntry {
            region: kind,
            index,
            matches: matcher.discover(&element.text()),
            kind: element.kind().to_string(),
        })
        .collect()
}

/// Body entries first, then header and footer when present.
pub fn document_structure(document: &Document, matcher: &PlaceholderMatcher) -> Vec<StructureEntry> {
    document
        .regions()
        .flat_map(|(kind, region)| region_structure(region, kind, matcher))
        .collect()
}
