//! Text search and image anchoring over the element tree.
//!
//! [`TextTarget`] is the seam the engine works against: locate a search
//! pattern, resolve the located position to the paragraph that owns it, and
//! replace text. Patterns are matched literally against a paragraph's
//! concatenated run text, so a marker may straddle differently styled runs.

use crate::{
    Cell, Element, OpaqueElement, Paragraph, PositionedImage, Region, Row, Table, TextRun,
};

/// Address of a located match, relative to the target it was located in.
///
/// `path` descends through children (region element, table row, row cell,
/// cell element, ...) down to the owning paragraph; the byte range addresses
/// the paragraph's concatenated text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub path: Vec<usize>,
    pub start: usize,
    pub end: usize,
}

impl Position {
    fn nested(mut self, index: usize) -> Self {
        self.path.insert(0, index);
        self
    }

    fn descend(&self) -> Option<(usize, Position)> {
        let (&first, rest) = self.path.split_first()?;
        Some((
            first,
            Position {
                path: rest.to_vec(),
                start: self.start,
                end: self.end,
            },
        ))
    }
}

/// Structural parent that can carry a positioned image.
pub trait ImageAnchor {
    fn add_positioned_image(&mut self, image: PositionedImage);
}

pub trait TextTarget {
    type Anchor: ImageAnchor;

    /// Plain text content.
    fn text(&self) -> String;

    /// First occurrence of `pattern`, in document order.
    fn locate(&self, pattern: &str) -> Option<Position>;

    /// Resolves a position produced by [`TextTarget::locate`] on this target.
    fn parent_of(&mut self, position: &Position) -> Option<&mut Self::Anchor>;

    /// Replaces every occurrence of `pattern`; returns the number replaced.
    fn replace_text(&mut self, pattern: &str, replacement: &str) -> usize;
}

impl ImageAnchor for Paragraph {
    fn add_positioned_image(&mut self, image: PositionedImage) {
        self.images.push(image);
    }
}

impl TextTarget for Paragraph {
    type Anchor = Paragraph;

    fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    fn locate(&self, pattern: &str) -> Option<Position> {
        if pattern.is_empty() {
            return None;
        }
        self.text().find(pattern).map(|start| Position {
            path: Vec::new(),
            start,
            end: start + pattern.len(),
        })
    }

    fn parent_of(&mut self, position: &Position) -> Option<&mut Paragraph> {
        let len: usize = self.runs.iter().map(|run| run.text.len()).sum();
        if position.path.is_empty() && position.end <= len {
            Some(self)
        } else {
            None
        }
    }

    fn replace_text(&mut self, pattern: &str, replacement: &str) -> usize {
        if pattern.is_empty() {
            return 0;
        }
        let text = self.text();
        let found: Vec<usize> = text.match_indices(pattern).map(|(start, _)| start).collect();
        // Back to front so earlier offsets stay valid.
        for &start in found.iter().rev() {
            splice_runs(&mut self.runs, start, start + pattern.len(), replacement);
        }
        found.len()
    }
}

/// Replaces `start..end` of the concatenated run text. The replacement lands
/// in the run holding `start`; the rest of the range is cut from later runs.
fn splice_runs(runs: &mut [TextRun], start: usize, end: usize, replacement: &str) {
    let mut offset = 0;
    let mut inserted = false;
    for run in runs.iter_mut() {
        let run_start = offset;
        let run_end = offset + run.text.len();
        offset = run_end;
        if run_end <= start {
            continue;
        }
        if run_start >= end {
            break;
        }
        let from = start.saturating_sub(run_start);
        let to = end.min(run_end) - run_start;
        if inserted {
            run.text.replace_range(from..to, "");
        } else {
            run.text.replace_range(from..to, replacement);
            inserted = true;
        }
    }
}

impl TextTarget for Table {
    type Anchor = Paragraph;

    fn text(&self) -> String {
        self.rows
            .iter()
            .map(TextTarget::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn locate(&self, pattern: &str) -> Option<Position> {
        self.rows
            .iter()
            .enumerate()
            .find_map(|(index, row)| row.locate(pattern).map(|found| found.nested(index)))
    }

    fn parent_of(&mut self, position: &Position) -> Option<&mut Paragraph> {
        let (index, inner) = position.descend()?;
        self.rows.get_mut(index)?.parent_of(&inner)
    }

    fn replace_text(&mut self, pattern: &str, replacement: &str) -> usize {
        self.rows
            .iter_mut()
            .map(|row| row.replace_text(pattern, replacement))
            .sum()
    }
}

impl TextTarget for Row {
    type Anchor = Paragraph;

    fn text(&self) -> String {
        self.cells
            .iter()
            .map(TextTarget::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn locate(&self, pattern: &str) -> Option<Position> {
        self.cells
            .iter()
            .enumerate()
            .find_map(|(index, cell)| cell.locate(pattern).map(|found| found.nested(index)))
    }

    fn parent_of(&mut self, position: &Position) -> Option<&mut Paragraph> {
        let (index, inner) = position.descend()?;
        self.cells.get_mut(index)?.parent_of(&inner)
    }

    fn replace_text(&mut self, pattern: &str, replacement: &str) -> usize {
        self.cells
            .iter_mut()
            .map(|cell| cell.replace_text(pattern, replacement))
            .sum()
    }
}

impl TextTarget for Cell {
    type Anchor = Paragraph;

    fn text(&self) -> String {
        join_text(&self.elements)
    }

    fn locate(&self, pattern: &str) -> Option<Position> {
        locate_in(&self.elements, pattern)
    }

    fn parent_of(&mut self, position: &Position) -> Option<&mut Paragraph> {
        parent_in(&mut self.elements, position)
    }

    fn replace_text(&mut self, pattern: &str, replacement: &str) -> usize {
        replace_in(&mut self.elements, pattern, replacement)
    }
}

impl TextTarget for Region {
    type Anchor = Paragraph;

    fn text(&self) -> String {
        join_text(&self.elements)
    }

    fn locate(&self, pattern: &str) -> Option<Position> {
        locate_in(&self.elements, pattern)
    }

    fn parent_of(&mut self, position: &Position) -> Option<&mut Paragraph> {
        parent_in(&mut self.elements, position)
    }

    fn replace_text(&mut self, pattern: &str, replacement: &str) -> usize {
        replace_in(&mut self.elements, pattern, replacement)
    }
}

// Opaque elements take text replacement but never anchor images.
impl TextTarget for Element {
    type Anchor = Paragraph;

    fn text(&self) -> String {
        match self {
            Element::Paragraph(paragraph) => paragraph.text(),
            Element::Table(table) => table.text(),
            Element::Other(OpaqueElement { text, .. }) => text.clone(),
        }
    }

    fn locate(&self, pattern: &str) -> Option<Position> {
        match self {
            Element::Paragraph(paragraph) => paragraph.locate(pattern),
            Element::Table(table) => table.locate(pattern),
            Element::Other(_) => None,
        }
    }

    fn parent_of(&mut self, position: &Position) -> Option<&mut Paragraph> {
        match self {
            Element::Paragraph(paragraph) => paragraph.parent_of(position),
            Element::Table(table) => table.parent_of(position),
            Element::Other(_) => None,
        }
    }

    fn replace_text(&mut self, pattern: &str, replacement: &str) -> usize {
        match self {
            Element::Paragraph(paragraph) => paragraph.replace_text(pattern, replacement),
            Element::Table(table) => table.replace_text(pattern, replacement),
            Element::Other(opaque) => replace_in_string(&mut opaque.text, pattern, replacement),
        }
    }
}

fn join_text(elements: &[Element]) -> String {
    elements
        .iter()
        .map(TextTarget::text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn locate_in(elements: &[Element], pattern: &str) -> Option<Position> {
    elements
        .iter()
        .enumerate()
        .find_map(|(index, element)| element.locate(pattern).map(|found| found.nested(index)))
}

fn parent_in<'a>(elements: &'a mut [Element], position: &Position) -> Option<&'a mut Paragraph> {
    let (index, inner) = position.descend()?;
    elements.get_mut(index)?.parent_of(&inner)
}

fn replace_in(elements: &mut [Element], pattern: &str, replacement: &str) -> usize {
    elements
        .iter_mut()
        .map(|element| element.replace_text(pattern, replacement))
        .sum()
}

fn replace_in_string(text: &mut String, pattern: &str, replacement: &str) -> usize {
    if pattern.is_empty() {
        return 0;
    }
    let count = text.matches(pattern).count();
    if count > 0 {
        *text = text.replace(pattern, replacement);
    }
    count
}
