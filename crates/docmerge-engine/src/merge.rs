//! Assembling a destination document from selected template elements.
//!
//! Directives are applied in order. Consecutive table directives grow a
//! single destination table: every table after the first contributes only
//! its first row. Any appended paragraph ends the run; skipped element types
//! leave it intact.

use docmerge_model::{Document, Element, Region, RegionKind};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ComposeError, ComposeResult};
use crate::replace::{ReplaceSummary, Replacer, ReplacementRule};

/// Copies the template element at `index` and applies `replacements` to it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeDirective {
    pub index: usize,
    #[serde(default)]
    pub replacements: Vec<ReplacementRule>,
}

impl MergeDirective {
    pub fn new(index: usize, replacements: Vec<ReplacementRule>) -> Self {
        Self {
            index,
            replacements,
        }
    }
}

/// Directive lists for each region of a merge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MergePlan {
    #[serde(default)]
    pub body: Vec<MergeDirective>,
    #[serde(default)]
    pub header: Vec<MergeDirective>,
    #[serde(default)]
    pub footer: Vec<MergeDirective>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub paragraphs: usize,
    pub tables: usize,
    pub continued_rows: usize,
    pub skipped: usize,
    pub replacements: ReplaceSummary,
}

impl MergeReport {
    pub fn absorb(&mut self, other: MergeReport) {
        self.paragraphs += other.paragraphs;
        self.tables += other.tables;
        self.continued_rows += other.continued_rows;
        self.skipped += other.skipped;
        self.replacements.absorb(other.replacements);
    }
}

/// Last element appended to the destination region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Previous {
    #[default]
    Nothing,
    Paragraph,
    Table(usize),
}

/// Accumulator threaded through one region merge.
struct MergeState<'a> {
    region: RegionKind,
    replacer: &'a Replacer,
    previous: Previous,
    report: MergeReport,
}

impl<'a> MergeState<'a> {
    fn new(region: RegionKind, replacer: &'a Replacer) -> Self {
        Self {
            region,
            replacer,
            previous: Previous::Nothing,
            report: MergeReport::default(),
        }
    }

    fn apply(
        &mut self,
        destination: &mut Region,
        source: &Region,
        directive: &MergeDirective,
    ) -> ComposeResult<()> {
        let element = source
            .child(directive.index)
            .ok_or(ComposeError::IndexOutOfRange {
                region: self.region,
                index: directive.index,
                len: source.len(),
            })?
            .clone();

        match element {
            Element::Paragraph(mut paragraph) => {
                let summary = self.replacer.apply(&mut paragraph, &directive.replacements)?;
                let appended = destination.append_paragraph(paragraph);
                debug!(
                    "{} directive {} appended paragraph at {appended}",
                    self.region, directive.index
                );
                self.previous = Previous::Paragraph;
                self.report.paragraphs += 1;
                self.report.replacements.absorb(summary);
            }
            Element::Table(mut table) => match self.previous {
                Previous::Table(target) => {
                    let mut row = table.rows.into_iter().next().ok_or(ComposeError::EmptyTable {
                        region: self.region,
                        index: directive.index,
                    })?;
                    let summary = self.replacer.apply(&mut row, &directive.replacements)?;
                    let len = destination.len();
                    let continued =
                        destination
                            .table_mut(target)
                            .ok_or(ComposeError::IndexOutOfRange {
                                region: self.region,
                                index: target,
                                len,
                            })?;
                    let row_index = continued.append_row(row);
                    debug!(
                        "{} directive {} continued table {target} with row {row_index}",
                        self.region, directive.index
                    );
                    self.report.continued_rows += 1;
                    self.report.replacements.absorb(summary);
                }
                Previous::Nothing | Previous::Paragraph => {
                    let summary = self.replacer.apply(&mut table, &directive.replacements)?;
                    let appended = destination.append_table(table);
                    debug!(
                        "{} directive {} appended table at {appended}",
                        self.region, directive.index
                    );
                    self.previous = Previous::Table(appended);
                    self.report.tables += 1;
                    self.report.replacements.absorb(summary);
                }
            },
            Element::Other(opaque) => {
                debug!(
                    "{} directive {} skipped {} element",
                    self.region, directive.index, opaque.kind
                );
                self.report.skipped += 1;
            }
        }

        Ok(())
    }
}

/// Appends the directed elements of `source` to `destination`.
pub fn merge_region(
    destination: &mut Region,
    source: &Region,
    region: RegionKind,
    directives: &[MergeDirective],
    replacer: &Replacer,
) -> ComposeResult<MergeReport> {
    let mut state = MergeState::new(region, replacer);
    for directive in directives {
        state.apply(destination, source, directive)?;
    }
    Ok(state.report)
}

/// Copies body margins, then merges body, header and footer.
///
/// A header or footer is created on `destination` only when its directive
/// list is non-empty, and the template must then have that region.
pub fn merge_document(
    destination: &mut Document,
    template: &Document,
    plan: &MergePlan,
    replacer: &Replacer,
) -> ComposeResult<MergeReport> {
    destination.margins = template.margins;

    let mut report = merge_region(
        &mut destination.body,
        &template.body,
        RegionKind::Body,
        &plan.body,
        replacer,
    )?;

    if !plan.header.is_empty() {
        let source = template
            .header
            .as_ref()
            .ok_or(ComposeError::MissingRegion(RegionKind::Header))?;
        report.absorb(merge_region(
            destination.add_header(),
            source,
            RegionKind::Header,
            &plan.header,
            replacer,
        )?);
    }

    if !plan.footer.is_empty() {
        let source = template
            .footer
            .as_ref()
            .ok_or(ComposeError::MissingRegion(RegionKind::Footer))?;
        report.absorb(merge_region(
            destination.add_footer(),
            source,
            RegionKind::Footer,
            &plan.footer,
            replacer,
        )?);
    }

    Ok(report)
}
