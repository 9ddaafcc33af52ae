//! CSV rendering of a completed `Registry`.
//!
//! The layout of the report is consumed by spreadsheet tooling, so every
//! table follows the same shape: a title row, a header row, one row per
//! key, and a trailing blank row. Entities, groups and open-ended labels
//! are sorted; size and age ranges keep their natural order.
use std::collections::BTreeMap;
use std::io::Write;
use std::iter;
use std::str::FromStr;
use std::sync::Arc;

use super::node::{AggregateNode, Tally};
use super::range::{AGE_LABELS, SIZE_LABELS};
use super::util;
use crate::types::RenderError;

/// Sections of the report to render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportType {
    /// Size and age tables across all buckets.
    Summary,
    /// Root folder, storage class, extension and month tables per bucket.
    Details,
    /// Both the summary and the details.
    Full,
}

impl ReportType {
    /// All accepted names, for argument validation.
    pub const NAMES: [&'static str; 3] = ["summary", "details", "full"];

    fn has_summary(self) -> bool {
        self != ReportType::Details
    }

    fn has_details(self) -> bool {
        self != ReportType::Summary
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<ReportType, String> {
        match s {
            "summary" => Ok(ReportType::Summary),
            "details" => Ok(ReportType::Details),
            "full" => Ok(ReportType::Full),
            other => Err(format!("Unknown report type: {}", other)),
        }
    }
}

/// A single row of a report table.
enum Row<'a> {
    Title(String),
    Header(Vec<String>),
    Sizing(&'a str, &'a Tally),
    Ages(&'a str, &'a Tally),
    Count(&'a str, u64),
    Blank,
}

impl Row<'_> {
    /// Flattens the row into its CSV fields.
    fn fields(&self) -> Vec<String> {
        match self {
            Row::Title(title) => vec![title.clone()],
            Row::Header(header) => header.clone(),
            Row::Sizing(key, tally) => {
                let mut fields = vec![
                    key.to_string(),
                    tally.items().to_string(),
                    util::convert_gigabytes(tally.bytes()),
                ];
                let sizes = tally.sizes().ordered(&SIZE_LABELS);
                debug_assert_eq!(sizes.iter().sum::<u64>(), tally.items());
                fields.extend(sizes.iter().map(u64::to_string));
                fields
            }
            Row::Ages(key, tally) => {
                let mut fields = vec![key.to_string(), tally.items().to_string()];
                let ages = tally.ages().ordered(&AGE_LABELS);
                debug_assert_eq!(ages.iter().sum::<u64>(), tally.items());
                fields.extend(ages.iter().map(u64::to_string));
                fields
            }
            Row::Count(label, count) => vec![label.to_string(), count.to_string()],
            Row::Blank => Vec::new(),
        }
    }
}

/// Renders report tables for a set of aggregated entities.
pub struct Renderer<'a> {
    entities: &'a BTreeMap<String, Arc<AggregateNode>>,
    report_type: ReportType,
}

impl<'a> Renderer<'a> {
    /// Constructs a new `Renderer` over a sorted entity mapping.
    pub fn new(
        entities: &'a BTreeMap<String, Arc<AggregateNode>>,
        report_type: ReportType,
    ) -> Renderer<'a> {
        Renderer {
            entities,
            report_type,
        }
    }

    /// Writes every selected section of the report.
    ///
    /// Rendering stops at the first failed write; the writer is flushed
    /// once all tables have been written.
    pub fn render<W: Write>(&self, writer: &mut W) -> Result<(), RenderError> {
        if self.report_type.has_summary() {
            self.render_sizing(writer)?;
            self.render_ages(writer)?;
        }

        if self.report_type.has_details() {
            for (entity, node) in self.entities {
                self.render_groups(writer, entity, node)?;
                self.render_details(writer, entity, node.tally())?;
            }
        }

        writer
            .flush()
            .map_err(|err| RenderError::new("report", err))
    }

    /// Writes file size repartition across all entities.
    fn render_sizing<W: Write>(&self, writer: &mut W) -> Result<(), RenderError> {
        let rows = self
            .entities
            .iter()
            .map(|(entity, node)| Row::Sizing(entity, node.tally()));

        write_table(writer, &sizing_title("bucket name"), sizing_header("bucket name"), rows)
    }

    /// Writes file age repartition across all entities.
    fn render_ages<W: Write>(&self, writer: &mut W) -> Result<(), RenderError> {
        let rows = self
            .entities
            .iter()
            .map(|(entity, node)| Row::Ages(entity, node.tally()));

        let mut header = vec!["Bucket name".to_string(), "Total number of files".to_string()];
        header.extend(AGE_LABELS.iter().map(|label| label.to_string()));

        write_table(writer, "Repartition of file ages by buckets", header, rows)
    }

    /// Writes file size repartition across the groups of an entity.
    fn render_groups<W: Write>(
        &self,
        writer: &mut W,
        entity: &str,
        node: &AggregateNode,
    ) -> Result<(), RenderError> {
        let groups = node.groups();
        if groups.is_empty() {
            return Ok(());
        }

        let column = format!("root folder for bucket {}", entity);
        let rows = groups
            .iter()
            .map(|(group, tally)| Row::Sizing(group, tally.as_ref()));

        write_table(writer, &sizing_title(&column), sizing_header(&column), rows)
    }

    /// Writes the storage class, extension and month tables of an entity.
    fn render_details<W: Write>(
        &self,
        writer: &mut W,
        entity: &str,
        tally: &Tally,
    ) -> Result<(), RenderError> {
        let tables = [
            ("storage class", "Storage class", tally.storage_classes()),
            ("extension", "Extension", tally.extensions()),
            ("month", "Month", tally.months()),
        ];

        for (dimension, column, counter) in tables.iter() {
            let counts = counter.snapshot();
            if counts.is_empty() {
                continue;
            }

            let title = format!("Repartition of files for bucket {} by {}", entity, dimension);
            let rows = counts
                .iter()
                .map(|(label, count)| Row::Count(label, *count));

            let header = vec![column.to_string(), "Number of files".to_string()];

            write_table(writer, &title, header, rows)?;
        }

        Ok(())
    }
}

/// Title of a file size repartition table.
fn sizing_title(column: &str) -> String {
    format!("Repartition of file sizes by {}", column)
}

/// Header of a file size repartition table, keyed by `column`.
fn sizing_header(column: &str) -> Vec<String> {
    let mut header = vec![
        column.to_string(),
        "Total number of files".to_string(),
        "Total size (GB)".to_string(),
    ];
    header.extend(SIZE_LABELS.iter().map(|label| label.to_string()));
    header
}

/// Writes a complete table: title, header, rows and a blank separator.
fn write_table<'r, W, I>(
    writer: &mut W,
    title: &str,
    header: Vec<String>,
    rows: I,
) -> Result<(), RenderError>
where
    W: Write,
    I: Iterator<Item = Row<'r>>,
{
    let table = iter::once(Row::Title(title.to_string()))
        .chain(iter::once(Row::Header(header)))
        .chain(rows)
        .chain(iter::once(Row::Blank));

    for row in table {
        util::write_row(writer, &row.fields()).map_err(|err| RenderError::new(title, err))?;
    }

    Ok(())
}
