//! CSV emitter
//!
//! CSV is strictly tabular, so the value tree is flattened:
//!
//! - the shallowest list in the tree (breadth-first, document order breaking
//!   ties) is the row axis and each of its items becomes one row
//! - every row is the whole document flattened with the row-axis list
//!   replaced by that row's item, so values outside the repeated records
//!   repeat on every row
//! - column names are key paths from the document root joined with the
//!   configured separator (`form.field.@name`)
//! - lists other than the row axis are flattened by index
//!   (`form.field.item.0`); documents with several repeating sites at
//!   different depths are only partially tabular and a warning is logged
//! - without any list the document collapses to a single row
//!
//! The header is the union of all row columns in first-seen order; cells a
//! row lacks are left empty.

use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};
use log::warn;

use super::base::ConverterConfig;
use super::{Emitter, FormatKind};
use crate::error::{Error, Result};
use crate::values::Value;

type Row = IndexMap<String, String>;

/// What flattening had to give up on
#[derive(Debug, Default)]
struct Report {
    /// Lists other than the row axis, counted once per row
    nested_lists: usize,
    /// Columns written by more than one key path
    collisions: IndexSet<String>,
}

/// Flattens a value tree into CSV rows
#[derive(Debug, Clone, Default)]
pub struct CsvEmitter {
    config: ConverterConfig,
}

impl CsvEmitter {
    /// Create a CSV emitter with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Flatten a value tree into rows of `(column, cell)` pairs
    pub fn rows(&self, value: &Value) -> Vec<IndexMap<String, String>> {
        let (rows, report) = self.flatten_rows(value);

        if report.nested_lists > 0 {
            warn!(
                "CSV flattening found {} list(s) besides the row axis; their items were spread over indexed columns",
                report.nested_lists
            );
        }
        if !report.collisions.is_empty() {
            let columns: Vec<&str> = report.collisions.iter().map(String::as_str).collect();
            warn!(
                "CSV column(s) {} are produced by more than one key path; later values overwrote earlier ones",
                columns.join(", ")
            );
        }
        rows
    }

    fn flatten_rows(&self, value: &Value) -> (Vec<Row>, Report) {
        let mut report = Report::default();

        let rows: Vec<Row> = match find_row_axis(value) {
            Some((axis, items)) => items
                .iter()
                .map(|item| {
                    let mut row = Row::new();
                    self.flatten(value, "", Some((axis.as_slice(), item)), &mut row, &mut report);
                    row
                })
                .collect(),
            None => {
                let mut row = Row::new();
                self.flatten(value, "", None, &mut row, &mut report);
                vec![row]
            }
        };
        (rows, report)
    }

    fn join(&self, prefix: &str, key: &str) -> String {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{}{}", prefix, self.config.column_separator(), key)
        }
    }

    fn flatten(
        &self,
        value: &Value,
        path: &str,
        axis: Option<(&[String], &Value)>,
        row: &mut Row,
        report: &mut Report,
    ) {
        match value {
            Value::Scalar(s) => {
                let column = if path.is_empty() {
                    self.config.text_key().to_string()
                } else {
                    path.to_string()
                };
                if row.insert(column.clone(), s.clone()).is_some() {
                    report.collisions.insert(column);
                }
            }
            Value::Object(map) => {
                for (key, entry) in map {
                    let column = self.join(path, key);
                    match axis {
                        Some((steps, item)) if steps.first() == Some(key) => {
                            if steps.len() == 1 {
                                self.flatten(item, &column, None, row, report);
                            } else {
                                self.flatten(
                                    entry,
                                    &column,
                                    Some((&steps[1..], item)),
                                    row,
                                    report,
                                );
                            }
                        }
                        _ => self.flatten(entry, &column, None, row, report),
                    }
                }
            }
            Value::List(items) => {
                if let Some((steps, item)) = axis {
                    if steps.is_empty() {
                        self.flatten(item, path, None, row, report);
                        return;
                    }
                }
                report.nested_lists += 1;
                for (index, item) in items.iter().enumerate() {
                    let column = self.join(path, &index.to_string());
                    self.flatten(item, &column, None, row, report);
                }
            }
        }
    }
}

/// Locate the shallowest list: its key path and items
fn find_row_axis(value: &Value) -> Option<(Vec<String>, &[Value])> {
    if let Value::List(items) = value {
        return Some((Vec::new(), items));
    }

    let mut queue: VecDeque<(Vec<String>, &Value)> = VecDeque::new();
    queue.push_back((Vec::new(), value));

    while let Some((path, node)) = queue.pop_front() {
        if let Value::Object(map) = node {
            for (key, entry) in map {
                let mut child_path = path.clone();
                child_path.push(key.clone());
                match entry {
                    Value::List(items) => return Some((child_path, items)),
                    Value::Object(_) => queue.push_back((child_path, entry)),
                    Value::Scalar(_) => {}
                }
            }
        }
    }
    None
}

impl Emitter for CsvEmitter {
    fn format(&self) -> FormatKind {
        FormatKind::Csv
    }

    fn emit(&self, value: &Value) -> Result<String> {
        let rows = self.rows(value);

        let mut columns: IndexSet<&str> = IndexSet::new();
        for row in &rows {
            columns.extend(row.keys().map(|k| k.as_str()));
        }

        let mut writer = ::csv::WriterBuilder::new()
            .terminator(::csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(&columns).map_err(csv_error)?;
        for row in &rows {
            let record = columns
                .iter()
                .map(|column| row.get(*column).map(String::as_str).unwrap_or(""));
            writer.write_record(record).map_err(csv_error)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Internal(format!("CSV flush failed: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| Error::Internal(format!("CSV output is not UTF-8: {}", e)))
    }
}

fn csv_error(e: ::csv::Error) -> Error {
    Error::Internal(format!("CSV serialization failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::Normalizer;
    use crate::documents::Document;
    use pretty_assertions::assert_eq;

    fn emit_xml(xml: &str) -> String {
        let doc = Document::from_string(xml).unwrap();
        let config = ConverterConfig::default();
        let value = Normalizer::new(&config).normalize_document(doc.root());
        CsvEmitter::new().emit(&value).unwrap()
    }

    #[test]
    fn test_single_row_without_lists() {
        assert_eq!(emit_xml("<root><data>value</data></root>"), "root.data\nvalue\n");
    }

    #[test]
    fn test_custom_separator() {
        let doc = Document::from_string("<root><data>value</data></root>").unwrap();
        let config = ConverterConfig::new().with_column_separator("_");
        let value = Normalizer::new(&config).normalize_document(doc.root());
        let csv = CsvEmitter::with_config(config).emit(&value).unwrap();
        assert_eq!(csv, "root_data\nvalue\n");
    }

    #[test]
    fn test_repeated_records_become_rows() {
        let csv = emit_xml(
            r#"<template><field name="a">1</field><field name="b">2</field><field name="c">3</field></template>"#,
        );
        assert_eq!(
            csv,
            "template.field.@name,template.field.#text\na,1\nb,2\nc,3\n"
        );
    }

    #[test]
    fn test_column_union_leaves_missing_cells_empty() {
        let csv = emit_xml(
            "<form><record><name>Ada</name></record><record><name>Alan</name><email>a@t.uk</email></record></form>",
        );
        assert_eq!(
            csv,
            "form.record.name,form.record.email\nAda,\nAlan,a@t.uk\n"
        );
    }

    #[test]
    fn test_context_outside_records_repeats() {
        let csv = emit_xml(r#"<form id="7"><row>x</row><row>y</row></form>"#);
        assert_eq!(csv, "form.@id,form.row\n7,x\n7,y\n");
    }

    #[test]
    fn test_shallowest_list_is_row_axis() {
        let csv = emit_xml(
            "<f><deep><r>1</r><r>2</r></deep><top>a</top><top>b</top></f>",
        );
        assert_eq!(
            csv,
            "f.deep.r.0,f.deep.r.1,f.top\n1,2,a\n1,2,b\n"
        );
    }

    #[test]
    fn test_nested_lists_inside_rows_are_indexed() {
        let emitter = CsvEmitter::new();
        let doc = Document::from_string(
            "<f><s><v>1</v><v>2</v></s><s><v>3</v></s></f>",
        )
        .unwrap();
        let config = ConverterConfig::default();
        let value = Normalizer::new(&config).normalize_document(doc.root());
        let rows = emitter.rows(&value);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("f.s.v.0").map(String::as_str), Some("1"));
        assert_eq!(rows[0].get("f.s.v.1").map(String::as_str), Some("2"));
        assert_eq!(rows[1].get("f.s.v").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_colliding_columns_are_reported() {
        let doc = Document::from_string("<f><a.b>1</a.b><a><b>2</b></a><c>3</c></f>").unwrap();
        let config = ConverterConfig::default();
        let value = Normalizer::new(&config).normalize_document(doc.root());

        let (rows, report) = CsvEmitter::new().flatten_rows(&value);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("f.a.b").map(String::as_str), Some("2"));
        assert_eq!(
            report.collisions.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["f.a.b"]
        );
        assert_eq!(report.nested_lists, 0);
    }

    #[test]
    fn test_distinct_columns_are_not_reported() {
        let doc = Document::from_string("<f><r><a>1</a></r><r><a>2</a></r></f>").unwrap();
        let config = ConverterConfig::default();
        let value = Normalizer::new(&config).normalize_document(doc.root());

        let (rows, report) = CsvEmitter::new().flatten_rows(&value);

        assert_eq!(rows.len(), 2);
        assert!(report.collisions.is_empty());
    }

    #[test]
    fn test_quoting() {
        let csv = emit_xml(r#"<r><a>x, "y"</a></r>"#);
        assert_eq!(csv, "r.a\n\"x, \"\"y\"\"\"\n");
    }

    #[test]
    fn test_scalar_root_value() {
        let csv = emit_xml("<r>v</r>");
        assert_eq!(csv, "r\nv\n");
    }
}
