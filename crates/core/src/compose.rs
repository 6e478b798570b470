//! Report composition: rows, period blocks, and the final report shapes.
//!
//! A row is an ordered column -> value map. Columns that do not apply to a
//! project family are left out of the row entirely; absence signals
//! inapplicability, never a zero.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::aggregate::{sort_rows, LanguageKey};
use crate::metrics::{format_hms, round2};
use crate::period::{Granularity, Period};

pub type ReportRow = IndexMap<String, Value>;

/// Fluent builder keeping column order as inserted.
#[derive(Debug, Default)]
pub struct RowBuilder {
    row: ReportRow,
}

impl RowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, column: &str, value: impl Into<String>) -> Self {
        self.row.insert(column.to_owned(), Value::String(value.into()));
        self
    }

    pub fn count(mut self, column: &str, value: u64) -> Self {
        self.row.insert(column.to_owned(), json!(value));
        self
    }

    /// Number rounded to two decimals. Whole numbers are emitted as integers.
    pub fn number(mut self, column: &str, value: f64) -> Self {
        self.row.insert(column.to_owned(), number_value(value));
        self
    }

    /// Seconds rendered as `H:MM:SS`.
    pub fn duration(mut self, column: &str, seconds: f64) -> Self {
        self.row.insert(column.to_owned(), Value::String(format_hms(seconds)));
        self
    }

    pub fn value(mut self, column: &str, value: Value) -> Self {
        self.row.insert(column.to_owned(), value);
        self
    }

    pub fn when(self, cond: bool, f: impl FnOnce(Self) -> Self) -> Self {
        if cond {
            f(self)
        } else {
            self
        }
    }

    pub fn build(self) -> ReportRow {
        self.row
    }
}

pub fn number_value(value: f64) -> Value {
    let rounded = round2(value);
    if rounded.fract() == 0.0 && rounded.abs() < 9.0e15 {
        json!(rounded as i64)
    } else {
        json!(rounded)
    }
}

/// Per-language rows sorted by language name, `Others` included like any
/// other language.
pub fn language_rows<T, F>(groups: IndexMap<LanguageKey, T>, mut render: F) -> Vec<ReportRow>
where
    F: FnMut(&str, &T) -> ReportRow,
{
    let mut rows: Vec<ReportRow> = groups
        .iter()
        .map(|(key, value)| render(key.label(), value))
        .collect();
    sort_rows(&mut rows, "language", false);
    rows
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// Rows for one period of a periodic report.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodBlock {
    pub granularity: Granularity,
    pub period: Period,
    pub rows: Vec<ReportRow>,
}

impl Serialize for PeriodBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(self.granularity.number_field(), &self.period.index)?;
        map.serialize_entry("date_range", &self.period.label())?;
        map.serialize_entry("data", &self.rows)?;
        map.end()
    }
}

/// Per-project rows for one user plus their overall totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub total_summary: Vec<ReportRow>,
    pub project_summary: Vec<ReportRow>,
}

/// Final output of a report computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ComposedReport {
    Rows(Vec<ReportRow>),
    Periodic(Vec<PeriodBlock>),
    ByProjectType(IndexMap<String, Vec<ReportRow>>),
    Summary(UserSummary),
}

impl ComposedReport {
    /// Number of leaf rows, across periods and project types.
    pub fn row_count(&self) -> usize {
        match self {
            Self::Rows(rows) => rows.len(),
            Self::Periodic(blocks) => blocks.iter().map(|b| b.rows.len()).sum(),
            Self::ByProjectType(map) => map.values().map(Vec::len).sum(),
            Self::Summary(s) => s.project_summary.len(),
        }
    }

    /// Flattened `(section title, rows)` pairs for tabular rendering.
    pub fn sections(&self) -> Vec<(Option<String>, &[ReportRow])> {
        match self {
            Self::Rows(rows) => vec![(None, rows.as_slice())],
            Self::Periodic(blocks) => blocks
                .iter()
                .map(|b| (Some(b.period.label()), b.rows.as_slice()))
                .collect(),
            Self::ByProjectType(map) => map
                .iter()
                .map(|(t, rows)| (Some(t.clone()), rows.as_slice()))
                .collect(),
            Self::Summary(s) => vec![
                (Some("Total".to_owned()), s.total_summary.as_slice()),
                (Some("Projects".to_owned()), s.project_summary.as_slice()),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
