use chrono::{DateTime, Local};
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::str::FromStr;

use crate::error::SheetsError;

/// One worksheet row keyed by its (trimmed) header text.
///
/// Values stay raw strings and the key set is whatever the worksheet's header
/// row holds, so rows from different teachers do not share a schema.
pub type SheetRow = IndexMap<String, String>;

/// A teacher and the link to their personal spreadsheet, as listed in the
/// master roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub teacher_name: String,
    pub sheet_link: String,
}

impl RosterEntry {
    pub fn new(teacher_name: impl Into<String>, sheet_link: impl Into<String>) -> Self {
        Self {
            teacher_name: teacher_name.into(),
            sheet_link: sheet_link.into(),
        }
    }

    pub fn has_link(&self) -> bool {
        !self.sheet_link.is_empty()
    }
}

/// Zips a data row against a header row.
///
/// Cells past the header width are dropped and missing trailing cells become
/// empty strings. With repeated header text the last cell wins.
pub fn zip_row(header: &[String], row: &[String]) -> SheetRow {
    let mut out = SheetRow::with_capacity(header.len());
    for (i, key) in header.iter().enumerate() {
        let value = row.get(i).cloned().unwrap_or_default();
        out.insert(key.clone(), value);
    }
    out
}

/// Accepted month tokens. Each one is also the exact worksheet title looked
/// up in every teacher's spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Month {
    Janeiro,
    Fevereiro,
    Marco,
    Abril,
    Maio,
    Junho,
}

impl Month {
    pub const ALL: [Month; 6] = [
        Month::Janeiro,
        Month::Fevereiro,
        Month::Marco,
        Month::Abril,
        Month::Maio,
        Month::Junho,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Month::Janeiro => "JANEIRO",
            Month::Fevereiro => "FEVEREIRO",
            Month::Marco => "MARCO",
            Month::Abril => "ABRIL",
            Month::Maio => "MAIO",
            Month::Junho => "JUNHO",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Month::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                let accepted: Vec<&str> = Month::ALL.iter().map(Month::as_str).collect();
                format!("unknown month '{}', expected one of {}", s, accepted.join(", "))
            })
    }
}

/// What happened to a single roster entry during aggregation.
#[derive(Debug)]
pub enum EntryStatus {
    Contributed(usize),
    NoLink,
    /// The month worksheet held a header row at most.
    Empty,
    Failed(SheetsError),
}

#[derive(Debug)]
pub struct EntryOutcome {
    pub teacher: String,
    pub status: EntryStatus,
}

/// Per-entry progress handed out while a report is being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    pub teacher: String,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.done as f64 / self.total as f64
    }
}

/// Every teacher's rows for one month, in roster order then worksheet order,
/// together with the outcome of each roster entry.
#[derive(Debug)]
pub struct ConsolidatedReport {
    pub month: String,
    pub generated_at: DateTime<Local>,
    /// Master document the roster was read from, when known.
    pub roster_document: Option<String>,
    rows: Vec<SheetRow>,
    outcomes: Vec<EntryOutcome>,
}

impl ConsolidatedReport {
    pub fn new(month: impl Into<String>) -> Self {
        Self {
            month: month.into(),
            generated_at: Local::now(),
            roster_document: None,
            rows: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    pub(crate) fn push_rows(&mut self, rows: impl IntoIterator<Item = SheetRow>) {
        self.rows.extend(rows);
    }

    pub(crate) fn record(&mut self, teacher: impl Into<String>, status: EntryStatus) {
        self.outcomes.push(EntryOutcome {
            teacher: teacher.into(),
            status,
        });
    }

    pub fn rows(&self) -> &[SheetRow] {
        &self.rows
    }

    pub fn outcomes(&self) -> &[EntryOutcome] {
        &self.outcomes
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of roster entries processed, with or without a link.
    pub fn roster_size(&self) -> usize {
        self.outcomes.len()
    }

    /// Union of all row keys in order of first appearance.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: IndexSet<&str> = IndexSet::new();
        for row in &self.rows {
            for key in row.keys() {
                columns.insert(key.as_str());
            }
        }
        columns.into_iter().collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &SheetsError)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            EntryStatus::Failed(err) => Some((o.teacher.as_str(), err)),
            _ => None,
        })
    }

    /// True when at least one entry was fetched and every fetch failed.
    pub fn all_failed(&self) -> bool {
        let mut attempted = 0;
        let mut failed = 0;
        for outcome in &self.outcomes {
            match outcome.status {
                EntryStatus::NoLink => {}
                EntryStatus::Failed(_) => {
                    attempted += 1;
                    failed += 1;
                }
                _ => attempted += 1,
            }
        }
        attempted > 0 && attempted == failed
    }
}
