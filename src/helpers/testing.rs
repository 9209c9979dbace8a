//! In-memory spreadsheet service for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::error::SheetsError;
use crate::helpers::sheets::SheetsBackend;
use crate::models::sheets::Spreadsheet;

#[derive(Default)]
pub struct FakeSheets {
    documents: HashMap<String, Spreadsheet>,
    values: HashMap<(String, String), Vec<Vec<String>>>,
    by_name: HashMap<String, String>,
    by_link: HashMap<String, String>,
    denied: HashSet<String>,
    reads: Mutex<HashMap<(String, String), usize>>,
}

fn to_rows(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect()
}

impl FakeSheets {
    pub fn with_worksheet(mut self, key: &str, worksheet: &str, rows: &[&[&str]]) -> Self {
        let doc = self
            .documents
            .entry(key.to_string())
            .or_insert_with(|| Spreadsheet {
                id: key.to_string(),
                title: key.to_string(),
                worksheets: Vec::new(),
            });
        doc.worksheets.push(worksheet.to_string());
        self.values
            .insert((key.to_string(), worksheet.to_string()), to_rows(rows));
        self
    }

    pub fn with_named(mut self, name: &str, key: &str, worksheet: &str, rows: &[&[&str]]) -> Self {
        self.by_name.insert(name.to_string(), key.to_string());
        self.with_worksheet(key, worksheet, rows)
    }

    pub fn with_link(mut self, link: &str, key: &str, worksheet: &str, rows: &[&[&str]]) -> Self {
        self.by_link.insert(link.to_string(), key.to_string());
        self.with_worksheet(key, worksheet, rows)
    }

    pub fn deny(mut self, link: &str) -> Self {
        self.denied.insert(link.to_string());
        self
    }

    pub fn value_reads(&self, key: &str, worksheet: &str) -> usize {
        let reads = self.reads.lock().unwrap();
        reads
            .get(&(key.to_string(), worksheet.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn open_key(&self, key: Option<&String>, subject: &str) -> Result<Spreadsheet, SheetsError> {
        key.and_then(|k| self.documents.get(k))
            .cloned()
            .ok_or_else(|| SheetsError::DocumentNotFound(subject.to_string()))
    }
}

impl SheetsBackend for FakeSheets {
    async fn open_by_name(&self, name: &str) -> Result<Spreadsheet, SheetsError> {
        self.open_key(self.by_name.get(name), name)
    }

    async fn open_by_url(&self, link: &str) -> Result<Spreadsheet, SheetsError> {
        if self.denied.contains(link) {
            return Err(SheetsError::PermissionDenied(link.to_string()));
        }
        self.open_key(self.by_link.get(link), link)
    }

    async fn worksheet_values(
        &self,
        spreadsheet: &Spreadsheet,
        worksheet: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let key = (spreadsheet.id.clone(), worksheet.to_string());
        *self.reads.lock().unwrap().entry(key.clone()).or_default() += 1;
        self.values
            .get(&key)
            .cloned()
            .ok_or_else(|| SheetsError::WorksheetNotFound {
                document: spreadsheet.title.clone(),
                worksheet: worksheet.to_string(),
            })
    }
}
