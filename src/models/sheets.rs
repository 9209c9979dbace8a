use serde::{Deserialize, Serialize};

use crate::error::SheetsError;

/// An opened spreadsheet: its key, title and worksheet (tab) titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spreadsheet {
    pub id: String,
    pub title: String,
    pub worksheets: Vec<String>,
}

impl Spreadsheet {
    /// Looks up a worksheet by exact, case-sensitive title.
    pub fn worksheet(&self, title: &str) -> Result<&str, SheetsError> {
        self.worksheets
            .iter()
            .find(|ws| ws.as_str() == title)
            .map(String::as_str)
            .ok_or_else(|| SheetsError::WorksheetNotFound {
                document: self.title.clone(),
                worksheet: title.to_string(),
            })
    }
}

impl From<SpreadsheetMetadata> for Spreadsheet {
    fn from(meta: SpreadsheetMetadata) -> Self {
        Spreadsheet {
            id: meta.spreadsheet_id,
            title: meta.properties.title,
            worksheets: meta
                .sheets
                .into_iter()
                .map(|sheet| sheet.properties.title)
                .collect(),
        }
    }
}

// Response structs for the Sheets v4 and Drive v3 APIs
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetMetadata {
    pub spreadsheet_id: String,
    pub properties: SpreadsheetProperties,
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SpreadsheetProperties {
    pub title: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Sheet {
    pub properties: SheetProperties,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default)]
    pub sheet_id: i64,
    pub title: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: String,
    #[serde(default)]
    pub major_dimension: Option<String>,
    // Omitted entirely by the api when the range is empty
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_maps_to_spreadsheet() {
        let raw = r#"{
            "spreadsheetId": "abc",
            "properties": {"title": "Ana - Atividades"},
            "sheets": [
                {"properties": {"sheetId": 0, "title": "JANEIRO"}},
                {"properties": {"sheetId": 7, "title": "MARCO"}}
            ]
        }"#;
        let meta: SpreadsheetMetadata = serde_json::from_str(raw).unwrap();
        let sheet = Spreadsheet::from(meta);

        assert_eq!(sheet.id, "abc");
        assert_eq!(sheet.worksheets, vec!["JANEIRO", "MARCO"]);
        assert_eq!(sheet.worksheet("MARCO").unwrap(), "MARCO");
    }

    #[test]
    fn worksheet_lookup_is_exact() {
        let sheet = Spreadsheet {
            id: "abc".into(),
            title: "Ana".into(),
            worksheets: vec!["Marco ".into(), "marco".into()],
        };

        match sheet.worksheet("MARCO") {
            Err(SheetsError::WorksheetNotFound { document, worksheet }) => {
                assert_eq!(document, "Ana");
                assert_eq!(worksheet, "MARCO");
            }
            other => panic!("unexpected lookup result: {other:?}"),
        }
    }

    #[test]
    fn value_range_without_values_is_empty() {
        let raw = r#"{"range": "'MAIO'!A1:Z1000", "majorDimension": "ROWS"}"#;
        let vr: ValueRange = serde_json::from_str(raw).unwrap();
        assert!(vr.values.is_empty());
    }
}
