use regex::Regex;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::LazyLock;
use tracing::{debug, error, info};
use url::Url;

use crate::error::{AuthError, SheetsError};
use crate::helpers::auth::TokenSource;
use crate::models::sheets::{
    ApiErrorBody, DriveFileList, Spreadsheet, SpreadsheetMetadata, ValueRange,
};

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

static KEY_IN_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)|key=([a-zA-Z0-9_-]+)")
        .expect("spreadsheet key pattern is valid")
});

/// Pulls the spreadsheet key out of a share/edit url.
pub fn extract_key(link: &str) -> Result<String, SheetsError> {
    KEY_IN_URL
        .captures(link)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| SheetsError::InvalidUrl(link.to_string()))
}

/// The read operations report generation needs from a spreadsheet service.
pub trait SheetsBackend {
    /// Opens the spreadsheet whose title is exactly `name`.
    fn open_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Spreadsheet, SheetsError>> + Send;

    /// Opens the spreadsheet a share/edit url points at.
    fn open_by_url(
        &self,
        link: &str,
    ) -> impl Future<Output = Result<Spreadsheet, SheetsError>> + Send;

    /// Every cell of a worksheet as raw text, row by row.
    fn worksheet_values(
        &self,
        spreadsheet: &Spreadsheet,
        worksheet: &str,
    ) -> impl Future<Output = Result<Vec<Vec<String>>, SheetsError>> + Send;
}

/// Authenticated session against the Google Sheets and Drive apis.
///
/// Build it once at startup and share it; the token source refreshes tokens
/// internally.
#[derive(Clone)]
pub struct SheetsClient {
    http: Client,
    tokens: TokenSource,
    sheets_base: String,
    drive_base: String,
}

impl SheetsClient {
    pub fn new(tokens: TokenSource) -> Result<Self, AuthError> {
        Self::with_endpoints(tokens, SHEETS_API_BASE, DRIVE_API_BASE)
    }

    pub fn with_endpoints(
        tokens: TokenSource,
        sheets_base: impl Into<String>,
        drive_base: impl Into<String>,
    ) -> Result<Self, AuthError> {
        info!("Initializing spreadsheet client");

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            tokens,
            sheets_base: sheets_base.into().trim_end_matches('/').to_string(),
            drive_base: drive_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn open_by_key(&self, key: &str) -> Result<Spreadsheet, SheetsError> {
        let mut url = self.endpoint(&self.sheets_base, &["spreadsheets", key])?;
        url.query_pairs_mut()
            .append_pair("fields", "spreadsheetId,properties.title,sheets.properties");

        debug!("Fetching spreadsheet metadata for key {}", key);
        let meta: SpreadsheetMetadata = self.get_json(self.http.get(url), key).await?;
        let sheet = Spreadsheet::from(meta);
        info!(
            "Opened spreadsheet '{}' with {} worksheet(s)",
            sheet.title,
            sheet.worksheets.len()
        );
        Ok(sheet)
    }

    fn endpoint(&self, base: &str, segments: &[&str]) -> Result<Url, SheetsError> {
        let mut url =
            Url::parse(base).map_err(|e| SheetsError::InvalidUrl(format!("{base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidUrl(base.to_string()))?
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        subject: &str,
    ) -> Result<T, SheetsError> {
        let token = self.tokens.bearer().await?;

        let response = match request.bearer_auth(token).send().await {
            Ok(resp) => resp,
            Err(e) => {
                error!("Failed to send request to spreadsheet api: {}", e);
                return Err(e.into());
            }
        };

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or_else(|_| text.clone());
            error!("Spreadsheet api returned error status {}: {}", status, message);

            return Err(match status {
                StatusCode::NOT_FOUND => SheetsError::DocumentNotFound(subject.to_string()),
                StatusCode::FORBIDDEN => SheetsError::PermissionDenied(subject.to_string()),
                StatusCode::UNAUTHORIZED => SheetsError::Auth(message),
                _ => SheetsError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        match serde_json::from_str::<T>(&text) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                error!("Failed to parse spreadsheet api response: {}", e);
                debug!("Raw response: {}", text);
                Err(e.into())
            }
        }
    }
}

/// Quotes a worksheet title for use as an A1 range.
fn quoted_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

impl SheetsBackend for SheetsClient {
    async fn open_by_name(&self, name: &str) -> Result<Spreadsheet, SheetsError> {
        let mut url = self.endpoint(&self.drive_base, &["files"])?;
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            name.replace('\\', "\\\\").replace('\'', "\\'"),
            SPREADSHEET_MIME
        );
        url.query_pairs_mut()
            .append_pair("q", &query)
            .append_pair("fields", "files(id,name)")
            .append_pair("supportsAllDrives", "true")
            .append_pair("includeItemsFromAllDrives", "true");

        info!("Searching drive for spreadsheet named '{}'", name);
        let list: DriveFileList = self.get_json(self.http.get(url), name).await?;

        let file = list
            .files
            .into_iter()
            .find(|f| f.name == name)
            .ok_or_else(|| SheetsError::DocumentNotFound(name.to_string()))?;

        self.open_by_key(&file.id).await
    }

    async fn open_by_url(&self, link: &str) -> Result<Spreadsheet, SheetsError> {
        let key = extract_key(link)?;
        self.open_by_key(&key).await
    }

    async fn worksheet_values(
        &self,
        spreadsheet: &Spreadsheet,
        worksheet: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let range = quoted_range(worksheet);
        let mut url = self.endpoint(
            &self.sheets_base,
            &["spreadsheets", &spreadsheet.id, "values", &range],
        )?;
        url.query_pairs_mut()
            .append_pair("valueRenderOption", "FORMATTED_VALUE")
            .append_pair("majorDimension", "ROWS");

        debug!("Reading worksheet '{}' of '{}'", worksheet, spreadsheet.title);
        let values: ValueRange = self.get_json(self.http.get(url), &spreadsheet.title).await?;
        info!(
            "Read {} row(s) from '{}' / '{}'",
            values.values.len(),
            spreadsheet.title,
            worksheet
        );
        Ok(values.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_key_from_edit_url() {
        let key = extract_key(
            "https://docs.google.com/spreadsheets/d/1AbC-d_9xYz/edit#gid=0",
        )
        .unwrap();
        assert_eq!(key, "1AbC-d_9xYz");
    }

    #[test]
    fn extracts_key_from_legacy_url() {
        let key =
            extract_key("https://docs.google.com/spreadsheet/ccc?key=0Ak_9-z&usp=sharing").unwrap();
        assert_eq!(key, "0Ak_9-z");
    }

    #[test]
    fn rejects_non_spreadsheet_link() {
        assert!(matches!(
            extract_key("https://example.com/planilha"),
            Err(SheetsError::InvalidUrl(_))
        ));
        assert!(matches!(extract_key(" "), Err(SheetsError::InvalidUrl(_))));
    }

    #[test]
    fn range_quotes_titles() {
        assert_eq!(quoted_range("MARCO"), "'MARCO'");
        assert_eq!(quoted_range("Ana's"), "'Ana''s'");
    }
}
