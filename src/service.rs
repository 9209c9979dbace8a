use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info};

use crate::{
    error::{ConfigError, RosterError},
    helpers::{
        aggregate::{build_report_with_progress, TEACHER_COLUMN},
        export,
        roster::{load_roster, RosterSource},
        sheets::{SheetsBackend, DRIVE_API_BASE, SHEETS_API_BASE},
    },
    models::report::{ConsolidatedReport, Month},
};

/// Configuration for the report service
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub bind_addr: SocketAddr,
    pub roster: RosterSource,
    pub teacher_column: String,
    pub sheets_api_base: String,
    pub drive_api_base: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            roster: RosterSource::default(),
            teacher_column: TEACHER_COLUMN.to_string(),
            sheets_api_base: SHEETS_API_BASE.to_string(),
            drive_api_base: DRIVE_API_BASE.to_string(),
        }
    }
}

impl ReportConfig {
    /// Builds the configuration from variables resolved by `lookup`, falling
    /// back to the defaults for anything unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(addr) = var("BIND_ADDR") {
            config.bind_addr = addr.parse().map_err(|e| ConfigError::Invalid {
                var: "BIND_ADDR",
                reason: format!("{addr}: {e}"),
            })?;
        }
        if let Some(v) = var("MASTER_DOCUMENT") {
            config.roster.document = v;
        }
        if let Some(v) = var("ROSTER_WORKSHEET") {
            config.roster.worksheet = v;
        }
        if let Some(v) = var("ROSTER_TEACHER_COLUMN") {
            config.roster.teacher_column = v;
        }
        if let Some(v) = var("ROSTER_LINK_COLUMN") {
            config.roster.link_column = v;
        }
        if let Some(v) = var("TEACHER_COLUMN") {
            config.teacher_column = v;
        }
        if let Some(v) = var("SHEETS_API_BASE") {
            config.sheets_api_base = v;
        }
        if let Some(v) = var("DRIVE_API_BASE") {
            config.drive_api_base = v;
        }

        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

/// Generates consolidated monthly reports from the roster's spreadsheets.
pub struct ReportService<B> {
    pub backend: B,
    pub config: ReportConfig,
}

impl<B> ReportService<B>
where
    B: SheetsBackend + Send + Sync + 'static,
{
    pub fn new(backend: B, config: ReportConfig) -> Self {
        info!("Creating new ReportService instance");
        Self { backend, config }
    }

    /// Create an Axum router for the report service
    pub fn router(self) -> Router {
        info!("Creating report service router");
        let shared_state = Arc::new(self);

        Router::new()
            .route("/", get(index))
            .route("/report", get(report_page::<B>))
            .route("/report.csv", get(report_csv::<B>))
            .route("/health", get(|| async { "OK" }))
            .with_state(shared_state)
    }

    /// Reads the roster once, then aggregates every teacher's worksheet for
    /// `month`.
    pub async fn generate(&self, month: Month) -> Result<ConsolidatedReport, RosterError> {
        info!("Generating report for {}", month);

        let roster = load_roster(&self.backend, &self.config.roster).await?;

        let mut report = build_report_with_progress(
            &self.backend,
            &roster,
            month.as_str(),
            &self.config.teacher_column,
            |progress| {
                info!(
                    "Progress {:.0}% ({}/{}): {}",
                    progress.fraction() * 100.0,
                    progress.done,
                    progress.total,
                    progress.teacher
                )
            },
        )
        .await;
        report.roster_document = Some(self.config.roster.document.clone());

        if report.is_empty() {
            info!("No data found for {}", month);
        }
        Ok(report)
    }
}

#[derive(Debug, Deserialize)]
struct ReportQuery {
    month: String,
}

enum ServiceError {
    BadMonth(String),
    Roster(RosterError),
    Export(csv::Error),
}

impl From<RosterError> for ServiceError {
    fn from(err: RosterError) -> Self {
        ServiceError::Roster(err)
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::BadMonth(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ServiceError::Roster(err) => {
                error!("Failed to load roster: {}", err);
                let html = export::render_error(&err.to_string(), err.remediation());
                (StatusCode::BAD_GATEWAY, Html(html)).into_response()
            }
            ServiceError::Export(err) => {
                error!("Failed to serialize report: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error exporting report: {}", err),
                )
                    .into_response()
            }
        }
    }
}

// Route handlers
async fn index() -> Html<String> {
    Html(export::render_index())
}

async fn report_page<B>(
    State(service): State<Arc<ReportService<B>>>,
    Query(query): Query<ReportQuery>,
) -> Result<Html<String>, ServiceError>
where
    B: SheetsBackend + Send + Sync + 'static,
{
    let month: Month = query.month.parse().map_err(ServiceError::BadMonth)?;
    let report = service.generate(month).await?;
    Ok(Html(export::render_report(&report)))
}

async fn report_csv<B>(
    State(service): State<Arc<ReportService<B>>>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ServiceError>
where
    B: SheetsBackend + Send + Sync + 'static,
{
    let month: Month = query.month.parse().map_err(ServiceError::BadMonth)?;
    let report = service.generate(month).await?;
    if report.is_empty() {
        info!("Nothing to download for {}", month);
        let page = Html(export::render_report(&report));
        return Ok((StatusCode::NOT_FOUND, page).into_response());
    }
    let body = export::to_csv(&report).map_err(ServiceError::Export)?;

    info!(
        "Serving {} ({} bytes)",
        export::csv_filename(month.as_str()),
        body.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export::csv_filename(month.as_str())),
            ),
        ],
        body,
    )
        .into_response())
}
