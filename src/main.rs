use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use teacher_activity_report::{
    Credentials, ReportConfig, ReportService, SheetsClient, TokenSource,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting teacher activity report service");

    let config = ReportConfig::from_env().context("invalid configuration")?;

    // The session is built once here and shared by every request
    let credentials = Credentials::from_env()
        .await
        .context("failed to load spreadsheet credentials")?;
    let tokens = TokenSource::connect(credentials)
        .await
        .context("failed to authenticate with the spreadsheet service")?;
    let client =
        SheetsClient::with_endpoints(tokens, &config.sheets_api_base, &config.drive_api_base)
            .context("failed to build spreadsheet client")?;

    let bind_addr = config.bind_addr;
    let app = ReportService::new(client, config).router();

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!("Server running on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
