use tracing::{error, info};

use crate::error::RosterError;
use crate::helpers::sheets::SheetsBackend;
use crate::models::report::{zip_row, RosterEntry};

/// Where the master roster lives and which columns hold what.
#[derive(Debug, Clone)]
pub struct RosterSource {
    pub document: String,
    pub worksheet: String,
    pub teacher_column: String,
    pub link_column: String,
}

impl Default for RosterSource {
    fn default() -> Self {
        Self {
            document: "CADASTROS".to_string(),
            worksheet: "CADASTRO_PROF".to_string(),
            teacher_column: "PROFESSOR (A)".to_string(),
            link_column: "LINK DA PLANILHA".to_string(),
        }
    }
}

/// Reads the master roster. Any failure here is fatal for the run.
pub async fn load_roster<B: SheetsBackend>(
    backend: &B,
    source: &RosterSource,
) -> Result<Vec<RosterEntry>, RosterError> {
    let document = match backend.open_by_name(&source.document).await {
        Ok(doc) => doc,
        Err(e) => {
            error!("Failed to open master document '{}': {}", source.document, e);
            return Err(e.into());
        }
    };
    let worksheet = document.worksheet(&source.worksheet)?;
    info!("Connected to master document '{}'", document.title);

    let values = backend.worksheet_values(&document, worksheet).await?;
    let Some((header, data)) = values.split_first() else {
        info!("Roster worksheet '{}' is empty", source.worksheet);
        return Ok(Vec::new());
    };

    for column in [&source.teacher_column, &source.link_column] {
        if !header.iter().any(|h| h == column) {
            error!("Roster header row lacks column '{}': {:?}", column, header);
            return Err(RosterError::MissingColumn(column.clone()));
        }
    }

    let roster: Vec<RosterEntry> = data
        .iter()
        .map(|row| {
            let mut record = zip_row(header, row);
            RosterEntry {
                teacher_name: record.swap_remove(&source.teacher_column).unwrap_or_default(),
                sheet_link: record.swap_remove(&source.link_column).unwrap_or_default(),
            }
        })
        .collect();

    info!("Loaded roster with {} teacher(s)", roster.len());
    Ok(roster)
}
