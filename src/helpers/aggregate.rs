use tracing::{debug, info, warn};

use crate::error::SheetsError;
use crate::helpers::sheets::SheetsBackend;
use crate::models::report::{
    zip_row, ConsolidatedReport, EntryStatus, Progress, RosterEntry, SheetRow,
};

/// Column injected into every row with the owning teacher's name.
pub const TEACHER_COLUMN: &str = "teacher";

/// Builds the consolidated report for `month` with the default teacher column.
pub async fn build_report<B: SheetsBackend>(
    backend: &B,
    roster: &[RosterEntry],
    month: &str,
) -> ConsolidatedReport {
    build_report_with_progress(backend, roster, month, TEACHER_COLUMN, |progress| {
        debug!(
            "Progress {}/{} ({})",
            progress.done, progress.total, progress.teacher
        )
    })
    .await
}

/// Walks the roster in order and concatenates every teacher's `month`
/// worksheet. A failing entry is recorded and skipped; it never aborts the
/// run. `on_progress` is called once per roster entry.
pub async fn build_report_with_progress<B, F>(
    backend: &B,
    roster: &[RosterEntry],
    month: &str,
    teacher_column: &str,
    mut on_progress: F,
) -> ConsolidatedReport
where
    B: SheetsBackend,
    F: FnMut(&Progress) + Send,
{
    info!(
        "Buscando atividades de {} professores para o mês de {}",
        roster.len(),
        month
    );

    let mut report = ConsolidatedReport::new(month);

    for (i, entry) in roster.iter().enumerate() {
        let status = if !entry.has_link() {
            debug!("No spreadsheet link for {}, skipping", entry.teacher_name);
            EntryStatus::NoLink
        } else {
            match fetch_month(backend, &entry.sheet_link, month).await {
                Ok(values) => match teacher_rows(&values, &entry.teacher_name, teacher_column) {
                    Some(rows) => {
                        let count = rows.len();
                        report.push_rows(rows);
                        info!("{} contributed {} row(s)", entry.teacher_name, count);
                        EntryStatus::Contributed(count)
                    }
                    None => {
                        info!("{} has no rows for {}", entry.teacher_name, month);
                        EntryStatus::Empty
                    }
                },
                Err(e) => {
                    warn!("Erro em {}: {}", entry.teacher_name, e);
                    EntryStatus::Failed(e)
                }
            }
        };
        report.record(entry.teacher_name.clone(), status);

        on_progress(&Progress {
            done: i + 1,
            total: roster.len(),
            teacher: entry.teacher_name.clone(),
        });
    }

    info!(
        "Report for {} has {} row(s), {} failed entr(ies)",
        month,
        report.rows().len(),
        report.failures().count()
    );
    report
}

async fn fetch_month<B: SheetsBackend>(
    backend: &B,
    link: &str,
    month: &str,
) -> Result<Vec<Vec<String>>, SheetsError> {
    let document = backend.open_by_url(link).await?;
    let worksheet = document.worksheet(month)?;
    backend.worksheet_values(&document, worksheet).await
}

/// Zips a worksheet's data rows against its trimmed header and tags each one
/// with the teacher. `None` when there is nothing below the header.
fn teacher_rows(
    values: &[Vec<String>],
    teacher: &str,
    teacher_column: &str,
) -> Option<Vec<SheetRow>> {
    let (header, data) = values.split_first()?;
    if data.is_empty() {
        return None;
    }

    let header: Vec<String> = header.iter().map(|c| c.trim().to_string()).collect();
    let rows = data
        .iter()
        .map(|line| {
            let mut row = zip_row(&header, line);
            row.insert(teacher_column.to_string(), teacher.to_string());
            row
        })
        .collect();
    Some(rows)
}
