//! Teacher Activity Report Library
//!
//! This library reads a roster of teachers from a master Google spreadsheet,
//! pulls each teacher's worksheet for a chosen month, and consolidates the
//! rows into one table served as HTML and CSV.

pub mod error;
pub mod helpers;
pub mod models;
pub mod service;

pub use service::{ReportConfig, ReportService};

// Re-export key types for convenience
pub use error::{AuthError, RosterError, SheetsError};
pub use helpers::aggregate::{build_report, build_report_with_progress};
pub use helpers::auth::{Credentials, TokenSource};
pub use helpers::roster::{load_roster, RosterSource};
pub use helpers::sheets::{SheetsBackend, SheetsClient};
pub use models::report::{ConsolidatedReport, EntryStatus, Month, RosterEntry, SheetRow};
pub use models::sheets::Spreadsheet;
