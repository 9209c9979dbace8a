use thiserror::Error;

/// Failure to build the authenticated session. Always fatal.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no credentials configured: set GCP_SERVICE_ACCOUNT_JSON, GOOGLE_APPLICATION_CREDENTIALS or GOOGLE_OAUTH_ACCESS_TOKEN")]
    MissingCredentials,

    #[error("malformed service account key: {0}")]
    MalformedKey(#[source] std::io::Error),

    #[error("service account key rejected: {0}")]
    Rejected(String),

    #[error("token response carried no access token")]
    EmptyToken,

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Failure while talking to the spreadsheet service about one document.
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("not a spreadsheet url: {0}")]
    InvalidUrl(String),

    #[error("spreadsheet not found: {0}")]
    DocumentNotFound(String),

    #[error("worksheet '{worksheet}' not found in spreadsheet '{document}'")]
    WorksheetNotFound { document: String, worksheet: String },

    #[error("permission denied for {0}; share it with the service account")]
    PermissionDenied(String),

    #[error("spreadsheet api returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not decode api response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("authentication failed: {0}")]
    Auth(String),
}

/// Failure loading the master roster. Always fatal for the run.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error(transparent)]
    Sheets(#[from] SheetsError),

    #[error("roster worksheet has no column '{0}'")]
    MissingColumn(String),
}

impl RosterError {
    /// Operator-facing hint shown next to the error.
    pub fn remediation(&self) -> &'static str {
        match self {
            RosterError::Sheets(SheetsError::WorksheetNotFound { .. })
            | RosterError::MissingColumn(_) => {
                "Verifique se o nome da aba na planilha CADASTROS é realmente 'CADASTRO_PROF' e se os cabeçalhos estão corretos."
            }
            RosterError::Sheets(_) => {
                "Verifique se a planilha CADASTROS foi compartilhada com o e-mail da conta de serviço."
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
