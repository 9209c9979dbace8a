use std::sync::Arc;
use tracing::{error, info};
use yup_oauth2::{
    authenticator::DefaultAuthenticator, ServiceAccountAuthenticator, ServiceAccountKey,
};

use crate::error::{AuthError, SheetsError};

pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

/// Credential material as supplied by the hosting environment.
pub enum Credentials {
    ServiceAccount(ServiceAccountKey),
    /// A bearer token minted elsewhere, used as-is.
    AccessToken(String),
}

impl Credentials {
    /// Resolves credentials from `GCP_SERVICE_ACCOUNT_JSON`, then
    /// `GOOGLE_APPLICATION_CREDENTIALS`, then `GOOGLE_OAUTH_ACCESS_TOKEN`.
    pub async fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(json) = var("GCP_SERVICE_ACCOUNT_JSON") {
            info!("Loading service account key from GCP_SERVICE_ACCOUNT_JSON");
            let key =
                yup_oauth2::parse_service_account_key(json).map_err(AuthError::MalformedKey)?;
            return Ok(Credentials::ServiceAccount(key));
        }

        if let Some(path) = var("GOOGLE_APPLICATION_CREDENTIALS") {
            info!("Loading service account key from file: {}", path);
            let key = yup_oauth2::read_service_account_key(&path)
                .await
                .map_err(AuthError::MalformedKey)?;
            return Ok(Credentials::ServiceAccount(key));
        }

        if let Some(token) = var("GOOGLE_OAUTH_ACCESS_TOKEN") {
            info!("Using static access token from GOOGLE_OAUTH_ACCESS_TOKEN");
            return Ok(Credentials::AccessToken(token));
        }

        error!("No spreadsheet service credentials found in the environment");
        Err(AuthError::MissingCredentials)
    }

    pub async fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|var| std::env::var(var).ok()).await
    }
}

/// Hands out bearer tokens for the fixed scope set.
#[derive(Clone)]
pub enum TokenSource {
    ServiceAccount(Arc<DefaultAuthenticator>),
    Static(String),
}

impl TokenSource {
    /// Builds the authenticator and requests a first token so a rejected key
    /// fails here instead of on the first report.
    pub async fn connect(credentials: Credentials) -> Result<Self, AuthError> {
        match credentials {
            Credentials::AccessToken(token) => Ok(TokenSource::Static(token)),
            Credentials::ServiceAccount(key) => {
                info!("Authenticating as service account: {}", key.client_email);

                let auth = ServiceAccountAuthenticator::builder(key)
                    .build()
                    .await
                    .map_err(AuthError::MalformedKey)?;

                match auth.token(&SCOPES).await {
                    Ok(token) if token.token().is_some() => {
                        info!("Service account token acquired");
                    }
                    Ok(_) => return Err(AuthError::EmptyToken),
                    Err(e) => {
                        error!("Service account key rejected: {}", e);
                        return Err(AuthError::Rejected(e.to_string()));
                    }
                }

                Ok(TokenSource::ServiceAccount(Arc::new(auth)))
            }
        }
    }

    pub async fn bearer(&self) -> Result<String, SheetsError> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::ServiceAccount(auth) => {
                let token = auth
                    .token(&SCOPES)
                    .await
                    .map_err(|e| SheetsError::Auth(e.to_string()))?;
                token
                    .token()
                    .map(str::to_string)
                    .ok_or_else(|| SheetsError::Auth("empty access token".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[tokio::test]
    async fn missing_credentials_is_an_error() {
        let result = Credentials::from_lookup(lookup(&[])).await;
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[tokio::test]
    async fn malformed_inline_key_is_rejected() {
        let vars = lookup(&[("GCP_SERVICE_ACCOUNT_JSON", "{not json")]);
        let result = Credentials::from_lookup(vars).await;
        assert!(matches!(result, Err(AuthError::MalformedKey(_))));
    }

    #[tokio::test]
    async fn static_token_is_passed_through() {
        let creds = Credentials::from_lookup(lookup(&[("GOOGLE_OAUTH_ACCESS_TOKEN", "ya29.test")]))
            .await
            .unwrap();
        let source = TokenSource::connect(creds).await.unwrap();
        assert_eq!(source.bearer().await.unwrap(), "ya29.test");
    }

    #[tokio::test]
    async fn blank_values_are_skipped() {
        let creds = Credentials::from_lookup(lookup(&[
            ("GCP_SERVICE_ACCOUNT_JSON", "  "),
            ("GOOGLE_OAUTH_ACCESS_TOKEN", "tok"),
        ]))
        .await
        .unwrap();
        assert!(matches!(creds, Credentials::AccessToken(t) if t == "tok"));
    }
}
