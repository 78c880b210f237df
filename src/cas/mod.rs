//! CAS REST ticket exchange: TGT request, then ST request.

pub mod form;

use std::{fmt, time::Duration};

use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder};
use thiserror::Error;
use tracing::debug;

use crate::config::{CasConfig, CredentialEncoding};

pub use form::extract_form_action;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Error)]
pub enum CasError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("{stage} request failed: {source}")]
    Transport {
        stage: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{stage} request to {url} returned HTTP {status}")]
    Status {
        stage: &'static str,
        url: String,
        status: u16,
    },
    #[error("TGT response contains no form element (were the credentials rejected?)")]
    MissingForm,
    #[error("TGT response form has no action attribute")]
    MissingAction,
}

pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The two ticket requests the benchmark times.
#[allow(async_fn_in_trait)]
pub trait TicketSource {
    async fn ticket_granting_ticket(&self, credentials: &Credentials) -> Result<Bytes, CasError>;
    async fn service_ticket(&self, service_ticket_url: &str) -> Result<Bytes, CasError>;
}

pub struct CasClient {
    http: Client,
    tickets_url: String,
    service_url: String,
    encoding: CredentialEncoding,
}

impl CasClient {
    pub fn new(config: &CasConfig) -> Result<Self, CasError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(CasError::Client)?;
        Ok(Self {
            http,
            tickets_url: config.tickets_url.clone(),
            service_url: config.service_url.clone(),
            encoding: config.credential_encoding,
        })
    }

    async fn send(
        &self,
        stage: &'static str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<Bytes, CasError> {
        debug!(stage, url, "sending request");
        let response = request
            .send()
            .await
            .map_err(|source| CasError::Transport { stage, source })?;
        let status = response.status();
        debug!(stage, status = status.as_u16(), "received response");
        if !status.is_success() {
            return Err(CasError::Status {
                stage,
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response
            .bytes()
            .await
            .map_err(|source| CasError::Transport { stage, source })
    }
}

impl TicketSource for CasClient {
    async fn ticket_granting_ticket(&self, credentials: &Credentials) -> Result<Bytes, CasError> {
        let request = self.http.post(&self.tickets_url);
        let request = match self.encoding {
            // No escaping: '&' or '=' inside a credential corrupts the body.
            CredentialEncoding::Raw => request
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(raw_credential_body(credentials)),
            CredentialEncoding::Form => request.form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ]),
        };
        self.send("TGT", &self.tickets_url, request).await
    }

    async fn service_ticket(&self, service_ticket_url: &str) -> Result<Bytes, CasError> {
        let request = self
            .http
            .post(service_ticket_url)
            .form(&[("service", self.service_url.as_str())]);
        self.send("ST", service_ticket_url, request).await
    }
}

pub fn raw_credential_body(credentials: &Credentials) -> String {
    format!(
        "username={}&password={}",
        credentials.username, credentials.password
    )
}

/// Decodes a service-ticket response body into the ticket string.
pub fn ticket_from_body(body: &[u8]) -> String {
    String::from_utf8_lossy(body).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_body_is_not_escaped() {
        let credentials = Credentials::new("jdoe", "p&ss=word");
        assert_eq!(
            raw_credential_body(&credentials),
            "username=jdoe&password=p&ss=word"
        );
    }

    #[test]
    fn debug_output_hides_password() {
        let credentials = Credentials::new("jdoe", "hunter2");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("jdoe"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn ticket_is_trimmed() {
        assert_eq!(ticket_from_body(b"ST-1-abc\r\n"), "ST-1-abc");
        assert_eq!(ticket_from_body(b""), "");
    }
}
