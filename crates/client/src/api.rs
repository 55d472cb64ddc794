//! API Client
//!
//! Bearer-authenticated calls against the analysis backend:
//! - login (OAuth2 password form) and current-user lookup
//! - opening a streamed AI analysis as a sequence of text increments

use std::fmt;

use zhicuoti_core::{
    decode_text_stream, ByteStreamReader, CurrentUser, SessionContext, TextIncrementStream,
};

use crate::http_client::build_http_client;
use crate::types::{AnalysisTarget, ClientError, ClientResult, ClientSettings, Token};

/// Outcome of requesting a streamed analysis.
pub enum AnalysisFetch {
    /// 200 with a body: increments arrive as the backend produces them.
    Streaming(TextIncrementStream),
    /// Any non-200 status. Treated as "no analysis available".
    Unavailable { status: u16 },
    /// 200 but the response declared an empty body.
    MissingBody,
}

impl fmt::Debug for AnalysisFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisFetch::Streaming(_) => f.write_str("Streaming(..)"),
            AnalysisFetch::Unavailable { status } => {
                f.debug_struct("Unavailable").field("status", status).finish()
            }
            AnalysisFetch::MissingBody => f.write_str("MissingBody"),
        }
    }
}

/// HTTP client for the backend API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    settings: ClientSettings,
}

impl ApiClient {
    /// Validate the settings and build a client for them.
    pub fn new(settings: ClientSettings) -> ClientResult<Self> {
        settings.validate()?;
        let client = build_http_client(&settings)?;
        tracing::debug!(base_url = %settings.base_url, "API client initialized");
        Ok(Self { client, settings })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_reqwest_client(client: reqwest::Client, settings: ClientSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Exchange phone number and password for an access token.
    pub async fn login(&self, phone_number: &str, password: &str) -> ClientResult<Token> {
        let url = self.settings.endpoint("/auth/login");
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .form(&[("username", phone_number), ("password", password)])
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status, "login rejected");
            // The backend answers bad credentials with 400.
            if status == 400 {
                return Err(ClientError::AuthenticationFailed {
                    message: error_detail(&body),
                });
            }
            return Err(parse_http_error(status, &body));
        }

        let token: Token = response
            .json()
            .await
            .map_err(|e| ClientError::invalid_response(format!("token: {}", e)))?;
        Ok(token)
    }

    /// Fetch the user the session's token belongs to.
    pub async fn get_me(&self, session: &SessionContext) -> ClientResult<CurrentUser> {
        let url = self.settings.endpoint("/auth/me");
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(session.token())
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_http_error(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::invalid_response(format!("current user: {}", e)))
    }

    /// Log in and resolve the current user in one step.
    pub async fn open_session(
        &self,
        phone_number: &str,
        password: &str,
    ) -> ClientResult<SessionContext> {
        let token = self.login(phone_number, password).await?;
        let session = SessionContext::new(token.access_token);
        let user = self.get_me(&session).await?;
        tracing::info!(user = %user.id, role = ?user.role, "logged in");
        Ok(session.with_user(user))
    }

    /// Request a streamed analysis.
    ///
    /// Only failures to send the request are errors. Status problems come back
    /// as [`AnalysisFetch::Unavailable`]; read errors surface later from the
    /// returned stream.
    pub async fn open_analysis(
        &self,
        session: &SessionContext,
        target: &AnalysisTarget,
    ) -> ClientResult<AnalysisFetch> {
        let url = self.settings.endpoint_url(&target.segments())?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(session.token())
            .send()
            .await
            .map_err(|e| ClientError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            tracing::warn!(status, endpoint = %target, "analysis unavailable");
            return Ok(AnalysisFetch::Unavailable { status });
        }

        if response.content_length() == Some(0) {
            tracing::warn!(endpoint = %target, "analysis response has no body");
            return Ok(AnalysisFetch::MissingBody);
        }

        let reader = ByteStreamReader::new(response.bytes_stream());
        Ok(AnalysisFetch::Streaming(decode_text_stream(
            reader,
            self.settings.decode_mode,
        )))
    }
}

/// Map a non-success status to an error.
pub fn parse_http_error(status: u16, body: &str) -> ClientError {
    let detail = error_detail(body);
    match status {
        401 => ClientError::AuthenticationFailed {
            message: format!("Invalid or expired token: {}", detail),
        },
        403 => ClientError::AuthenticationFailed {
            message: format!("Access denied: {}", detail),
        },
        404 => ClientError::NotFound { message: detail },
        400 | 422 => ClientError::InvalidRequest { message: detail },
        500..=599 => ClientError::ServerError {
            message: detail,
            status: Some(status),
        },
        _ => ClientError::Other {
            message: format!("HTTP {}: {}", status, detail),
        },
    }
}

/// Pull FastAPI's `{"detail": ...}` out of an error body, falling back to the raw text.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match value.get("detail") {
            Some(serde_json::Value::String(detail)) => detail.clone(),
            Some(other) => other.to_string(),
            None => body.to_string(),
        },
        Err(_) => body.to_string(),
    }
}
