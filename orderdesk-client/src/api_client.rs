//! REST client for the remote record store.
//!
//! Every action goes to the same endpoint. Reads are `GET ?action=<name>`,
//! writes are a JSON document POSTed as `text/plain`. Responses share one
//! envelope: `{ "status": "success" | ..., "data": ..., "message": ... }`.

use crate::config::ClientConfig;
use async_trait::async_trait;
use orderdesk_core::{
    FetchError, OrderdeskResult, ProfileSink, ProfileUpdate, ReferenceData, ReferenceSource,
    SessionError, User,
};
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

impl From<ApiClientError> for FetchError {
    fn from(err: ApiClientError) -> Self {
        match err {
            ApiClientError::Http(e) => match e.status() {
                Some(status) => FetchError::Status {
                    status: status.as_u16(),
                },
                None => FetchError::Transport {
                    reason: e.to_string(),
                },
            },
            ApiClientError::Status { status, .. } => FetchError::Status { status },
            ApiClientError::Rejected(message) => FetchError::Rejected { message },
            ApiClientError::Serde(e) => FetchError::InvalidPayload {
                reason: e.to_string(),
            },
            ApiClientError::InvalidResponse(reason) => FetchError::InvalidPayload { reason },
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

impl Envelope {
    fn into_data<T: DeserializeOwned>(self) -> Result<T, ApiClientError> {
        let data = self
            .data
            .ok_or_else(|| ApiClientError::InvalidResponse("missing data".to_string()))?;
        Ok(serde_json::from_value(data)?)
    }
}

/// A `getUsers` row: the user record plus the stored password.
#[derive(Deserialize)]
struct UserRow {
    #[serde(flatten)]
    user: User,
    #[serde(rename = "Password", default)]
    password: Value,
}

impl UserRow {
    /// Sheet cells holding digits come back as JSON numbers, so compare
    /// on the textual form.
    fn password_matches(&self, candidate: &str) -> bool {
        match &self.password {
            Value::String(stored) => stored == candidate,
            Value::Number(stored) => stored.to_string() == candidate,
            _ => false,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest<'a> {
    action: &'static str,
    username: &'a str,
    full_name: &'a str,
    new_password: &'a str,
    #[serde(rename = "profilePictureURL")]
    profile_picture_url: &'a str,
}

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        Self::with_base_url(
            &config.api_base_url,
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ApiClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Connectivity check. Succeeds only on a `pong` reply.
    pub async fn ping(&self) -> Result<(), ApiClientError> {
        let envelope = self.get_action("ping").await?;
        match envelope.message.as_deref() {
            Some("pong") => Ok(()),
            other => Err(ApiClientError::InvalidResponse(format!(
                "expected pong, got {:?}",
                other
            ))),
        }
    }

    /// All users, with stored passwords stripped.
    pub async fn fetch_users(&self) -> Result<Vec<User>, ApiClientError> {
        let rows = self.fetch_user_rows().await?;
        Ok(rows.into_iter().map(|row| row.user).collect())
    }

    /// Reference collections without the user list.
    pub async fn fetch_static_data(&self) -> Result<ReferenceData, ApiClientError> {
        self.get_action("getStaticData").await?.into_data()
    }

    /// Static data and users fetched concurrently and merged.
    ///
    /// Fails as a whole if either request fails.
    pub async fn load_reference_data(&self) -> Result<ReferenceData, ApiClientError> {
        let (data, users) = tokio::try_join!(self.fetch_static_data(), self.fetch_users())?;
        tracing::debug!(users = users.len(), "Fetched reference data");
        Ok(data.with_users(users))
    }

    /// Unfiltered dump of every sheet, for the admin dashboard.
    pub async fn fetch_admin_data(&self) -> Result<Value, ApiClientError> {
        self.get_action("getAllSheetDataForAdmin").await?.into_data()
    }

    /// Check `username` and `password` against the user sheet.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> OrderdeskResult<User> {
        let rows = self.fetch_user_rows().await.map_err(FetchError::from)?;
        let user = rows
            .into_iter()
            .find(|row| {
                row.user.username == username && row.password_matches(password.expose_secret())
            })
            .map(|row| row.user);

        match user {
            Some(user) => {
                tracing::info!(username, "Credentials accepted");
                Ok(user)
            }
            None => {
                tracing::warn!(username, "Credentials rejected");
                Err(SessionError::InvalidCredentials.into())
            }
        }
    }

    /// Submit a profile edit for `username`. Callers validate `update`.
    pub async fn submit_profile(
        &self,
        username: &str,
        update: &ProfileUpdate,
    ) -> Result<(), ApiClientError> {
        let body = serde_json::to_string(&UpdateProfileRequest {
            action: "updateUserProfile",
            username,
            full_name: &update.full_name,
            new_password: update.new_password.expose_secret(),
            profile_picture_url: &update.profile_picture_url,
        })?;

        let response = self
            .client
            .post(&self.base_url)
            .header(CONTENT_TYPE, "text/plain;charset=utf-8")
            .body(body)
            .send()
            .await?;
        self.parse_envelope(response).await?;
        tracing::info!(username, "Profile updated");
        Ok(())
    }

    async fn fetch_user_rows(&self) -> Result<Vec<UserRow>, ApiClientError> {
        self.get_action("getUsers").await?.into_data()
    }

    async fn get_action(&self, action: &str) -> Result<Envelope, ApiClientError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("action", action)])
            .send()
            .await?;
        self.parse_envelope(response).await
    }

    async fn parse_envelope(&self, response: reqwest::Response) -> Result<Envelope, ApiClientError> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        let envelope: Envelope = serde_json::from_str(&text)?;
        if envelope.status != "success" {
            let message = envelope
                .message
                .unwrap_or_else(|| format!("status {}", envelope.status));
            return Err(ApiClientError::Rejected(message));
        }
        Ok(envelope)
    }
}

#[async_trait]
impl ReferenceSource for RestClient {
    async fn fetch_reference_data(&self) -> Result<ReferenceData, FetchError> {
        Ok(self.load_reference_data().await?)
    }
}

#[async_trait]
impl ProfileSink for RestClient {
    async fn update_profile(
        &self,
        username: &str,
        update: &ProfileUpdate,
    ) -> Result<(), FetchError> {
        Ok(self.submit_profile(username, update).await?)
    }
}
