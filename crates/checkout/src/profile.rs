//! User-profile address API client.
//!
//! The delivery backend owns the user's saved address. Checkout reads it once
//! per session and may write a newly entered address back:
//!
//! - `GET /users/{id}/address` - saved address, `404` when none exists
//! - `PUT /users/{id}/address` - replace the saved address
//! - `DELETE /users/{id}/address` - forget the saved address

use delivery_core::{AddressForm, StructuredAddress, UserId};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::{ApiConfig, bearer_value};

/// Errors that can occur when talking to the profile API.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configured bearer token cannot be sent as a header.
    #[error("Invalid API token: {0}")]
    InvalidToken(String),

    /// Endpoint URL could not be built from the base URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Address as stored on the user's profile.
///
/// Older profiles hold a free-text address instead of the structured form;
/// both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SavedAddress {
    Structured(AddressForm),
    Text(String),
}

impl SavedAddress {
    /// Render the saved address as a delivery line.
    #[must_use]
    pub fn display_line(&self) -> String {
        match self {
            Self::Structured(form) => form.display_line(),
            Self::Text(text) => text.trim().to_string(),
        }
    }
}

/// Body of the API's `{ "message": ... }` responses.
#[derive(Debug, Default, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: String,
}

/// Client for the user-profile address endpoints.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ProfileClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ProfileClient {
    /// Create a new profile API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ProfileError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&bearer_value(token))
                .map_err(|e| ProfileError::InvalidToken(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn address_url(&self, user_id: UserId) -> Result<Url, ProfileError> {
        Ok(self.base_url.join(&format!("users/{user_id}/address"))?)
    }

    /// Fetch the user's saved address.
    ///
    /// Returns `None` when the API answers `404`, an empty body, `null`, or an
    /// address that renders blank.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body cannot be parsed.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_address(&self, user_id: UserId) -> Result<Option<SavedAddress>, ProfileError> {
        let url = self.address_url(user_id)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            tracing::debug!("No saved address");
            return Ok(None);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProfileError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let saved: Option<SavedAddress> =
            serde_json::from_str(&body).map_err(|e| ProfileError::Parse(e.to_string()))?;

        Ok(saved.filter(|address| !address.display_line().is_empty()))
    }

    /// Replace the user's saved address.
    ///
    /// Returns the server's confirmation message (empty if it sent none).
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects the address.
    #[instrument(skip(self, address), fields(user_id = %user_id))]
    pub async fn update_address(
        &self,
        user_id: UserId,
        address: &StructuredAddress,
    ) -> Result<String, ProfileError> {
        let url = self.address_url(user_id)?;

        let response = self.client.put(url).json(address).send().await?;
        Self::read_message(response).await
    }

    /// Delete the user's saved address.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn delete_address(&self, user_id: UserId) -> Result<String, ProfileError> {
        let url = self.address_url(user_id)?;

        let response = self.client.delete(url).send().await?;
        Self::read_message(response).await
    }

    async fn read_message(response: reqwest::Response) -> Result<String, ProfileError> {
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProfileError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(String::new());
        }

        let parsed: MessageResponse =
            serde_json::from_str(&body).map_err(|e| ProfileError::Parse(e.to_string()))?;
        Ok(parsed.message)
    }
}
