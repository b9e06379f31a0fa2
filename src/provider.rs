//! SMS-provisioning API client
//!
//! Wraps the provider's two read endpoints (list numbers, list messages for
//! one number) behind the [`SmsProvider`] trait. Every failure is reported
//! through [`ProviderError`] so callers decide their own fallback instead of
//! receiving a silently empty list.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::config::Settings;

/// Errors that can occur while talking to the SMS-provisioning API
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Error during network communication
    #[error("Network error: {0}")]
    Network(String),
    /// Non-success status returned by the provider's API
    #[error("API error: {0}")]
    Api(String),
    /// Response body that was not the expected JSON shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A phone number provisioned on the account
#[derive(Debug, Deserialize, Clone)]
pub struct PhoneNumber {
    /// Provider-assigned identifier, used to fetch the number's messages
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Display form of the number, if the provider returns one
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub phone_number: Option<String>,
    /// Provisioning status, e.g. "active"
    #[serde(default)]
    pub status: Option<String>,
}

/// One inbound SMS stored for a number
#[derive(Debug, Deserialize, Clone)]
pub struct SmsMessage {
    /// Message body
    pub message: String,
    /// Sender as reported by the provider, usually a service name
    #[serde(default)]
    pub sender: Option<String>,
    /// Delivery timestamp, usually RFC 3339
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Deserializes an identifier that some providers send as a JSON number
/// and others as a string.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(i64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeStringOrNumber {
        String(String),
        Number(i64),
        None,
    }

    Ok(match MaybeStringOrNumber::deserialize(deserializer)? {
        MaybeStringOrNumber::String(s) => Some(s),
        MaybeStringOrNumber::Number(n) => Some(n.to_string()),
        MaybeStringOrNumber::None => None,
    })
}

/// Read operations the bot needs from the SMS-provisioning service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsProvider: Send + Sync {
    /// Probes provider reachability; used before each poll cycle proceeds.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`SmsProvider::list_numbers`].
    async fn check_connection(&self) -> Result<(), ProviderError>;

    /// Lists all numbers provisioned on the account.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Network` on connectivity issues,
    /// `ProviderError::Api` on non-success status codes, or
    /// `ProviderError::InvalidResponse` if the body is not a JSON array.
    async fn list_numbers(&self) -> Result<Vec<PhoneNumber>, ProviderError>;

    /// Lists stored messages for one number.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`SmsProvider::list_numbers`].
    async fn list_messages(&self, number_id: &str) -> Result<Vec<SmsMessage>, ProviderError>;
}

/// HTTP implementation of [`SmsProvider`]
pub struct SmsApiClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl SmsApiClient {
    /// Create a new client from settings.
    ///
    /// Applies the configured request timeout so a slow provider cannot
    /// stall a poll cycle indefinitely.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let http = HttpClient::builder()
            .timeout(settings.sms_http_timeout())
            .build()
            .unwrap_or_else(|_| HttpClient::new());

        Self {
            http,
            base_url: settings.sms_api_base_url.trim_end_matches('/').to_string(),
            api_key: settings.sms_api_key.clone(),
        }
    }

    /// Sends an authenticated GET request and returns the parsed JSON body.
    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ProviderError> {
        let url = format!("{}{path}", self.base_url);

        let mut request = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(clean_error_body(status, &error_text)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        // Detect HTML error pages from Nginx/proxies
        if looks_like_html(&body) {
            return Err(ProviderError::InvalidResponse(
                "server returned an HTML page where JSON was expected".to_string(),
            ));
        }

        let value: Value =
            serde_json::from_str(&body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if !value.is_array() && !value.is_object() {
            return Err(ProviderError::InvalidResponse(format!(
                "expected a JSON array or object, got: {value}"
            )));
        }

        Ok(value)
    }
}

#[async_trait]
impl SmsProvider for SmsApiClient {
    async fn check_connection(&self) -> Result<(), ProviderError> {
        self.get_json("/numbers", &[]).await.map(|_| ())
    }

    async fn list_numbers(&self) -> Result<Vec<PhoneNumber>, ProviderError> {
        let value = self.get_json("/numbers", &[]).await?;
        parse_items(value, "number")
    }

    async fn list_messages(&self, number_id: &str) -> Result<Vec<SmsMessage>, ProviderError> {
        let value = self
            .get_json("/messages", &[("number_id", number_id)])
            .await?;
        parse_items(value, "message")
    }
}

/// Parses a JSON array into items, skipping entries that fail to
/// deserialize so one malformed record cannot poison a whole page.
fn parse_items<T: DeserializeOwned>(value: Value, what: &str) -> Result<Vec<T>, ProviderError> {
    let Value::Array(items) = value else {
        return Err(ProviderError::InvalidResponse(format!(
            "expected a JSON array of {what} entries"
        )));
    };

    let mut parsed = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<T>(item) {
            Ok(v) => parsed.push(v),
            Err(e) => warn!("Skipping malformed {what} entry: {e}"),
        }
    }

    Ok(parsed)
}

fn looks_like_html(body: &str) -> bool {
    let trimmed = body.trim_start();
    trimmed.starts_with("<!DOCTYPE") || trimmed.starts_with("<html") || trimmed.starts_with("<HTML")
}

/// Builds an error message from a non-success response without leaking
/// raw HTML or unbounded bodies into logs.
fn clean_error_body(status: reqwest::StatusCode, body: &str) -> String {
    if looks_like_html(body) {
        return format!("{status} (server returned HTML error page)");
    }

    if body.len() > 500 {
        let truncated: String = body.chars().take(500).collect();
        format!("{status} - {truncated}... (truncated)")
    } else {
        format!("{status} - {body}")
    }
}
