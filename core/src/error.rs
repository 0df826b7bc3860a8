//! Error types for the Guacamole API client.
//!
//! # Design
//! Every failure an operation can hit lands in one `ApiError`, and every
//! variant carries the URL that was requested. Decode failures get their own
//! variant so callers can tell "the server answered with garbage" apart from
//! "the request did not succeed". Status errors, transport errors and missing
//! fields share `Request`, with the cause in `reason`.

use thiserror::Error;

use crate::endpoint::Endpoint;

/// Maximum number of body bytes quoted in a status error.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Errors returned by `GuacamoleClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The response body was not the JSON the endpoint promises.
    #[error("API returned invalid JSON when trying to {endpoint} from {url}: {source}")]
    InvalidJson {
        endpoint: Endpoint,
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The request failed: transport error, non-2xx status or a missing field.
    #[error("Could not {endpoint} from {url}: {reason}")]
    Request {
        endpoint: Endpoint,
        url: String,
        reason: String,
    },

    /// No connection group carries the requested name.
    #[error("Could not find the identifier for connection group {name} at {url}. Does the group exist?")]
    GroupNotFound { name: String, url: String },
}

impl ApiError {
    pub(crate) fn request(endpoint: Endpoint, url: &str, reason: impl Into<String>) -> Self {
        ApiError::Request {
            endpoint,
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn status(endpoint: Endpoint, url: &str, status: u16, body: &str) -> Self {
        let reason = if body.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {}", truncate_body(body))
        };
        Self::request(endpoint, url, reason)
    }

    /// The URL of the request that failed.
    pub fn url(&self) -> &str {
        match self {
            ApiError::InvalidJson { url, .. }
            | ApiError::Request { url, .. }
            | ApiError::GroupNotFound { url, .. } => url,
        }
    }

    /// The failure without the URL, which carries the session token.
    pub(crate) fn cause(&self) -> String {
        match self {
            ApiError::InvalidJson { source, .. } => format!("invalid JSON: {source}"),
            ApiError::Request { reason, .. } => reason.clone(),
            ApiError::GroupNotFound { name, .. } => format!("no connection group named {name}"),
        }
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes)", &body[..end], body.len())
}
