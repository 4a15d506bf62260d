//! Error types for API calls.
//!
//! Failures that came with an HTTP response are classified into an
//! [`ApiError`] from the JSON error envelope the API returns. Failures without
//! a response (connection refused, DNS, timeouts) are passed through as
//! [`Error::Transport`] unchanged.

use http::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;

/// The main error type for API calls.
///
/// # Examples
///
/// ```no_run
/// use deviantart::{Api, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let api = Api::builder().access_token("token").build()?;
/// let request = api
///     .new_request()
///     .set_url(api.endpoint(&["user", "whoami"]));
///
/// match request.send().await {
///     Ok(value) => println!("Logged in as {}", value["username"]),
///     Err(Error::Api(e)) if e.is_rate_limited() => eprintln!("Slow down: {}", e),
///     Err(Error::Api(e)) if e.is_unauthorized() => eprintln!("Token rejected: {}", e),
///     Err(Error::Transport(e)) => eprintln!("Could not reach the API: {}", e),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The API rejected the request with a non-2xx response.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request failed without a response (connection failed, DNS lookup
    /// failed, timed out, etc.).
    ///
    /// This wraps the underlying `reqwest::Error` unchanged.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success response body could not be parsed as JSON.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// A parameter was read that was never set.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// Invalid configuration was provided, such as an invalid header value
    /// or a missing access token.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// An attachment could not be opened.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api(e) => StatusCode::from_u16(e.http_status()).ok(),
            Error::DeserializationFailed { status, .. } => Some(*status),
            Error::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::Api(e) => Some(e.raw_response()),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns the classified API error, if this is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e),
            _ => None,
        }
    }
}

/// A specialized `Result` type for API calls.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types the API documents.
pub mod types {
    /// The request has missing or invalid parameters.
    pub const INVALID_REQUEST: &str = "invalid_request";
    /// The access token is missing, expired or lacks a scope.
    pub const UNAUTHORIZED: &str = "unauthorized";
    /// The user account has not been verified.
    pub const UNVERIFIED_ACCOUNT: &str = "unverified_account";
    /// The API failed internally.
    pub const SERVER_ERROR: &str = "server_error";
    /// The requested API version is not supported.
    pub const VERSION_ERROR: &str = "version_error";
}

#[derive(Deserialize, Default)]
struct ErrorEnvelope {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
    #[serde(default)]
    error_code: Option<serde_json::Value>,
    #[serde(default)]
    error_details: Option<BTreeMap<String, serde_json::Value>>,
}

/// A classified error returned by the API.
///
/// The message reads `"{error}: {error_description}"`, followed by
/// `" ({error_code})"` when the response carried a code. A failed response
/// whose body is not a JSON error envelope still produces an `ApiError`,
/// with empty type and description and the body kept in
/// [`raw_response`](Self::raw_response).
///
/// # Examples
///
/// ```no_run
/// use deviantart::{Api, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let api = Api::builder().access_token("token").build()?;
/// let result = api
///     .new_request()
///     .set_url(api.endpoint(&["gallery", "all"]))
///     .set_parameter("offset", -1)
///     .send()
///     .await;
///
/// if let Err(Error::Api(e)) = result {
///     if e.is_invalid_request() {
///         eprintln!("{} (code {})", e, e.error_code());
///         for (field, problem) in e.details() {
///             eprintln!("  {}: {}", field, problem);
///         }
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ApiError {
    http_status: u16,
    error_type: String,
    description: String,
    error_code: Option<i64>,
    details: BTreeMap<String, String>,
    message: String,
    raw_response: String,
}

impl ApiError {
    /// Builds the error for a failed response from its status and body.
    ///
    /// Bodies that are not a JSON error envelope leave type, description,
    /// code and details empty.
    pub(crate) fn from_response(http_status: u16, body: &str) -> Self {
        let envelope = match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(
                    status = http_status,
                    error = %e,
                    "Error response is not a JSON envelope"
                );
                ErrorEnvelope::default()
            }
        };

        let error_code = envelope.error_code.as_ref().and_then(|code| match code {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        });

        let mut message = format!("{}: {}", envelope.error, envelope.error_description);
        if let Some(code) = &envelope.error_code {
            match code {
                serde_json::Value::String(s) => message.push_str(&format!(" ({})", s)),
                serde_json::Value::Null => {}
                other => message.push_str(&format!(" ({})", other)),
            }
        }

        let details = envelope
            .error_details
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(s) => (key, s),
                other => (key, other.to_string()),
            })
            .collect();

        Self {
            http_status,
            error_type: envelope.error,
            description: envelope.error_description,
            error_code,
            details,
            message,
            raw_response: body.to_string(),
        }
    }

    /// Returns the HTTP status code of the failed response.
    pub fn http_status(&self) -> u16 {
        self.http_status
    }

    /// Returns the machine error type, e.g. `"invalid_request"`.
    pub fn error_type(&self) -> &str {
        &self.error_type
    }

    /// Returns the human readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the numeric sub-code, or `0` when the response had none.
    pub fn error_code(&self) -> i64 {
        self.error_code.unwrap_or(0)
    }

    /// Returns the per-field details, empty when the response had none.
    pub fn details(&self) -> &BTreeMap<String, String> {
        &self.details
    }

    /// Returns the formatted message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the response body exactly as received.
    pub fn raw_response(&self) -> &str {
        &self.raw_response
    }

    /// Returns `true` if the error type is exactly `error_type`.
    pub fn is(&self, error_type: &str) -> bool {
        self.error_type == error_type
    }

    /// Missing or invalid parameters.
    pub fn is_invalid_request(&self) -> bool {
        self.is(types::INVALID_REQUEST)
    }

    /// Missing, expired or insufficient access token.
    pub fn is_unauthorized(&self) -> bool {
        self.is(types::UNAUTHORIZED)
    }

    /// The account has not been verified.
    pub fn is_unverified_account(&self) -> bool {
        self.is(types::UNVERIFIED_ACCOUNT)
    }

    /// The API failed internally.
    pub fn is_server_error(&self) -> bool {
        self.is(types::SERVER_ERROR)
    }

    /// The requested API version is not supported.
    pub fn is_version_error(&self) -> bool {
        self.is(types::VERSION_ERROR)
    }

    /// Returns `true` if the API answered with `429 Too Many Requests`.
    ///
    /// Only the status code is checked; the error type is irrelevant.
    pub fn is_rate_limited(&self) -> bool {
        self.http_status == 429
    }
}
