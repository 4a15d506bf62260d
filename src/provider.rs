//! Credential providers that turn a prepared call into an authenticated request.
//!
//! A [`Provider`] owns the access token and the HTTP client. The request
//! pipeline asks it for the current token, hands it the encoded body and
//! headers, and sends the resulting request through its client.

use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use reqwest::multipart::Form;
use std::sync::RwLock;
use std::time::Duration;
use url::Url;

/// The body of an outbound request.
#[derive(Debug)]
pub enum RequestBody {
    /// An `application/x-www-form-urlencoded` body.
    Form(String),
    /// A `multipart/form-data` body.
    Multipart(Form),
}

/// Body and headers computed for one request.
#[derive(Debug, Default)]
pub struct RequestOptions {
    /// The request body, if any.
    pub body: Option<RequestBody>,
    /// Headers describing the body, e.g. `Content-Type`.
    pub headers: HeaderMap,
}

/// Supplies the access token and mints authenticated requests.
///
/// Implement this to plug in a different OAuth2 client, for example one that
/// refreshes tokens in the background. The token is read once per request.
pub trait Provider: Send + Sync {
    /// Returns the current access token.
    fn token(&self) -> String;

    /// Returns the HTTP client used to transmit requests.
    fn http_client(&self) -> &reqwest::Client;

    /// Builds an authenticated request.
    ///
    /// Headers in `options` replace any header of the same name set by the
    /// provider.
    fn authenticated_request(
        &self,
        method: Method,
        url: &str,
        token: &str,
        options: RequestOptions,
    ) -> Result<reqwest::Request>;
}

/// A provider that sends the token as an `Authorization: Bearer` header.
///
/// The token can be replaced at any time with [`BearerProvider::set_token`],
/// e.g. after a refresh. Requests already sent keep the token they were
/// built with.
///
/// # Examples
///
/// ```
/// use deviantart::{Api, BearerProvider};
/// use std::sync::Arc;
///
/// # fn example() -> Result<(), deviantart::Error> {
/// let provider = Arc::new(BearerProvider::new("old-token")?);
/// let api = Api::new(provider.clone());
///
/// provider.set_token("new-token");
/// # Ok(())
/// # }
/// ```
pub struct BearerProvider {
    http_client: reqwest::Client,
    token: RwLock<String>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl BearerProvider {
    /// Creates a provider with a default HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self::with_client(http_client, token))
    }

    /// Creates a provider around an existing HTTP client.
    pub fn with_client(http_client: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            http_client,
            token: RwLock::new(token.into()),
            default_headers: HeaderMap::new(),
            timeout: None,
        }
    }

    /// Adds a header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    pub(crate) fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers.extend(headers);
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replaces the access token used by subsequent requests.
    pub fn set_token(&self, token: impl Into<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token.into();
    }
}

impl Provider for BearerProvider {
    fn token(&self) -> String {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    fn authenticated_request(
        &self,
        method: Method,
        url: &str,
        token: &str,
        options: RequestOptions,
    ) -> Result<reqwest::Request> {
        let url = Url::parse(url)?;
        let mut request = self.http_client.request(method, url).bearer_auth(token);

        for (name, value) in &self.default_headers {
            request = request.header(name, value);
        }

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        request = match options.body {
            Some(RequestBody::Form(body)) => request.body(body),
            Some(RequestBody::Multipart(form)) => request.multipart(form),
            None => request,
        };

        Ok(request.headers(options.headers).build()?)
    }
}

impl std::fmt::Debug for BearerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerProvider")
            .field("token", &"<redacted>")
            .field("default_headers", &self.default_headers)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};

    #[test]
    fn test_bearer_header_and_options() {
        let provider = BearerProvider::new("TOKEN")
            .unwrap()
            .default_header("User-Agent", "test-agent")
            .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        let options = RequestOptions {
            body: Some(RequestBody::Form("foo=bar".to_string())),
            headers,
        };

        let token = provider.token();
        let request = provider
            .authenticated_request(
                Method::POST,
                "http://example.com/stash/submit",
                &token,
                options,
            )
            .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.url().as_str(), "http://example.com/stash/submit");
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer TOKEN");
        assert_eq!(request.headers()[USER_AGENT], "test-agent");
        assert_eq!(
            request.headers()[CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, b"foo=bar");
    }

    #[test]
    fn test_multipart_content_type_is_not_duplicated() {
        let provider = BearerProvider::new("TOKEN").unwrap();
        let form = Form::new().text("foo", "bar");

        let mut headers = HeaderMap::new();
        let content_type = format!("multipart/form-data; boundary={}", form.boundary());
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(&content_type).unwrap());
        let options = RequestOptions {
            body: Some(RequestBody::Multipart(form)),
            headers,
        };

        let request = provider
            .authenticated_request(Method::POST, "http://example.com", "TOKEN", options)
            .unwrap();

        let values: Vec<_> = request.headers().get_all(CONTENT_TYPE).iter().collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0], content_type.as_str());
    }

    #[test]
    fn test_set_token() {
        let provider = BearerProvider::new("old").unwrap();
        provider.set_token("new");
        assert_eq!(provider.token(), "new");
    }

    #[test]
    fn test_invalid_url() {
        let provider = BearerProvider::new("TOKEN").unwrap();
        let result = provider.authenticated_request(
            Method::GET,
            "not a url",
            "TOKEN",
            RequestOptions::default(),
        );
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_invalid_default_header() {
        let result = BearerProvider::new("TOKEN")
            .unwrap()
            .default_header("Bad Header", "value");
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_debug_redacts_token() {
        let provider = BearerProvider::new("secret").unwrap();
        assert!(!format!("{:?}", provider).contains("secret"));
    }
}
