//! Building and sending a single API call.
//!
//! A [`RequestBuilder`] collects the URL, method, parameters and attachments
//! of one call. [`RequestBuilder::send`] picks the encoding, asks the
//! [`Provider`] for an authenticated request, sends it once and classifies
//! the outcome.

use crate::{
    param::{encode_form, filter_falsy, flatten},
    provider::{Provider, RequestBody, RequestOptions},
    ApiError, AttachmentPart, Error, Param, Parameters, Result,
};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method};
use reqwest::multipart::Form;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How the parameters of a request end up on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Bare,
    Query,
    Multipart,
    UrlEncoded,
}

impl Encoding {
    fn as_str(&self) -> &'static str {
        match self {
            Encoding::Bare => "none",
            Encoding::Query => "query",
            Encoding::Multipart => "multipart",
            Encoding::UrlEncoded => "urlencoded",
        }
    }
}

/// A pending API call.
///
/// Created with [`crate::Api::new_request`] (or [`RequestBuilder::new`]),
/// configured through the fluent setters and consumed by [`send`](Self::send).
///
/// # Examples
///
/// ```no_run
/// use deviantart::{Api, AttachmentPart};
/// use http::Method;
///
/// # async fn example() -> Result<(), deviantart::Error> {
/// let api = Api::builder().access_token("token").build()?;
///
/// let space = api
///     .new_request()
///     .set_url(api.endpoint(&["stash", "space"]))
///     .set_parameter("mature_content", Some(true))
///     .send()
///     .await?;
/// println!("Available: {}", space["available_space"]);
///
/// let submitted = api
///     .new_request()
///     .set_url(api.endpoint(&["stash", "submit"]))
///     .set_method(Method::POST)
///     .set_parameter("title", "Sunset")
///     .set_parameter("tags", vec!["sky", "sea"])
///     .add_part(AttachmentPart::from_file("file", "sunset.png").await?)
///     .send()
///     .await?;
/// println!("Item id: {}", submitted["itemid"]);
/// # Ok(())
/// # }
/// ```
pub struct RequestBuilder {
    provider: Arc<dyn Provider>,
    method: Method,
    url: String,
    parameters: Parameters,
    parts: Vec<AttachmentPart>,
}

impl RequestBuilder {
    /// Creates an empty `GET` request bound to `provider`.
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            method: Method::GET,
            url: String::new(),
            parameters: Parameters::new(),
            parts: Vec::new(),
        }
    }

    /// Sets the HTTP method.
    pub fn set_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request URL, without query string. Stored verbatim.
    pub fn set_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets a single parameter, replacing any previous value for `key`.
    pub fn set_parameter(mut self, key: impl Into<String>, value: impl Into<Param>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Replaces all parameters.
    pub fn set_parameters<K, V>(mut self, parameters: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Param>,
    {
        self.parameters = parameters
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Appends an attachment.
    pub fn add_part(mut self, part: AttachmentPart) -> Self {
        self.parts.push(part);
        self
    }

    /// Replaces all attachments.
    pub fn set_parts(mut self, parts: Vec<AttachmentPart>) -> Self {
        self.parts = parts;
        self
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the URL as set, without query string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the value of a parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterNotFound`] if `key` was never set.
    pub fn parameter(&self, key: &str) -> Result<&Param> {
        self.parameters
            .get(key)
            .ok_or_else(|| Error::ParameterNotFound(key.to_string()))
    }

    /// Returns all parameters, unfiltered.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Returns the attachments in send order.
    pub fn parts(&self) -> &[AttachmentPart] {
        &self.parts
    }

    /// Returns the provider the request is sent through.
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Sends the request and returns the decoded JSON body.
    ///
    /// Parameters whose value is falsy (see [`Param::is_falsy`]) are left out.
    /// The rest are sent as a query string for `GET`, as a multipart body
    /// when attachments are present, and as a urlencoded body otherwise.
    /// A multipart body is always sent with `POST`, whatever method was set.
    /// Attachments are only sent when at least one parameter survives.
    ///
    /// # Errors
    ///
    /// - [`Error::Api`] if the API answered with a non-2xx status.
    /// - [`Error::Transport`] if no response was received.
    /// - [`Error::DeserializationFailed`] if a success body is not JSON.
    pub async fn send(self) -> Result<Value> {
        let RequestBuilder {
            provider,
            mut method,
            mut url,
            parameters,
            parts,
        } = self;

        let token = provider.token();
        let parameters = filter_falsy(&parameters);
        let mut options = RequestOptions::default();

        let encoding = if parameters.is_empty() {
            Encoding::Bare
        } else if method == Method::GET {
            Encoding::Query
        } else if !parts.is_empty() {
            Encoding::Multipart
        } else {
            Encoding::UrlEncoded
        };

        match encoding {
            Encoding::Bare => {
                if !parts.is_empty() {
                    tracing::warn!(
                        parts = parts.len(),
                        url = %url,
                        "No parameters set, attachments will not be sent"
                    );
                }
            }
            Encoding::Query => {
                url.push('?');
                url.push_str(&encode_form(&parameters));
            }
            Encoding::Multipart => {
                if method != Method::POST {
                    tracing::debug!(method = %method, "Multipart body forces POST");
                    method = Method::POST;
                }
                let form = build_multipart(&parameters, &token, parts);
                let content_type = format!("multipart/form-data; boundary={}", form.boundary());
                let content_type = HeaderValue::from_str(&content_type).map_err(|e| {
                    Error::ConfigurationError(format!("Invalid header value: {}", e))
                })?;
                options.headers.insert(CONTENT_TYPE, content_type);
                options.body = Some(RequestBody::Multipart(form));
            }
            Encoding::UrlEncoded => {
                options.headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                );
                options.body = Some(RequestBody::Form(encode_form(&parameters)));
            }
        }

        tracing::debug!(
            method = %method,
            url = %url,
            encoding = encoding.as_str(),
            "Executing API request"
        );

        let request = provider.authenticated_request(method.clone(), &url, &token, options)?;

        let start_time = Instant::now();
        let response = match provider.http_client().execute(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    method = %method,
                    url = %url,
                    "Request failed without a response"
                );
                return Err(Error::Transport(e));
            }
        };

        parse_response(response, start_time.elapsed()).await
    }
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("parameters", &self.parameters)
            .field("parts", &self.parts)
            .finish()
    }
}

/// Builds the multipart body: parameters, then `access_token`, then attachments.
fn build_multipart(parameters: &Parameters, token: &str, parts: Vec<AttachmentPart>) -> Form {
    let mut form = Form::new();

    let fields = flatten(parameters)
        .into_iter()
        .map(|(name, value)| AttachmentPart::from_value(name, value))
        .chain(std::iter::once(AttachmentPart::from_value(
            "access_token",
            token.to_string(),
        )))
        .chain(parts);

    for part in fields {
        let (name, part) = part.into_form_part();
        form = form.part(name, part);
    }

    form
}

/// Classifies the response and decodes its JSON body.
async fn parse_response(response: reqwest::Response, latency: Duration) -> Result<Value> {
    let status = response.status();

    tracing::info!(
        status = status.as_u16(),
        latency_ms = latency.as_millis(),
        "Received HTTP response"
    );

    if !status.is_success() {
        let raw_response = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(
                    status = status.as_u16(),
                    error = %e,
                    "Failed to read error response body"
                );
                String::new()
            }
        };

        if status.is_client_error() {
            tracing::error!(
                status = status.as_u16(),
                response = %raw_response,
                "Client error (4xx)"
            );
        } else if status.is_server_error() {
            tracing::warn!(
                status = status.as_u16(),
                response = %raw_response,
                "Server error (5xx)"
            );
        }

        return Err(Error::Api(ApiError::from_response(
            status.as_u16(),
            &raw_response,
        )));
    }

    let raw_body = response.text().await?;

    match serde_json::from_str::<Value>(&raw_body) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::error!(
                error = %e,
                raw_response = %raw_body,
                "Failed to deserialize response"
            );

            Err(Error::DeserializationFailed {
                raw_response: raw_body,
                serde_error: e.to_string(),
                status,
            })
        }
    }
}
