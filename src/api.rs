//! The API entry point.
//!
//! [`Api`] holds the shared credential provider and hands out fresh
//! [`RequestBuilder`]s bound to it. Use [`ApiBuilder`] to configure it.

use crate::{provider::BearerProvider, Error, Provider, RequestBuilder, Result};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Base URL of the DeviantArt OAuth2 API.
pub const API_URL: &str = "https://www.deviantart.com/api/v1/oauth2";

/// An OAuth2 scope that can be requested during authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    User,
    UserManage,
    Browse,
    MoreLikeThis,
    Gallery,
    Collection,
    CommentPost,
    Feed,
    Message,
    Note,
    Stash,
    Publish,
}

impl Scope {
    /// Returns the wire name of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::UserManage => "user.manage",
            Scope::Browse => "browse",
            Scope::MoreLikeThis => "browse.mlt",
            Scope::Gallery => "gallery",
            Scope::Collection => "collection",
            Scope::CommentPost => "comment.post",
            Scope::Feed => "feed",
            Scope::Message => "message",
            Scope::Note => "note",
            Scope::Stash => "stash",
            Scope::Publish => "publish",
        }
    }

    /// Joins scopes into the space separated form used in authorization URLs.
    ///
    /// ```
    /// use deviantart::Scope;
    ///
    /// assert_eq!(Scope::join(&[Scope::User, Scope::Stash]), "user stash");
    /// ```
    pub fn join(scopes: &[Scope]) -> String {
        scopes
            .iter()
            .map(Scope::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry point for API calls.
///
/// Cheap to clone; all clones share the same provider.
///
/// # Examples
///
/// ```no_run
/// use deviantart::Api;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), deviantart::Error> {
/// let api = Api::builder()
///     .access_token("token")
///     .timeout(Duration::from_secs(30))
///     .user_agent("my-app/1.0")?
///     .build()?;
///
/// let whoami = api
///     .new_request()
///     .set_url(api.endpoint(&["user", "whoami"]))
///     .send()
///     .await?;
/// println!("Hello, {}", whoami["username"]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Api {
    inner: Arc<ApiInner>,
}

struct ApiInner {
    base_url: String,
    provider: Arc<dyn Provider>,
}

impl Api {
    /// Creates a new `ApiBuilder` for configuring the API.
    pub fn builder() -> ApiBuilder {
        ApiBuilder::new()
    }

    /// Creates an API against [`API_URL`] using `provider`.
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            inner: Arc::new(ApiInner {
                base_url: API_URL.to_string(),
                provider,
            }),
        }
    }

    /// Returns the base URL endpoints are built from.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Returns the shared credential provider.
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.inner.provider
    }

    /// Creates a fresh request bound to this API's provider.
    pub fn new_request(&self) -> RequestBuilder {
        RequestBuilder::new(Arc::clone(&self.inner.provider))
    }

    /// Builds an endpoint URL of the form `{base_url}/{resource}/{action}[/{id}]`.
    ///
    /// Segments are joined verbatim.
    ///
    /// ```
    /// # fn example() -> Result<(), deviantart::Error> {
    /// let api = deviantart::Api::builder().access_token("token").build()?;
    /// assert_eq!(
    ///     api.endpoint(&["gallery", "folders"]),
    ///     "https://www.deviantart.com/api/v1/oauth2/gallery/folders"
    /// );
    /// # Ok(())
    /// # }
    /// ```
    pub fn endpoint(&self, segments: &[&str]) -> String {
        let mut url = self.inner.base_url.trim_end_matches('/').to_string();
        for segment in segments {
            url.push('/');
            url.push_str(segment.trim_matches('/'));
        }
        url
    }
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring and creating an [`Api`].
///
/// Either an access token or a custom [`Provider`] is required.
///
/// # Examples
///
/// ```no_run
/// use deviantart::ApiBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), deviantart::Error> {
/// let api = ApiBuilder::new()
///     .base_url("https://www.deviantart.com/api/v1/oauth2")?
///     .access_token("token")
///     .timeout(Duration::from_secs(30))
///     .default_header("dA-minor-version", "20210526")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ApiBuilder {
    base_url: Option<Url>,
    access_token: Option<String>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    provider: Option<Arc<dyn Provider>>,
}

impl ApiBuilder {
    /// Creates a new `ApiBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            access_token: None,
            default_headers: HeaderMap::new(),
            timeout: None,
            provider: None,
        }
    }

    /// Sets the base URL for all endpoints. Defaults to [`API_URL`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Sets the access token for the default bearer provider.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// Ignored when a custom provider is set.
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

    /// Sets the `User-Agent` header.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid header value.
    pub fn user_agent(self, user_agent: impl AsRef<str>) -> Result<Self> {
        self.default_header("User-Agent", user_agent)
    }

    /// Sets the request timeout.
    ///
    /// Ignored when a custom provider is set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Uses a custom credential provider instead of the default bearer one.
    pub fn provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Builds the configured `Api`.
    ///
    /// # Errors
    ///
    /// Returns an error if neither an access token nor a provider was given,
    /// or if the HTTP client cannot be built.
    pub fn build(self) -> Result<Api> {
        let base_url = self
            .base_url
            .map(|url| url.to_string())
            .unwrap_or_else(|| API_URL.to_string());

        let provider = match self.provider {
            Some(provider) => provider,
            None => {
                let token = self.access_token.ok_or_else(|| {
                    Error::ConfigurationError("Access token or provider is required".to_string())
                })?;

                let mut provider =
                    BearerProvider::new(token)?.with_default_headers(self.default_headers);
                if let Some(timeout) = self.timeout {
                    provider = provider.timeout(timeout);
                }
                Arc::new(provider) as Arc<dyn Provider>
            }
        };

        Ok(Api {
            inner: Arc::new(ApiInner { base_url, provider }),
        })
    }
}

impl Default for ApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}
