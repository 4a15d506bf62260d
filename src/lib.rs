//! # deviantart - request pipeline for the DeviantArt REST API
//!
//! This crate builds, authenticates and sends calls against the DeviantArt
//! OAuth2 API on top of `reqwest`. It takes care of parameter encoding
//! (query string, urlencoded or multipart), attaches the access token, and
//! turns the API's JSON error envelope into a typed [`ApiError`].
//!
//! Responses are returned as untyped [`serde_json::Value`]s.
//!
//! ## Quick Start
//!
//! ```no_run
//! use deviantart::Api;
//! use http::Method;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), deviantart::Error> {
//!     let api = Api::builder().access_token("my-access-token").build()?;
//!
//!     // GET: parameters go into the query string
//!     let folders = api
//!         .new_request()
//!         .set_url(api.endpoint(&["gallery", "folders"]))
//!         .set_parameter("username", "alice")
//!         .set_parameter("offset", 0) // falsy, not sent
//!         .set_parameter("limit", 10)
//!         .send()
//!         .await?;
//!     println!("Folders: {}", folders["results"]);
//!
//!     // POST: parameters go into a urlencoded body
//!     let note = api
//!         .new_request()
//!         .set_url(api.endpoint(&["notes", "send"]))
//!         .set_method(Method::POST)
//!         .set_parameter("to", vec!["bob"])
//!         .set_parameter("subject", "Hi")
//!         .set_parameter("body", "Hello there")
//!         .send()
//!         .await?;
//!     println!("Sent: {}", note);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Parameter filtering
//!
//! Parameters whose value is `None`, `false`, `0`, `""` or an empty
//! collection are never sent. Optional endpoint arguments can be passed as
//! `Option<T>` and are dropped when `None`.
//!
//! ## Error Handling
//!
//! ```no_run
//! use deviantart::{Api, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! # let api = Api::builder().access_token("token").build()?;
//! match api.new_request().set_url(api.endpoint(&["user", "whoami"])).send().await {
//!     Ok(value) => println!("Success: {}", value),
//!     Err(Error::Api(e)) if e.is_rate_limited() => eprintln!("Rate limited: {}", e),
//!     Err(Error::Api(e)) => {
//!         eprintln!("API error {} ({}): {}", e.http_status(), e.error_type(), e.description());
//!         for (field, problem) in e.details() {
//!             eprintln!("  {}: {}", field, problem);
//!         }
//!     }
//!     Err(Error::Transport(e)) => eprintln!("No response: {}", e),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

mod api;
mod error;
mod param;
mod part;
pub mod provider;
mod request;

pub use api::{Api, ApiBuilder, Scope, API_URL};
pub use error::{types as error_types, ApiError, Error, Result};
pub use param::{Param, Parameters};
pub use part::{AttachmentPart, PartContent};
pub use provider::{BearerProvider, Provider, RequestBody, RequestOptions};
pub use request::RequestBuilder;
