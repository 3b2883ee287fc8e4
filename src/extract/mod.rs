//! Locate a raw JWT inside a request.
//!
//! Every constructor in this module returns a [`JwtFromRequest`], a cheap cloneable
//! function from a [`Request`] to an optional token string. Extractors never
//! interpret or validate what they find. Malformed input means "no token".
//!
//! # Example
//!
//! ```rust
//! use jwt_strategy::extract;
//!
//! // Look in the Authorization header first, then fall back to `?access_token=`.
//! let jwt_from_request = extract::from_extractors([
//!     extract::from_auth_header_as_bearer_token(),
//!     extract::from_url_query_parameter("access_token"),
//! ]);
//!
//! let request = http::Request::builder()
//!     .uri("http://localhost/feed?access_token=abc")
//!     .body(jwt_strategy::Body::empty())
//!     .unwrap();
//! assert_eq!(jwt_from_request.extract(&request).as_deref(), Some("abc"));
//! ```

mod auth;
mod body;
mod header;
mod query;

use std::{fmt, sync::Arc};

use crate::Request;

pub use auth::{
    from_auth_header_as_bearer_token, from_auth_header_with_scheme, parse_auth_header,
    AuthHeaderValue,
};
pub use body::{from_body_field, parse_body, BodyParseError, ParsedBody};
pub use header::from_header;
pub use query::from_url_query_parameter;

/// Name of the header read by the scheme-qualified extractors.
pub const AUTH_HEADER: &str = "authorization";

/// Scheme used by [`version_one_compatibility`] unless overridden.
pub const LEGACY_AUTH_SCHEME: &str = "JWT";

/// Scheme used by [`from_auth_header_as_bearer_token`].
pub const BEARER_AUTH_SCHEME: &str = "bearer";

/// Body field and query parameter used by [`version_one_compatibility`] unless overridden.
pub const LEGACY_TOKEN_FIELD: &str = "auth_token";

type ExtractFn = dyn Fn(&Request) -> Option<String> + Send + Sync;

/// A function that pulls a raw token out of a request.
#[derive(Clone)]
pub struct JwtFromRequest(Arc<ExtractFn>);

impl fmt::Debug for JwtFromRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JwtFromRequest")
    }
}

impl JwtFromRequest {
    /// Wrap a custom extraction function.
    ///
    /// ```rust
    /// use jwt_strategy::{extract::JwtFromRequest, header::COOKIE};
    ///
    /// let from_cookie = JwtFromRequest::new(|request| {
    ///     let cookies = request.headers().get(COOKIE)?.to_str().ok()?;
    ///     cookies
    ///         .split(';')
    ///         .filter_map(|pair| pair.trim().split_once('='))
    ///         .find(|(name, _)| *name == "jwt")
    ///         .map(|(_, value)| value.to_owned())
    /// });
    /// # let _ = from_cookie;
    /// ```
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Request) -> Option<String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Run the extractor. An empty string counts as no token.
    #[must_use]
    pub fn extract(&self, request: &Request) -> Option<String> {
        (self.0)(request).filter(|token| !token.is_empty())
    }
}

/// Try each extractor in order and return the first token found.
///
/// Later extractors are not run once one of them produces a token.
#[must_use]
pub fn from_extractors<I>(extractors: I) -> JwtFromRequest
where
    I: IntoIterator<Item = JwtFromRequest>,
{
    let extractors: Vec<JwtFromRequest> = extractors.into_iter().collect();
    JwtFromRequest::new(move |request| {
        extractors
            .iter()
            .find_map(|extractor| extractor.extract(request))
    })
}

/// Overrides for [`version_one_compatibility`].
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VersionOneOptions {
    /// Authorization scheme, `JWT` when unset.
    pub auth_scheme: Option<String>,
    /// Body field, `auth_token` when unset.
    pub token_body_field: Option<String>,
    /// Query parameter, `auth_token` when unset.
    pub token_query_parameter_name: Option<String>,
}

/// The extraction order of the 1.x releases.
///
/// Tries `Authorization: <scheme> <token>`, then the body field, then the query
/// parameter, stopping at the first hit.
#[must_use]
pub fn version_one_compatibility(options: VersionOneOptions) -> JwtFromRequest {
    let scheme = options
        .auth_scheme
        .unwrap_or_else(|| LEGACY_AUTH_SCHEME.to_owned());
    let body_field = options
        .token_body_field
        .unwrap_or_else(|| LEGACY_TOKEN_FIELD.to_owned());
    let query_param = options
        .token_query_parameter_name
        .unwrap_or_else(|| LEGACY_TOKEN_FIELD.to_owned());

    from_extractors([
        from_auth_header_with_scheme(&scheme),
        from_body_field(body_field),
        from_url_query_parameter(query_param),
    ])
}
