//! Scheme-qualified token extraction from the `Authorization` header.

use super::parse_auth_header;
use crate::{
    extract::{header::header_str, JwtFromRequest, AUTH_HEADER, BEARER_AUTH_SCHEME},
    Request,
};

/// Extract the credential from `Authorization: <scheme> <token>`.
///
/// The scheme is compared case-insensitively. A missing or malformed header, or one
/// with a different scheme, yields no token.
#[must_use]
pub fn from_auth_header_with_scheme(scheme: &str) -> JwtFromRequest {
    let expected = scheme.to_lowercase();
    JwtFromRequest::new(move |request| token_with_scheme(request, &expected))
}

/// Extract the credential from `Authorization: Bearer <token>`.
#[must_use]
pub fn from_auth_header_as_bearer_token() -> JwtFromRequest {
    from_auth_header_with_scheme(BEARER_AUTH_SCHEME)
}

fn token_with_scheme(request: &Request, expected: &str) -> Option<String> {
    let header = header_str(request, AUTH_HEADER)?;
    let parsed = parse_auth_header(header)?;

    (parsed.scheme.to_lowercase() == expected).then(|| parsed.value.to_owned())
}
