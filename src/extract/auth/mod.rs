//! `Authorization` header parsing.
//!
//! This module splits a `<scheme> <value>` header into its two parts and provides
//! the scheme-qualified extractors built on top of it.

mod bearer;

pub use bearer::{from_auth_header_as_bearer_token, from_auth_header_with_scheme};

/// The two halves of an `Authorization: <scheme> <value>` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthHeaderValue<'a> {
    /// The authentication scheme, for example `Bearer`.
    pub scheme: &'a str,
    /// The credential that followed the scheme.
    pub value: &'a str,
}

/// Parse a header of the form `<scheme> <value>`.
///
/// Leading whitespace is skipped. The scheme is the first run of non-whitespace
/// characters, and the value is the next run after at least one whitespace character.
/// Anything after the value is ignored. Returns `None` if there is no value.
///
/// ```rust
/// use jwt_strategy::extract::{parse_auth_header, AuthHeaderValue};
///
/// assert_eq!(
///     parse_auth_header("Bearer abc.def.ghi"),
///     Some(AuthHeaderValue { scheme: "Bearer", value: "abc.def.ghi" })
/// );
/// assert_eq!(parse_auth_header("Bearer"), None);
/// ```
#[must_use]
pub fn parse_auth_header(header: &str) -> Option<AuthHeaderValue<'_>> {
    let header = header.trim_start();
    let scheme_end = header.find(char::is_whitespace)?;
    let (scheme, rest) = header.split_at(scheme_end);

    let rest = rest.trim_start();
    let value_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let value = &rest[..value_end];

    if value.is_empty() {
        return None;
    }

    Some(AuthHeaderValue { scheme, value })
}
