//! Token extraction from a parsed request body.
//!
//! [`from_body_field`] reads from the [`ParsedBody`] request extension. Hosts that
//! already decode bodies can insert a [`ParsedBody`] themselves. Otherwise
//! [`parse_body`] does it for JSON and urlencoded form payloads.

use core::mem;

use serde_json::{Map, Value};

use crate::{
    extract::JwtFromRequest,
    header::{HeaderMap, CONTENT_TYPE},
    Body, Request,
};

/// A request body decoded into a field map, stored in the request extensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBody(pub Map<String, Value>);

impl_deref!(ParsedBody, Map<String, Value>);

impl From<Map<String, Value>> for ParsedBody {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for ParsedBody {
    type Error = BodyParseError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            _ => Err(BodyParseError::NotAnObject),
        }
    }
}

impl ParsedBody {
    fn from_form(data: &[u8]) -> Result<Self, BodyParseError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(data)?;
        let mut fields = Map::new();
        for (key, value) in pairs {
            fields.entry(key).or_insert(Value::String(value));
        }
        Ok(Self(fields))
    }
}

/// Errors raised by [`parse_body`].
#[derive(Debug, thiserror::Error)]
pub enum BodyParseError {
    /// The body stream could not be read.
    #[error("Failed to read request body")]
    Read,
    /// The body is not valid JSON.
    #[error("Failed to parse JSON body: {0}")]
    Json(#[from] serde_json::Error),
    /// The body is not valid form data.
    #[error("Failed to parse form data: {0}")]
    Form(#[from] serde_urlencoded::de::Error),
    /// The JSON body is not an object, so it has no fields.
    #[error("JSON body must be an object")]
    NotAnObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
}

fn body_kind(headers: &HeaderMap) -> Option<BodyKind> {
    let mime = headers
        .get(CONTENT_TYPE)?
        .to_str()
        .ok()?
        .split(';')
        .next()?
        .trim();

    if mime.eq_ignore_ascii_case("application/json") {
        Some(BodyKind::Json)
    } else if mime.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
        Some(BodyKind::Form)
    } else {
        None
    }
}

/// Decode a JSON or urlencoded form body into the [`ParsedBody`] extension.
///
/// The body bytes are put back into the request, so later handlers can still read
/// them. Returns `Ok(false)` and leaves the request untouched when the content type
/// is neither JSON nor form data. An empty body decodes to an empty field map.
///
/// # Errors
///
/// Returns [`BodyParseError`] if the body cannot be read or decoded.
pub async fn parse_body(request: &mut Request) -> Result<bool, BodyParseError> {
    let Some(kind) = body_kind(request.headers()) else {
        return Ok(false);
    };

    let body = mem::replace(request.body_mut(), Body::empty());
    let data = body.into_bytes().await.map_err(|_| BodyParseError::Read)?;
    *request.body_mut() = Body::from_bytes(data.to_vec());

    let parsed = if data.is_empty() {
        ParsedBody::default()
    } else {
        match kind {
            BodyKind::Json => ParsedBody::try_from(serde_json::from_slice::<Value>(&data)?)?,
            BodyKind::Form => ParsedBody::from_form(&data)?,
        }
    };

    request.extensions_mut().insert(parsed);
    Ok(true)
}

/// Extract the token from body field `name`.
///
/// Only string values count. A missing [`ParsedBody`], a missing field, or a
/// non-string field yields no token.
#[must_use]
pub fn from_body_field(name: impl Into<String>) -> JwtFromRequest {
    let name = name.into();
    JwtFromRequest::new(move |request| {
        request
            .extensions()
            .get::<ParsedBody>()?
            .get(&name)?
            .as_str()
            .map(str::to_owned)
    })
}
