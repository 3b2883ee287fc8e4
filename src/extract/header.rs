//! Token extraction from an arbitrary header.

use crate::{extract::JwtFromRequest, Request};

/// Extract the raw value of header `name`.
///
/// Header names are case-insensitive in `http`. A header that is missing, empty or
/// not visible ASCII yields no token.
#[must_use]
pub fn from_header(name: impl Into<String>) -> JwtFromRequest {
    let name = name.into();
    JwtFromRequest::new(move |request| header_str(request, &name).map(str::to_owned))
}

pub(crate) fn header_str<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers().get(name)?.to_str().ok()
}

#[cfg(test)]
mod tests {
    use super::from_header;
    use crate::Body;

    #[test]
    fn reads_named_header() {
        let request = http::Request::builder()
            .header("x-api-token", "abc")
            .body(Body::empty())
            .unwrap();
        let token = from_header("x-api-token").extract(&request);
        assert_eq!(token.as_deref(), Some("abc"));
    }

    #[test]
    fn missing_or_empty_header_is_none() {
        let request = http::Request::builder()
            .header("x-api-token", "")
            .body(Body::empty())
            .unwrap();
        assert_eq!(from_header("x-api-token").extract(&request), None);
        assert_eq!(from_header("x-other").extract(&request), None);
    }

    #[test]
    fn invalid_header_name_is_none() {
        let request = http::Request::builder().body(Body::empty()).unwrap();
        assert_eq!(from_header("not a header").extract(&request), None);
    }

    #[test]
    fn opaque_header_value_is_none() {
        let request = http::Request::builder()
            .header("x-api-token", http::HeaderValue::from_bytes(b"\xfftoken").unwrap())
            .body(Body::empty())
            .unwrap();
        assert_eq!(from_header("x-api-token").extract(&request), None);
    }
}
