use serde_urlencoded::from_str;

use crate::{extract::JwtFromRequest, Request};

/// Extract the token from query parameter `name`.
///
/// The first occurrence wins when the parameter is repeated. A query string that
/// cannot be decoded yields no token.
#[must_use]
pub fn from_url_query_parameter(name: impl Into<String>) -> JwtFromRequest {
    let name = name.into();
    JwtFromRequest::new(move |request| query_param(request, &name))
}

fn query_param(request: &Request, name: &str) -> Option<String> {
    let query = request.uri().query()?;
    let pairs: Vec<(String, String)> = from_str(query).ok()?;
    pairs
        .into_iter()
        .find_map(|(key, value)| (key == name).then_some(value))
}

#[cfg(test)]
mod tests {
    use super::from_url_query_parameter;
    use crate::{Body, Method};

    fn request(uri: &str) -> http_kit::Request {
        let mut request = http_kit::Request::new(Body::empty());
        *request.uri_mut() = uri.parse().expect("invalid uri");
        *request.method_mut() = Method::GET;
        request
    }

    #[test]
    fn reads_parameter_from_query_string() {
        let extractor = from_url_query_parameter("access_token");
        let token = extractor.extract(&request("http://localhost/feed?page=2&access_token=abc"));
        assert_eq!(token.as_deref(), Some("abc"));
    }

    #[test]
    fn decodes_percent_encoding() {
        let extractor = from_url_query_parameter("t");
        let token = extractor.extract(&request("http://localhost/?t=a%2Eb%2Ec"));
        assert_eq!(token.as_deref(), Some("a.b.c"));
    }

    #[test]
    fn first_occurrence_wins() {
        let extractor = from_url_query_parameter("t");
        let token = extractor.extract(&request("http://localhost/?t=one&t=two"));
        assert_eq!(token.as_deref(), Some("one"));
    }

    #[test]
    fn missing_parameter_or_query_is_none() {
        let extractor = from_url_query_parameter("t");
        assert_eq!(extractor.extract(&request("http://localhost/?other=1")), None);
        assert_eq!(extractor.extract(&request("http://localhost/")), None);
        assert_eq!(extractor.extract(&request("http://localhost/?t=")), None);
    }
}
