//! Token verification.
//!
//! The strategy never checks signatures itself. It hands the token, the resolved key
//! and the merged [`VerificationOptions`] to a [`Verifier`]. The default,
//! [`JsonWebTokenVerifier`], is backed by the `jsonwebtoken` crate.

use futures_util::future::{self, BoxFuture};
use jsonwebtoken::{decode, errors::ErrorKind, get_current_timestamp, Validation};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{error::BoxError, key::SecretOrKey, options::VerificationOptions};

/// Error returned when a token does not verify.
///
/// Reported as [`Failure::Verification`](crate::Failure::Verification): an invalid,
/// expired or malformed token is an authentication failure, not a system error.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The token has expired.
    #[error("Token has expired")]
    Expired,
    /// The token is not valid yet (`nbf` is in the future).
    #[error("Token is not yet valid")]
    NotYetValid,
    /// The signature does not match.
    #[error("Invalid token signature")]
    InvalidSignature,
    /// The `aud` claim is not accepted.
    #[error("Token audience is invalid")]
    InvalidAudience,
    /// The `iss` claim is not accepted.
    #[error("Token issuer is invalid")]
    InvalidIssuer,
    /// The `sub` claim is not the required one.
    #[error("Token subject is invalid")]
    InvalidSubject,
    /// The token was signed with an algorithm that is not allowed.
    #[error("Token algorithm is not allowed")]
    InvalidAlgorithm,
    /// A required claim is missing.
    #[error("Token is missing required claim `{0}`")]
    MissingClaim(String),
    /// The token is older than the configured maximum age.
    #[error("Token exceeds the maximum age")]
    MaxAgeExceeded,
    /// The verification key itself is unusable.
    #[error("Invalid verification key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
    /// The claims could not be decoded into the payload type.
    #[error("Token claims have an unexpected shape: {0}")]
    Claims(#[source] serde_json::Error),
    /// The token cannot be parsed.
    #[error("Malformed token: {0}")]
    Malformed(#[source] jsonwebtoken::errors::Error),
    /// A custom verifier rejected the token.
    #[error(transparent)]
    Other(BoxError),
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidIssuer => Self::InvalidIssuer,
            ErrorKind::InvalidAudience => Self::InvalidAudience,
            ErrorKind::InvalidSubject => Self::InvalidSubject,
            ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => Self::InvalidAlgorithm,
            ErrorKind::MissingRequiredClaim(claim) => Self::MissingClaim(claim.clone()),
            ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidKeyFormat => Self::InvalidKey(err),
            _ => Self::Malformed(err),
        }
    }
}

/// Verifies a token and decodes its payload.
pub trait Verifier<C>: Send + Sync {
    /// Verify `token` against `key` under `options`.
    fn verify<'a>(
        &'a self,
        token: &'a str,
        key: &'a SecretOrKey,
        options: &'a VerificationOptions,
    ) -> BoxFuture<'a, Result<C, VerifyError>>;
}

/// The default verifier, backed by `jsonwebtoken`.
///
/// Checks the signature, `exp`, `nbf`, `aud`, `iss`, `sub`, required claims and
/// the algorithm allow-list. It also checks `iat` against `max_age` when one is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWebTokenVerifier;

impl JsonWebTokenVerifier {
    /// Verify synchronously and decode the claims into `C`.
    ///
    /// # Errors
    ///
    /// Returns a [`VerifyError`] describing why the token was rejected.
    pub fn decode<C: DeserializeOwned>(
        token: &str,
        key: &SecretOrKey,
        options: &VerificationOptions,
    ) -> Result<C, VerifyError> {
        let decoding_key = key.decoding_key().map_err(VerifyError::InvalidKey)?;
        let validation = validation(options, key);

        let claims = decode::<Value>(token, &decoding_key, &validation)?.claims;

        if let Some(max_age) = options.max_age {
            check_max_age(&claims, max_age, options.clock_tolerance)?;
        }

        serde_json::from_value(claims).map_err(VerifyError::Claims)
    }
}

impl<C> Verifier<C> for JsonWebTokenVerifier
where
    C: DeserializeOwned + Send + 'static,
{
    fn verify<'a>(
        &'a self,
        token: &'a str,
        key: &'a SecretOrKey,
        options: &'a VerificationOptions,
    ) -> BoxFuture<'a, Result<C, VerifyError>> {
        Box::pin(future::ready(Self::decode(token, key, options)))
    }
}

fn validation(options: &VerificationOptions, key: &SecretOrKey) -> Validation {
    let mut validation = Validation::default();

    validation.algorithms = options
        .algorithms
        .clone()
        .unwrap_or_else(|| key.default_algorithms().to_vec());
    validation.leeway = options.clock_tolerance;
    validation.validate_exp = !options.ignore_expiration;
    validation.validate_nbf = !options.ignore_not_before;
    validation.set_required_spec_claims(&options.required_claims);

    match &options.audience {
        Some(audience) => validation.set_audience(audience),
        None => validation.validate_aud = false,
    }
    if let Some(issuer) = &options.issuer {
        validation.set_issuer(issuer);
    }
    validation.sub.clone_from(&options.subject);

    validation
}

fn check_max_age(claims: &Value, max_age: u64, clock_tolerance: u64) -> Result<(), VerifyError> {
    let issued_at = claims
        .get("iat")
        .and_then(Value::as_u64)
        .ok_or_else(|| VerifyError::MissingClaim("iat".to_owned()))?;

    let expires = issued_at
        .saturating_add(max_age)
        .saturating_add(clock_tolerance);
    if get_current_timestamp() >= expires {
        return Err(VerifyError::MaxAgeExceeded);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Value};

    use super::{JsonWebTokenVerifier, Verifier, VerifyError};
    use crate::{key::SecretOrKey, options::VerificationOptions};

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    struct TestClaims {
        sub: String,
        exp: u64,
    }

    fn create_token(claims: &impl Serialize, secret: &[u8]) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    fn far_future() -> u64 {
        get_current_timestamp() + 3600
    }

    #[tokio::test]
    async fn test_verification_success() {
        let claims = TestClaims {
            sub: "user123".to_owned(),
            exp: far_future(),
        };
        let token = create_token(&claims, b"secret");
        let key = SecretOrKey::secret("secret");
        let options = VerificationOptions::default();

        let decoded: TestClaims = JsonWebTokenVerifier
            .verify(&token, &key, &options)
            .await
            .unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_invalid_signature() {
        let token = create_token(&json!({ "sub": "u", "exp": far_future() }), b"secret1");
        let result = JsonWebTokenVerifier::decode::<Value>(
            &token,
            &SecretOrKey::secret("secret2"),
            &VerificationOptions::default(),
        );
        assert!(matches!(result, Err(VerifyError::InvalidSignature)));
    }

    #[test]
    fn test_expired_unless_ignored() {
        let token = create_token(&json!({ "sub": "u", "exp": 1 }), b"secret");
        let key = SecretOrKey::secret("secret");

        let defaults = VerificationOptions::default();
        let result = JsonWebTokenVerifier::decode::<Value>(&token, &key, &defaults);
        assert!(matches!(result, Err(VerifyError::Expired)));

        let ignore = VerificationOptions {
            ignore_expiration: true,
            ..Default::default()
        };
        assert!(JsonWebTokenVerifier::decode::<Value>(&token, &key, &ignore).is_ok());
    }

    #[test]
    fn test_token_without_exp_is_accepted_by_default() {
        let token = create_token(&json!({ "sub": "u" }), b"secret");
        let key = SecretOrKey::secret("secret");
        let defaults = VerificationOptions::default();
        assert!(JsonWebTokenVerifier::decode::<Value>(&token, &key, &defaults).is_ok());

        let strict = VerificationOptions {
            required_claims: vec!["exp".to_owned()],
            ..Default::default()
        };
        let result = JsonWebTokenVerifier::decode::<Value>(&token, &key, &strict);
        assert!(matches!(result, Err(VerifyError::MissingClaim(claim)) if claim == "exp"));
    }

    #[test]
    fn test_audience_and_issuer() {
        let token = create_token(
            &json!({ "sub": "u", "aud": "api", "iss": "https://issuer", "exp": far_future() }),
            b"secret",
        );
        let key = SecretOrKey::secret("secret");

        let unchecked = VerificationOptions::default();
        assert!(JsonWebTokenVerifier::decode::<Value>(&token, &key, &unchecked).is_ok());

        let wrong_audience = VerificationOptions {
            audience: Some(vec!["other".to_owned()]),
            ..Default::default()
        };
        let result = JsonWebTokenVerifier::decode::<Value>(&token, &key, &wrong_audience);
        assert!(matches!(result, Err(VerifyError::InvalidAudience)));

        let wrong_issuer = VerificationOptions {
            audience: Some(vec!["api".to_owned()]),
            issuer: Some(vec!["https://elsewhere".to_owned()]),
            ..Default::default()
        };
        let result = JsonWebTokenVerifier::decode::<Value>(&token, &key, &wrong_issuer);
        assert!(matches!(result, Err(VerifyError::InvalidIssuer)));
    }

    #[test]
    fn test_algorithm_allow_list() {
        let token = create_token(&json!({ "sub": "u", "exp": far_future() }), b"secret");
        let options = VerificationOptions {
            algorithms: Some(vec![Algorithm::HS512]),
            ..Default::default()
        };
        let result =
            JsonWebTokenVerifier::decode::<Value>(&token, &SecretOrKey::secret("secret"), &options);
        assert!(matches!(result, Err(VerifyError::InvalidAlgorithm)));
    }

    #[test]
    fn test_max_age() {
        let now = get_current_timestamp();
        let key = SecretOrKey::secret("secret");
        let options = VerificationOptions {
            max_age: Some(60),
            ..Default::default()
        };

        let fresh = create_token(&json!({ "sub": "u", "iat": now }), b"secret");
        assert!(JsonWebTokenVerifier::decode::<Value>(&fresh, &key, &options).is_ok());

        let stale = create_token(&json!({ "sub": "u", "iat": now - 600 }), b"secret");
        let result = JsonWebTokenVerifier::decode::<Value>(&stale, &key, &options);
        assert!(matches!(result, Err(VerifyError::MaxAgeExceeded)));

        let no_iat = create_token(&json!({ "sub": "u" }), b"secret");
        let result = JsonWebTokenVerifier::decode::<Value>(&no_iat, &key, &options);
        assert!(matches!(result, Err(VerifyError::MissingClaim(claim)) if claim == "iat"));
    }

    #[test]
    fn test_subject_and_not_before() {
        let key = SecretOrKey::secret("secret");
        let later = far_future();
        let token = create_token(
            &json!({ "sub": "u", "nbf": later, "exp": later + 60 }),
            b"secret",
        );

        let defaults = VerificationOptions::default();
        let result = JsonWebTokenVerifier::decode::<Value>(&token, &key, &defaults);
        assert!(matches!(result, Err(VerifyError::NotYetValid)));

        let options = VerificationOptions {
            ignore_not_before: true,
            subject: Some("someone-else".to_owned()),
            ..Default::default()
        };
        let result = JsonWebTokenVerifier::decode::<Value>(&token, &key, &options);
        assert!(matches!(result, Err(VerifyError::InvalidSubject)));

        let options = VerificationOptions {
            ignore_not_before: true,
            subject: Some("u".to_owned()),
            ..Default::default()
        };
        assert!(JsonWebTokenVerifier::decode::<Value>(&token, &key, &options).is_ok());
    }

    #[test]
    fn test_malformed_token() {
        let result = JsonWebTokenVerifier::decode::<Value>(
            "not-a-jwt",
            &SecretOrKey::secret("secret"),
            &VerificationOptions::default(),
        );
        assert!(matches!(result, Err(VerifyError::Malformed(_))));
    }

    #[test]
    fn test_claims_shape_mismatch() {
        let token = create_token(&json!({ "sub": 42 }), b"secret");
        let result = JsonWebTokenVerifier::decode::<TestClaims>(
            &token,
            &SecretOrKey::secret("secret"),
            &VerificationOptions::default(),
        );
        assert!(matches!(result, Err(VerifyError::Claims(_))));
    }
}
