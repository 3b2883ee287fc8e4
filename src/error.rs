//! Error types shared across the strategy.
//!
//! Three kinds of problem exist and they never mix:
//!
//! - [`ConfigError`]: the strategy was built with an invalid combination of options.
//!   Returned from [`JwtStrategyBuilder::build`](crate::JwtStrategyBuilder::build).
//! - [`Failure`](crate::Failure): a request did not authenticate. Reported as
//!   [`Outcome::Fail`](crate::Outcome::Fail).
//! - [`AuthError`]: caller-supplied code broke, by returning an error from the
//!   verify callback or by panicking. Reported as [`Outcome::Error`](crate::Outcome::Error).

/// A boxed, thread-safe error produced by caller-supplied code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error returned when a [`JwtStrategy`](crate::JwtStrategy) is built from invalid options.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Both a static key and a key provider were configured.
    #[error("JwtStrategy has been given both a secretOrKey and a secretOrKeyProvider")]
    ConflictingKeySources,
    /// Neither a static key nor a key provider was configured.
    #[error("JwtStrategy requires a secret or key")]
    MissingSecretOrKey,
    /// No application verify callback was configured.
    #[error("JwtStrategy requires a verify callback")]
    MissingVerifyCallback,
    /// No token extractor was configured.
    #[error(
        "JwtStrategy requires a function to retrieve jwt from requests (see `jwt_from_request`)"
    )]
    MissingJwtFromRequest,
}

/// System error reported when caller-supplied code misbehaves.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The callback explicitly reported an error.
    #[error("verify callback reported an error: {0}")]
    Callback(#[source] BoxError),
    /// The callback panicked, either when called or while its future was polled.
    #[error("verify callback panicked: {0}")]
    CallbackPanicked(String),
    /// The token extractor, key provider or verifier panicked.
    #[error("{component} panicked: {message}")]
    ComponentPanicked {
        /// Which part of the pipeline panicked, for example `key provider`.
        component: &'static str,
        /// The panic message.
        message: String,
    },
}

/// Error reported by a [`SecretOrKeyProvider`](crate::SecretOrKeyProvider).
///
/// Key resolution problems are treated as authentication failures, not system errors.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct SecretOrKeyError(#[from] BoxError);

impl SecretOrKeyError {
    /// Wrap any error as a key resolution error.
    pub fn new<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self(error.into())
    }

    /// Create a key resolution error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self(message.into().into())
    }

    /// Borrow the underlying error.
    #[must_use]
    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthError, ConfigError, SecretOrKeyError};

    #[test]
    fn config_errors_name_the_missing_option() {
        assert_eq!(
            ConfigError::MissingSecretOrKey.to_string(),
            "JwtStrategy requires a secret or key"
        );
        assert!(ConfigError::MissingJwtFromRequest
            .to_string()
            .contains("jwt_from_request"));
    }

    #[test]
    fn key_errors_are_transparent() {
        let error = SecretOrKeyError::msg("kid not found");
        assert_eq!(error.to_string(), "kid not found");
        assert_eq!(error.get_ref().to_string(), "kid not found");
    }

    #[test]
    fn callback_error_keeps_its_source() {
        let error = AuthError::Callback("database offline".into());
        let source = std::error::Error::source(&error).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("database offline"));
    }
}
