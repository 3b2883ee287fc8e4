//! The result of one authentication attempt.

use crate::{
    callback::Info,
    error::{AuthError, SecretOrKeyError},
    verify::VerifyError,
};

/// Why a request did not authenticate.
///
/// These are ordinary rejections. The host usually answers them with `401`.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    /// The key provider could not produce a key for the token.
    #[error("Failed to resolve the verification key: {0}")]
    SecretOrKey(#[source] SecretOrKeyError),
    /// The token did not verify.
    #[error(transparent)]
    Verification(#[from] VerifyError),
    /// The verify callback declined the request, optionally saying why.
    #[error("Authentication declined")]
    Declined(Option<Info>),
}

impl From<SecretOrKeyError> for Failure {
    fn from(error: SecretOrKeyError) -> Self {
        Self::SecretOrKey(error)
    }
}

impl Failure {
    /// Extra information attached by the verify callback, if it declined.
    #[must_use]
    pub const fn info(&self) -> Option<&Info> {
        match self {
            Self::Declined(info) => info.as_ref(),
            _ => None,
        }
    }
}

/// The terminal outcome of [`JwtStrategy::authenticate`](crate::JwtStrategy::authenticate).
#[derive(Debug)]
pub enum Outcome<U> {
    /// The request authenticated as `user`.
    Success {
        /// The user produced by the verify callback.
        user: U,
        /// Extra information produced by the verify callback.
        info: Option<Info>,
    },
    /// The request did not authenticate.
    Fail(Failure),
    /// Authentication could not be decided because the verify callback broke.
    Error(AuthError),
}

impl<U> Outcome<U> {
    /// Whether the request authenticated.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether the request was rejected.
    #[must_use]
    pub const fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }

    /// Whether a system error occurred.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The authenticated user, if any.
    #[must_use]
    pub fn into_user(self) -> Option<U> {
        match self {
            Self::Success { user, .. } => Some(user),
            _ => None,
        }
    }

    /// Hand the outcome to `host`. Exactly one host method is called.
    pub fn report<H>(self, host: &mut H)
    where
        H: AuthenticationHost<U> + ?Sized,
    {
        match self {
            Self::Success { user, info } => host.success(user, info),
            Self::Fail(failure) => host.fail(failure),
            Self::Error(error) => host.error(error),
        }
    }
}

/// The authentication framework a strategy reports to.
pub trait AuthenticationHost<U> {
    /// The request authenticated as `user`.
    fn success(&mut self, user: U, info: Option<Info>);

    /// The request did not authenticate.
    fn fail(&mut self, failure: Failure);

    /// A system error occurred.
    fn error(&mut self, error: AuthError);
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AuthenticationHost, Failure, Outcome};
    use crate::{callback::Info, error::AuthError, verify::VerifyError};

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl AuthenticationHost<String> for Recorder {
        fn success(&mut self, user: String, _info: Option<Info>) {
            self.calls.push(format!("success:{user}"));
        }

        fn fail(&mut self, failure: Failure) {
            self.calls.push(format!("fail:{failure}"));
        }

        fn error(&mut self, error: AuthError) {
            self.calls.push(format!("error:{error}"));
        }
    }

    #[test]
    fn report_calls_exactly_one_method() {
        let mut host = Recorder::default();
        Outcome::Success {
            user: "alice".to_owned(),
            info: None,
        }
        .report(&mut host);
        Outcome::<String>::Fail(Failure::Verification(VerifyError::Expired)).report(&mut host);
        Outcome::<String>::Error(AuthError::CallbackPanicked("boom".to_owned())).report(&mut host);

        assert_eq!(
            host.calls,
            [
                "success:alice",
                "fail:Token has expired",
                "error:verify callback panicked: boom",
            ]
        );
    }

    #[test]
    fn declined_failure_keeps_info() {
        let failure = Failure::Declined(Some(json!({ "message": "banned" })));
        assert_eq!(failure.info(), Some(&json!({ "message": "banned" })));
        assert_eq!(Failure::Verification(VerifyError::Expired).info(), None);
    }

    #[test]
    fn predicates() {
        let outcome = Outcome::Success { user: 1, info: None };
        assert!(outcome.is_success());
        assert_eq!(outcome.into_user(), Some(1));

        let outcome = Outcome::<u8>::Fail(Failure::Declined(None));
        assert!(outcome.is_fail() && !outcome.is_error());
        assert_eq!(outcome.into_user(), None);
    }
}
