//! The application verify callback.
//!
//! After a token verifies, or when no token was found, the strategy asks the
//! application for a verdict. The callback sees the decoded payload (`None` when
//! there is none) and, if configured, the request.

use std::{fmt, future::Future};

use futures_util::future::{self, BoxFuture};

use crate::{error::BoxError, Request};

/// Extra information attached to a verdict, forwarded to the host untouched.
pub type Info = serde_json::Value;

/// Result of a verify callback: a verdict, or an error for a broken dependency.
pub type VerifyResult<U> = Result<Verified<U>, BoxError>;

/// The verdict of a verify callback.
///
/// A present `user` means success. An absent one means authentication failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Verified<U> {
    /// The authenticated user, if accepted.
    pub user: Option<U>,
    /// Optional extra information, for example a failure reason.
    pub info: Option<Info>,
}

impl<U> Verified<U> {
    /// Accept the request as `user`.
    pub const fn user(user: U) -> Self {
        Self {
            user: Some(user),
            info: None,
        }
    }

    /// Decline the request.
    pub const fn rejected() -> Self {
        Self {
            user: None,
            info: None,
        }
    }

    /// Attach extra information to the verdict.
    #[must_use]
    pub fn with_info(mut self, info: impl Into<Info>) -> Self {
        self.info = Some(info.into());
        self
    }
}

/// Decides whether a (possibly absent) payload authenticates a user.
pub trait VerifyCallback<C, U>: Send + Sync {
    /// Produce a verdict. `request` is only provided when the strategy passes it.
    fn verify<'a>(
        &'a self,
        request: Option<&'a Request>,
        payload: Option<C>,
    ) -> BoxFuture<'a, VerifyResult<U>>;
}

/// A callback that only looks at the payload. Created by [`verify_fn`].
#[derive(Clone)]
pub struct FnVerify<F>(F);

impl<F> fmt::Debug for FnVerify<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnVerify")
    }
}

/// A callback that also looks at the request. Created by [`verify_with_request_fn`].
#[derive(Clone)]
pub struct FnVerifyWithRequest<F>(F);

impl<F> fmt::Debug for FnVerifyWithRequest<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnVerifyWithRequest")
    }
}

/// Turn `Fn(Option<C>) -> Future` into a [`VerifyCallback`].
pub const fn verify_fn<C, U, F, Fut>(f: F) -> FnVerify<F>
where
    F: Fn(Option<C>) -> Fut + Send + Sync,
    Fut: Future<Output = VerifyResult<U>> + Send + 'static,
{
    FnVerify(f)
}

/// Turn `Fn(&Request, Option<C>) -> Future` into a [`VerifyCallback`].
///
/// The strategy always passes the request to callbacks built this way.
pub const fn verify_with_request_fn<C, U, F, Fut>(f: F) -> FnVerifyWithRequest<F>
where
    F: Fn(&Request, Option<C>) -> Fut + Send + Sync,
    Fut: Future<Output = VerifyResult<U>> + Send + 'static,
{
    FnVerifyWithRequest(f)
}

impl<C, U, F, Fut> VerifyCallback<C, U> for FnVerify<F>
where
    F: Fn(Option<C>) -> Fut + Send + Sync,
    Fut: Future<Output = VerifyResult<U>> + Send + 'static,
{
    fn verify<'a>(
        &'a self,
        _request: Option<&'a Request>,
        payload: Option<C>,
    ) -> BoxFuture<'a, VerifyResult<U>> {
        Box::pin((self.0)(payload))
    }
}

impl<C, U, F, Fut> VerifyCallback<C, U> for FnVerifyWithRequest<F>
where
    U: Send + 'static,
    F: Fn(&Request, Option<C>) -> Fut + Send + Sync,
    Fut: Future<Output = VerifyResult<U>> + Send + 'static,
{
    fn verify<'a>(
        &'a self,
        request: Option<&'a Request>,
        payload: Option<C>,
    ) -> BoxFuture<'a, VerifyResult<U>> {
        match request {
            Some(request) => Box::pin((self.0)(request, payload)),
            None => Box::pin(future::ready(Err(
                "verify callback needs the request but none was passed".into(),
            ))),
        }
    }
}
