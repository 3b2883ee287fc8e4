//! The JWT authentication strategy.
//!
//! [`JwtStrategy`] runs one authentication attempt per request: extract the token,
//! resolve the key, verify the token, then ask the application's verify callback
//! for a verdict. Every attempt ends in exactly one [`Outcome`].
//!
//! # Example
//!
//! ```rust
//! use jwt_strategy::{extract, JwtStrategy, Outcome, SecretOrKey, Verified, VerifyResult};
//! use serde_json::{Map, Value};
//!
//! # async fn run(request: jwt_strategy::Request) {
//! let strategy = JwtStrategy::<String>::builder()
//!     .secret_or_key(SecretOrKey::secret("my-secret"))
//!     .jwt_from_request(extract::from_auth_header_as_bearer_token())
//!     .verify(|payload: Option<Map<String, Value>>| async move {
//!         let user = payload
//!             .and_then(|claims| claims.get("sub")?.as_str().map(str::to_owned));
//!         VerifyResult::Ok(user.map_or_else(Verified::rejected, Verified::user))
//!     })
//!     .build()
//!     .expect("invalid strategy options");
//!
//! match strategy.authenticate(&request).await {
//!     Outcome::Success { user, .. } => println!("hello {user}"),
//!     Outcome::Fail(failure) => println!("rejected: {failure}"),
//!     Outcome::Error(error) => println!("broken: {error}"),
//! }
//! # }
//! ```

use std::{
    any::Any,
    fmt,
    future::Future,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use futures_util::FutureExt;
use jsonwebtoken::Algorithm;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    callback::{verify_fn, verify_with_request_fn, Verified, VerifyCallback, VerifyResult},
    error::{AuthError, ConfigError},
    extract::JwtFromRequest,
    key::{KeySource, SecretOrKey, SecretOrKeyProvider},
    options::{JsonWebTokenOptions, StrategyOptions, VerificationFailurePolicy, VerificationOptions},
    outcome::{AuthenticationHost, Failure, Outcome},
    verify::{JsonWebTokenVerifier, Verifier},
    Request,
};

/// Name the strategy registers under.
pub const STRATEGY_NAME: &str = "jwt";

struct Inner<U, C> {
    jwt_from_request: JwtFromRequest,
    key_source: KeySource,
    verifier: Box<dyn Verifier<C>>,
    callback: Box<dyn VerifyCallback<C, U>>,
    pass_req_to_callback: bool,
    verification_options: VerificationOptions,
    verification_failure: VerificationFailurePolicy,
}

/// JWT authentication strategy.
///
/// `U` is the user type produced by the verify callback. `C` is the decoded payload
/// type, a JSON object map by default. The strategy is immutable once built and
/// cheap to clone.
pub struct JwtStrategy<U, C = Map<String, Value>> {
    inner: Arc<Inner<U, C>>,
}

impl<U, C> Clone for JwtStrategy<U, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<U, C> fmt::Debug for JwtStrategy<U, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtStrategy")
            .field("jwt_from_request", &self.inner.jwt_from_request)
            .field("key_source", &self.inner.key_source)
            .field("pass_req_to_callback", &self.inner.pass_req_to_callback)
            .field("verification_options", &self.inner.verification_options)
            .field("verification_failure", &self.inner.verification_failure)
            .finish_non_exhaustive()
    }
}

impl<U, C> JwtStrategy<U, C>
where
    C: DeserializeOwned + Send + 'static,
{
    /// Start configuring a strategy that verifies tokens with [`JsonWebTokenVerifier`].
    #[must_use]
    pub fn builder() -> JwtStrategyBuilder<U, C> {
        JwtStrategyBuilder::new()
    }
}

impl<U, C> JwtStrategy<U, C> {
    /// The name the strategy registers under, always `"jwt"`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        STRATEGY_NAME
    }

    /// The merged options handed to the verifier.
    #[must_use]
    pub fn verification_options(&self) -> &VerificationOptions {
        &self.inner.verification_options
    }

    /// Whether the verify callback receives the request.
    #[must_use]
    pub fn passes_request_to_callback(&self) -> bool {
        self.inner.pass_req_to_callback
    }

    /// Run one authentication attempt.
    ///
    /// A request without a token is not rejected here: the verify callback is asked
    /// with no payload, and the key source and verifier are never touched. A panic in
    /// any caller-supplied component ends the attempt with [`Outcome::Error`].
    pub async fn authenticate(&self, request: &Request) -> Outcome<U> {
        let inner = &*self.inner;

        let extracted =
            panic::catch_unwind(AssertUnwindSafe(|| inner.jwt_from_request.extract(request)));
        let token = match extracted {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!(strategy = STRATEGY_NAME, "no token found in request");
                return self.run_callback(request, None).await;
            }
            Err(panic) => return component_panicked("token extractor", &panic_message(&*panic)),
        };

        let key = match catch_panic(|| inner.key_source.resolve(request, &token)).await {
            Ok(Ok(key)) => key,
            Ok(Err(err)) => {
                warn!(strategy = STRATEGY_NAME, error = %err, "failed to resolve verification key");
                return Outcome::Fail(Failure::SecretOrKey(err));
            }
            Err(message) => return component_panicked("key provider", &message),
        };
        debug!(strategy = STRATEGY_NAME, key = ?key, "verification key resolved");

        let verified = catch_panic(|| {
            inner
                .verifier
                .verify(&token, &key, &inner.verification_options)
        })
        .await;

        match verified {
            Ok(Ok(payload)) => self.run_callback(request, Some(payload)).await,
            Ok(Err(err)) => {
                warn!(strategy = STRATEGY_NAME, error = %err, "token verification failed");
                match inner.verification_failure {
                    VerificationFailurePolicy::Fail => Outcome::Fail(Failure::Verification(err)),
                    VerificationFailurePolicy::PassNullPayload => {
                        self.run_callback(request, None).await
                    }
                }
            }
            Err(message) => component_panicked("verifier", &message),
        }
    }

    /// Run one authentication attempt and report the outcome to `host`.
    pub async fn authenticate_with<H>(&self, request: &Request, host: &mut H)
    where
        H: AuthenticationHost<U> + ?Sized,
    {
        self.authenticate(request).await.report(host);
    }

    async fn run_callback(&self, request: &Request, payload: Option<C>) -> Outcome<U> {
        let inner = &*self.inner;
        let request = inner.pass_req_to_callback.then_some(request);

        match catch_panic(|| inner.callback.verify(request, payload)).await {
            Ok(Ok(Verified {
                user: Some(user),
                info,
            })) => {
                debug!(strategy = STRATEGY_NAME, "verify callback accepted the request");
                Outcome::Success { user, info }
            }
            Ok(Ok(Verified { user: None, info })) => {
                debug!(strategy = STRATEGY_NAME, "verify callback declined the request");
                Outcome::Fail(Failure::Declined(info))
            }
            Ok(Err(err)) => {
                warn!(strategy = STRATEGY_NAME, error = %err, "verify callback reported an error");
                Outcome::Error(AuthError::Callback(err))
            }
            Err(message) => {
                warn!(strategy = STRATEGY_NAME, error = %message, "verify callback panicked");
                Outcome::Error(AuthError::CallbackPanicked(message))
            }
        }
    }
}

/// Call `call` and drive the future it returns, turning a panic in either step
/// into its message.
async fn catch_panic<F, Fut>(call: F) -> Result<Fut::Output, String>
where
    F: FnOnce() -> Fut,
    Fut: Future,
{
    let future = panic::catch_unwind(AssertUnwindSafe(call))
        .map_err(|panic| panic_message(&*panic))?;
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| panic_message(&*panic))
}

fn component_panicked<U>(component: &'static str, message: &str) -> Outcome<U> {
    warn!(strategy = STRATEGY_NAME, component, error = %message, "strategy component panicked");
    Outcome::Error(AuthError::ComponentPanicked {
        component,
        message: message.to_owned(),
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

/// Builder for [`JwtStrategy`].
///
/// All setters consume and return the builder. [`build`](Self::build) checks that
/// the configuration is complete.
pub struct JwtStrategyBuilder<U, C = Map<String, Value>> {
    secret_or_key: Option<SecretOrKey>,
    secret_or_key_provider: Option<Arc<dyn SecretOrKeyProvider>>,
    jwt_from_request: Option<JwtFromRequest>,
    verifier: Box<dyn Verifier<C>>,
    callback: Option<Box<dyn VerifyCallback<C, U>>>,
    callback_wants_request: bool,
    options: StrategyOptions,
}

impl<U, C> fmt::Debug for JwtStrategyBuilder<U, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtStrategyBuilder")
            .field("secret_or_key", &self.secret_or_key)
            .field(
                "secret_or_key_provider",
                &self.secret_or_key_provider.is_some(),
            )
            .field("jwt_from_request", &self.jwt_from_request)
            .field("callback", &self.callback.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<U, C> Default for JwtStrategyBuilder<U, C>
where
    C: DeserializeOwned + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<U, C> JwtStrategyBuilder<U, C>
where
    C: DeserializeOwned + Send + 'static,
{
    /// A builder that verifies tokens with [`JsonWebTokenVerifier`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_verifier(JsonWebTokenVerifier)
    }
}

impl<U, C> JwtStrategyBuilder<U, C> {
    /// A builder that verifies tokens with a custom verifier.
    #[must_use]
    pub fn with_verifier(verifier: impl Verifier<C> + 'static) -> Self {
        Self {
            secret_or_key: None,
            secret_or_key_provider: None,
            jwt_from_request: None,
            verifier: Box::new(verifier),
            callback: None,
            callback_wants_request: false,
            options: StrategyOptions::default(),
        }
    }

    /// Verify every token with this fixed key.
    #[must_use]
    pub fn secret_or_key(mut self, key: SecretOrKey) -> Self {
        self.secret_or_key = Some(key);
        self
    }

    /// Resolve the key per request.
    #[must_use]
    pub fn secret_or_key_provider(mut self, provider: impl SecretOrKeyProvider + 'static) -> Self {
        self.secret_or_key_provider = Some(Arc::new(provider));
        self
    }

    /// Where to look for the token. See [`extract`](crate::extract).
    #[must_use]
    pub fn jwt_from_request(mut self, jwt_from_request: JwtFromRequest) -> Self {
        self.jwt_from_request = Some(jwt_from_request);
        self
    }

    /// Replace the verifier.
    #[must_use]
    pub fn verifier(mut self, verifier: impl Verifier<C> + 'static) -> Self {
        self.verifier = Box::new(verifier);
        self
    }

    /// Set a verify callback that only sees the payload.
    #[must_use]
    pub fn verify<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Option<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = VerifyResult<U>> + Send + 'static,
    {
        self.callback = Some(Box::new(verify_fn(f)));
        self.callback_wants_request = false;
        self
    }

    /// Set a verify callback that also sees the request.
    ///
    /// This turns on `pass_req_to_callback`.
    #[must_use]
    pub fn verify_with_request<F, Fut>(mut self, f: F) -> Self
    where
        U: Send + 'static,
        F: Fn(&Request, Option<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = VerifyResult<U>> + Send + 'static,
    {
        self.callback = Some(Box::new(verify_with_request_fn(f)));
        self.callback_wants_request = true;
        self
    }

    /// Set a verify callback implementing [`VerifyCallback`] directly.
    ///
    /// It receives the request only if `pass_req_to_callback` is on.
    #[must_use]
    pub fn verify_callback(mut self, callback: impl VerifyCallback<C, U> + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self.callback_wants_request = false;
        self
    }

    /// Replace all options at once, for example with options loaded from a file.
    #[must_use]
    pub fn options(mut self, options: StrategyOptions) -> Self {
        self.options = options;
        self
    }

    /// Hand the request to the verify callback.
    #[must_use]
    pub fn pass_req_to_callback(mut self, pass: bool) -> Self {
        self.options.pass_req_to_callback = pass;
        self
    }

    /// Base options for the verifier.
    #[must_use]
    pub fn json_web_token_options(mut self, options: JsonWebTokenOptions) -> Self {
        self.options.json_web_token_options = options;
        self
    }

    /// Accepted `aud` values, overriding the base options.
    #[must_use]
    pub fn audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.audience = Some(audience.into_iter().map(Into::into).collect());
        self
    }

    /// Accepted `iss` values, overriding the base options.
    #[must_use]
    pub fn issuer<I, S>(mut self, issuer: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.issuer = Some(issuer.into_iter().map(Into::into).collect());
        self
    }

    /// Allowed algorithms, overriding the base options.
    #[must_use]
    pub fn algorithms(mut self, algorithms: impl IntoIterator<Item = Algorithm>) -> Self {
        self.options.algorithms = Some(algorithms.into_iter().collect());
        self
    }

    /// Skip the `exp` check, overriding the base options.
    #[must_use]
    pub fn ignore_expiration(mut self, ignore: bool) -> Self {
        self.options.ignore_expiration = Some(ignore);
        self
    }

    /// What to do when the verifier rejects a token.
    #[must_use]
    pub fn verification_failure(mut self, policy: VerificationFailurePolicy) -> Self {
        self.options.verification_failure = policy;
        self
    }

    /// Validate the configuration and build the strategy.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when both or neither key sources are set, or when the
    /// verify callback or the token extractor is missing. Checked in that order.
    pub fn build(self) -> Result<JwtStrategy<U, C>, ConfigError> {
        let key_source = match (self.secret_or_key, self.secret_or_key_provider) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingKeySources),
            (None, None) => return Err(ConfigError::MissingSecretOrKey),
            (Some(key), None) => KeySource::Static(key),
            (None, Some(provider)) => KeySource::Provider(provider),
        };
        let callback = self.callback.ok_or(ConfigError::MissingVerifyCallback)?;
        let jwt_from_request = self
            .jwt_from_request
            .ok_or(ConfigError::MissingJwtFromRequest)?;

        Ok(JwtStrategy {
            inner: Arc::new(Inner {
                jwt_from_request,
                key_source,
                verifier: self.verifier,
                callback,
                pass_req_to_callback: self.options.pass_req_to_callback
                    || self.callback_wants_request,
                verification_options: self.options.verification_options(),
                verification_failure: self.options.verification_failure,
            }),
        })
    }
}
