#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

//! JWT authentication strategy.
//!
//! Locates a JSON Web Token in a request, verifies it with a configured key and
//! hands the decoded payload to an application callback that decides who the
//! request belongs to.
//!
//! - [`extract`]: composable functions that pull a raw token out of a request.
//! - [`JwtStrategy`]: runs an authentication attempt and produces an [`Outcome`].
//!
//! # Example
//!
//! ```rust
//! use jwt_strategy::{extract, JwtStrategy, SecretOrKey, Verified, VerifyResult};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Claims {
//!     sub: String,
//! }
//!
//! let strategy = JwtStrategy::<String, Claims>::builder()
//!     .secret_or_key(SecretOrKey::secret("my-secret"))
//!     .jwt_from_request(extract::from_extractors([
//!         extract::from_auth_header_as_bearer_token(),
//!         extract::from_url_query_parameter("access_token"),
//!     ]))
//!     .audience(["api.example.com"])
//!     .verify(|claims: Option<Claims>| async move {
//!         VerifyResult::Ok(match claims {
//!             Some(claims) => Verified::user(claims.sub),
//!             None => Verified::rejected(),
//!         })
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(strategy.name(), "jwt");
//! ```

#[macro_use]
mod macros;

pub mod callback;
pub mod error;
pub mod extract;
pub mod key;
pub mod options;
pub mod outcome;
pub mod strategy;
pub mod verify;

#[doc(inline)]
pub use http_kit::{header, Body, Method, Request, Uri};

pub use callback::{
    verify_fn, verify_with_request_fn, Info, Verified, VerifyCallback, VerifyResult,
};
pub use error::{AuthError, BoxError, ConfigError, SecretOrKeyError};
pub use extract::JwtFromRequest;
pub use key::{SecretOrKey, SecretOrKeyProvider};
pub use options::{
    ExplicitClaims, JsonWebTokenOptions, StrategyOptions, VerificationFailurePolicy,
    VerificationOptions,
};
pub use outcome::{AuthenticationHost, Failure, Outcome};
pub use strategy::{JwtStrategy, JwtStrategyBuilder, STRATEGY_NAME};
pub use verify::{JsonWebTokenVerifier, Verifier, VerifyError};

pub use jsonwebtoken::Algorithm;
