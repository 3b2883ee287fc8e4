//! Strategy and verification options.
//!
//! All option types deserialize with serde, with every field optional, so a host can
//! load them from its own configuration files. Key material and callbacks are not
//! options. They are set on the [`JwtStrategyBuilder`](crate::JwtStrategyBuilder).

use jsonwebtoken::Algorithm;
use serde::Deserialize;

/// Base options handed to the verifier.
///
/// Audience, issuer, algorithms and expiration handling are not part of the base
/// options. They always come from the same-named fields of [`StrategyOptions`].
/// See [`VerificationOptions::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JsonWebTokenOptions {
    /// Skip the `nbf` check.
    pub ignore_not_before: bool,
    /// Required `sub` value.
    pub subject: Option<String>,
    /// Seconds of clock skew tolerated on `exp`, `nbf` and `iat`.
    pub clock_tolerance: u64,
    /// Maximum token age in seconds, measured from `iat`.
    pub max_age: Option<u64>,
    /// Registered claims that must be present, for example `exp`.
    pub required_claims: Vec<String>,
}

/// What to do when the verifier rejects a token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerificationFailurePolicy {
    /// End the attempt with [`Failure::Verification`](crate::Failure::Verification).
    #[default]
    Fail,
    /// Call the verify callback with no payload and let it decide.
    PassNullPayload,
}

/// Options accepted by the strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrategyOptions {
    /// Hand the request to the verify callback.
    pub pass_req_to_callback: bool,
    /// Base options for the verifier.
    pub json_web_token_options: JsonWebTokenOptions,
    /// Accepted `aud` values. Audience is not checked when unset.
    pub audience: Option<Vec<String>>,
    /// Accepted `iss` values. Issuer is not checked when unset.
    pub issuer: Option<Vec<String>>,
    /// Allowed signing algorithms. Defaults to the key's algorithm family.
    pub algorithms: Option<Vec<Algorithm>>,
    /// Skip the `exp` check. Expiration is checked when unset.
    pub ignore_expiration: Option<bool>,
    /// Routing of verifier rejections.
    pub verification_failure: VerificationFailurePolicy,
}

impl StrategyOptions {
    /// The merged options handed to the verifier.
    #[must_use]
    pub fn verification_options(&self) -> VerificationOptions {
        VerificationOptions::merge(
            self.json_web_token_options.clone(),
            ExplicitClaims {
                audience: self.audience.clone(),
                issuer: self.issuer.clone(),
                algorithms: self.algorithms.clone(),
                ignore_expiration: self.ignore_expiration,
            },
        )
    }
}

/// Strategy-level claim options merged over [`JsonWebTokenOptions`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitClaims {
    /// Accepted `aud` values.
    pub audience: Option<Vec<String>>,
    /// Accepted `iss` values.
    pub issuer: Option<Vec<String>>,
    /// Allowed signing algorithms.
    pub algorithms: Option<Vec<Algorithm>>,
    /// Skip the `exp` check.
    pub ignore_expiration: Option<bool>,
}

/// The resolved options a [`Verifier`](crate::Verifier) works with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationOptions {
    /// Accepted `aud` values.
    pub audience: Option<Vec<String>>,
    /// Accepted `iss` values.
    pub issuer: Option<Vec<String>>,
    /// Allowed signing algorithms.
    pub algorithms: Option<Vec<Algorithm>>,
    /// Skip the `exp` check.
    pub ignore_expiration: bool,
    /// Skip the `nbf` check.
    pub ignore_not_before: bool,
    /// Required `sub` value.
    pub subject: Option<String>,
    /// Seconds of clock skew tolerated.
    pub clock_tolerance: u64,
    /// Maximum token age in seconds.
    pub max_age: Option<u64>,
    /// Registered claims that must be present.
    pub required_claims: Vec<String>,
}

impl VerificationOptions {
    /// Shallow merge. The explicit claim options always win, even when unset, so
    /// expiration is checked unless `explicit.ignore_expiration` is `Some(true)`.
    #[must_use]
    pub fn merge(base: JsonWebTokenOptions, explicit: ExplicitClaims) -> Self {
        Self {
            audience: explicit.audience,
            issuer: explicit.issuer,
            algorithms: explicit.algorithms,
            ignore_expiration: explicit.ignore_expiration.unwrap_or(false),
            ignore_not_before: base.ignore_not_before,
            subject: base.subject,
            clock_tolerance: base.clock_tolerance,
            max_age: base.max_age,
            required_claims: base.required_claims,
        }
    }
}
