//! Verification keys and key resolution.

use std::{fmt, future::Future, sync::Arc};

use futures_util::future::BoxFuture;
use jsonwebtoken::{Algorithm, DecodingKey};

use crate::{error::SecretOrKeyError, Request};

const HMAC_ALGORITHMS: &[Algorithm] = &[Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

const RSA_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

const EC_ALGORITHMS: &[Algorithm] = &[Algorithm::ES256, Algorithm::ES384];

const ED_ALGORITHMS: &[Algorithm] = &[Algorithm::EdDSA];

/// Secret or public key used to verify a token's signature.
#[derive(Clone, PartialEq, Eq)]
pub enum SecretOrKey {
    /// Shared secret for the HMAC algorithms.
    Secret(Vec<u8>),
    /// RSA public key in PEM format.
    RsaPem(Vec<u8>),
    /// RSA public key given by its base64url modulus and exponent, as found in a JWK.
    RsaComponents {
        /// Modulus.
        n: String,
        /// Public exponent.
        e: String,
    },
    /// EC public key in PEM format.
    EcPem(Vec<u8>),
    /// Ed25519 public key in PEM format.
    EdPem(Vec<u8>),
}

impl fmt::Debug for SecretOrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        let kind = match self {
            Self::Secret(_) => "Secret",
            Self::RsaPem(_) => "RsaPem",
            Self::RsaComponents { .. } => "RsaComponents",
            Self::EcPem(_) => "EcPem",
            Self::EdPem(_) => "EdPem",
        };
        f.debug_tuple("SecretOrKey").field(&kind).finish()
    }
}

impl SecretOrKey {
    /// A shared HMAC secret.
    pub fn secret(secret: impl Into<Vec<u8>>) -> Self {
        Self::Secret(secret.into())
    }

    /// An RSA public key in PEM format.
    pub fn rsa_pem(pem: impl Into<Vec<u8>>) -> Self {
        Self::RsaPem(pem.into())
    }

    /// An RSA public key from its JWK components.
    pub fn rsa_components(n: impl Into<String>, e: impl Into<String>) -> Self {
        Self::RsaComponents {
            n: n.into(),
            e: e.into(),
        }
    }

    /// An EC public key in PEM format.
    pub fn ec_pem(pem: impl Into<Vec<u8>>) -> Self {
        Self::EcPem(pem.into())
    }

    /// An Ed25519 public key in PEM format.
    pub fn ed_pem(pem: impl Into<Vec<u8>>) -> Self {
        Self::EdPem(pem.into())
    }

    /// Build the `jsonwebtoken` decoding key.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM data or RSA components are invalid.
    pub fn decoding_key(&self) -> Result<DecodingKey, jsonwebtoken::errors::Error> {
        match self {
            Self::Secret(secret) => Ok(DecodingKey::from_secret(secret)),
            Self::RsaPem(pem) => DecodingKey::from_rsa_pem(pem),
            Self::RsaComponents { n, e } => DecodingKey::from_rsa_components(n, e),
            Self::EcPem(pem) => DecodingKey::from_ec_pem(pem),
            Self::EdPem(pem) => DecodingKey::from_ed_pem(pem),
        }
    }

    /// Algorithms accepted with this key when none are configured.
    #[must_use]
    pub const fn default_algorithms(&self) -> &'static [Algorithm] {
        match self {
            Self::Secret(_) => HMAC_ALGORITHMS,
            Self::RsaPem(_) | Self::RsaComponents { .. } => RSA_ALGORITHMS,
            Self::EcPem(_) => EC_ALGORITHMS,
            Self::EdPem(_) => ED_ALGORITHMS,
        }
    }
}

/// Resolves the key for a token, possibly per request.
///
/// Implemented for closures returning a `'static` future:
///
/// ```rust
/// use jwt_strategy::{SecretOrKey, SecretOrKeyError, SecretOrKeyProvider};
///
/// fn provider() -> impl SecretOrKeyProvider {
///     |_request: &jwt_strategy::Request, raw_token: &str| {
///         let tenant = raw_token.len() % 2;
///         async move {
///             match tenant {
///                 0 => Ok(SecretOrKey::secret("even-secret")),
///                 _ => Err(SecretOrKeyError::msg("unknown tenant")),
///             }
///         }
///     }
/// }
/// # let _ = provider();
/// ```
pub trait SecretOrKeyProvider: Send + Sync {
    /// Resolve the key for `raw_token`.
    fn secret_or_key<'a>(
        &'a self,
        request: &'a Request,
        raw_token: &'a str,
    ) -> BoxFuture<'a, Result<SecretOrKey, SecretOrKeyError>>;
}

impl<F, Fut> SecretOrKeyProvider for F
where
    F: Fn(&Request, &str) -> Fut + Send + Sync,
    Fut: Future<Output = Result<SecretOrKey, SecretOrKeyError>> + Send + 'static,
{
    fn secret_or_key<'a>(
        &'a self,
        request: &'a Request,
        raw_token: &'a str,
    ) -> BoxFuture<'a, Result<SecretOrKey, SecretOrKeyError>> {
        Box::pin(self(request, raw_token))
    }
}

/// Where the strategy gets its key from: exactly one of a fixed key or a provider.
#[derive(Clone)]
pub(crate) enum KeySource {
    Static(SecretOrKey),
    Provider(Arc<dyn SecretOrKeyProvider>),
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(key) => f.debug_tuple("Static").field(key).finish(),
            Self::Provider(_) => f.write_str("Provider"),
        }
    }
}

impl KeySource {
    pub(crate) async fn resolve(
        &self,
        request: &Request,
        raw_token: &str,
    ) -> Result<SecretOrKey, SecretOrKeyError> {
        match self {
            Self::Static(key) => Ok(key.clone()),
            Self::Provider(provider) => provider.secret_or_key(request, raw_token).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::Algorithm;

    use super::{KeySource, SecretOrKey, SecretOrKeyProvider};
    use crate::{error::SecretOrKeyError, Body, Request};

    #[test]
    fn debug_hides_key_material() {
        let key = SecretOrKey::secret("super-secret");
        let printed = format!("{key:?}");
        assert!(!printed.contains("super"));
        assert!(printed.contains("Secret"));
    }

    #[test]
    fn default_algorithms_follow_key_family() {
        assert!(SecretOrKey::secret("s")
            .default_algorithms()
            .contains(&Algorithm::HS256));
        assert!(SecretOrKey::rsa_pem("pem")
            .default_algorithms()
            .contains(&Algorithm::PS256));
        assert_eq!(
            SecretOrKey::ed_pem("pem").default_algorithms(),
            &[Algorithm::EdDSA]
        );
    }

    #[test]
    fn invalid_pem_is_an_error() {
        assert!(SecretOrKey::rsa_pem("not a pem").decoding_key().is_err());
        assert!(SecretOrKey::secret("fine").decoding_key().is_ok());
    }

    #[tokio::test]
    async fn static_source_returns_the_key() {
        let source = KeySource::Static(SecretOrKey::secret("s"));
        let request = Request::new(Body::empty());
        let key = source.resolve(&request, "token").await.unwrap();
        assert_eq!(key, SecretOrKey::secret("s"));
    }

    #[tokio::test]
    async fn closures_are_providers() {
        let provider = |_: &Request, token: &str| {
            let found = token == "known";
            async move {
                if found {
                    Ok(SecretOrKey::secret("k"))
                } else {
                    Err(SecretOrKeyError::msg("unknown kid"))
                }
            }
        };
        let request = Request::new(Body::empty());

        assert!(provider.secret_or_key(&request, "known").await.is_ok());
        let error = provider
            .secret_or_key(&request, "other")
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "unknown kid");
    }
}
