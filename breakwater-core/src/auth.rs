//! HS256 token minting and role extraction.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::error::{Error, Result};

/// Mints an HS256 token whose only claim is `role` (omitted when empty).
///
/// # Errors
/// - [`Error::Backend`] when signing fails
pub fn mint_token(secret: &str, role: &str) -> Result<String> {
    let mut claims = serde_json::Map::new();
    if !role.is_empty() {
        claims.insert("role".to_string(), serde_json::Value::from(role));
    }
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Backend(format!("failed to sign token: {e}")))
}

/// Validates `token` against `secret` and returns its `role` claim, or an
/// empty string when the claim is absent.
///
/// Only HMAC signing methods are accepted. Tokens are minted without
/// expiry, so `exp` is not required.
///
/// # Errors
/// - [`Error::SigningMethod`] for non-HMAC algorithms
/// - [`Error::TokenParse`] for malformed or mis-signed tokens
pub fn token_role(token: &str, secret: &str) -> Result<String> {
    let header = jsonwebtoken::decode_header(token).map_err(|e| Error::TokenParse {
        reason: e.to_string(),
    })?;
    if !matches!(
        header.alg,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    ) {
        return Err(Error::SigningMethod {
            alg: format!("{:?}", header.alg),
        });
    }
    let mut validation = Validation::new(header.alg);
    validation.required_spec_claims = Default::default();
    validation.validate_exp = false;
    let data = jsonwebtoken::decode::<serde_json::Value>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| Error::TokenParse {
        reason: e.to_string(),
    })?;
    Ok(data
        .claims
        .get("role")
        .and_then(|value| value.as_str())
        .unwrap_or_default()
        .to_string())
}
