//! Claims carried by provider-issued tokens.
//!
//! Tokens are decoded here without checking the signature. Callers only use
//! these claims for tokens the provider has already accepted (for example
//! after a successful `GetUser`), never as proof of identity on their own.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use chronocap_core::{Error, Result};

/// Claims read from a Cognito access or id token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "cognito:groups", default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub token_use: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Decode token claims, skipping signature and expiry checks.
pub fn decode_unverified(token: &str) -> Result<TokenClaims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| Error::Unauthorized(format!("Malformed token: {}", e)))
}
