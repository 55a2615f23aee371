//! # chronocap-identity
//!
//! Identity provider implementations for chronocap.
//!
//! - [`CognitoIdentityProvider`]: Amazon Cognito user pool client
//! - [`mock::MockIdentityProvider`]: scripted provider for tests (feature `mock`)

pub mod claims;
pub mod cognito;
pub mod error;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use claims::{decode_unverified, TokenClaims};
pub use cognito::{CognitoConfig, CognitoIdentityProvider};
pub use error::{to_chronocap_error, CognitoErrorCode};
