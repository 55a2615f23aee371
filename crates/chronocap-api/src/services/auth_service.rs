//! Registration, login and password flows against the identity provider.
//!
//! Passwords only ever travel to the provider. The local user table keeps the
//! provider subject so that access tokens can be mapped back to a profile.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use chronocap_core::{
    AccountType, AuthSession, Error, IdentityProvider, NewUser, Result, User, UserRepository,
};

/// Authenticated caller resolved from a bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user: User,
    /// First identity-provider group, when it names an account type.
    pub account_type: Option<AccountType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
    /// Requested account group. Assigning groups needs administrator
    /// credentials, so the value is only logged.
    pub group: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetRequest {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetConfirmRequest {
    pub email: Option<String>,
    pub code: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmEmailRequest {
    pub email: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOutcome {
    pub message: String,
    pub user_sub: String,
    pub user_confirmed: bool,
}

/// Tokens plus the local profile behind them, when one exists.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub session: AuthSession,
    pub user: Option<User>,
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::InvalidInput(format!("{} is required", field)))
}

fn invalid_token() -> Error {
    Error::Unauthorized("Invalid token".to_string())
}

#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn IdentityProvider>, users: Arc<dyn UserRepository>) -> Self {
        Self { provider, users }
    }

    /// Create the provider account and its local profile.
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterOutcome> {
        let email = required(request.email, "email")?;
        let password = request
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::InvalidInput("password is required".to_string()))?;

        let outcome = self.provider.register(&email, &password).await?;

        if let Some(group) = request.group.as_deref().filter(|g| !g.is_empty()) {
            warn!(
                subsystem = "api",
                component = "auth",
                op = "register",
                group,
                "Group assignment is not available to app clients; ignoring"
            );
        }

        let new_user = NewUser {
            cognito_sub: outcome.user_sub.clone(),
            nickname: email.clone(),
            name: request.name.filter(|n| !n.trim().is_empty()),
            avatar: request.avatar,
        };
        match self.users.insert(new_user).await {
            Ok(user) => info!(
                subsystem = "api",
                component = "auth",
                op = "register",
                user_id = %user.id,
                "User registered"
            ),
            Err(Error::Conflict(_)) => warn!(
                subsystem = "api",
                component = "auth",
                op = "register",
                "Local profile already exists for registered account"
            ),
            Err(e) => return Err(e),
        }

        Ok(RegisterOutcome {
            message: "User registered successfully".to_string(),
            user_sub: outcome.user_sub,
            user_confirmed: outcome.user_confirmed,
        })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome> {
        let email = required(request.email, "email")?;
        let password = request
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::InvalidInput("password is required".to_string()))?;

        let session = self.provider.authenticate(&email, &password).await?;
        let user = self.local_user(&session.access_token).await;
        Ok(LoginOutcome { session, user })
    }

    /// Exchange a refresh token for new access and id tokens.
    pub async fn refresh(&self, refresh_token: Option<String>) -> Result<LoginOutcome> {
        let refresh_token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Unauthorized("Refresh token is required".to_string()))?;
        let session = self.provider.refresh_session(&refresh_token).await?;
        let user = self.local_user(&session.access_token).await;
        Ok(LoginOutcome { session, user })
    }

    /// Revoke the caller's tokens. A token the provider no longer accepts
    /// already counts as logged out.
    pub async fn logout(&self, access_token: Option<&str>) -> Result<()> {
        let Some(token) = access_token.filter(|t| !t.is_empty()) else {
            debug!(subsystem = "api", component = "auth", op = "logout", "No session to revoke");
            return Ok(());
        };
        match self.provider.sign_out(token).await {
            Ok(()) => Ok(()),
            Err(Error::Upstream { status: 401, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn request_password_reset(&self, request: ResetRequest) -> Result<()> {
        let email = required(request.email, "email")?;
        self.provider.forgot_password(&email).await
    }

    pub async fn confirm_password_reset(&self, request: ResetConfirmRequest) -> Result<()> {
        let email = required(request.email, "email")?;
        let code = required(request.code, "code")?;
        let new_password = request
            .new_password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::InvalidInput("newPassword is required".to_string()))?;
        self.provider
            .confirm_password(&email, &code, &new_password)
            .await
    }

    pub async fn confirm_email(&self, request: ConfirmEmailRequest) -> Result<()> {
        let email = required(request.email, "email")?;
        let code = required(request.code, "code")?;
        self.provider.confirm_registration(&email, &code).await
    }

    /// Map an access token to the local user. Any failure is `Invalid token`.
    pub async fn resolve_access_token(&self, access_token: &str) -> Result<AuthUser> {
        let identity = match self.provider.get_user(access_token).await {
            Ok(identity) => identity,
            Err(e) => {
                debug!(subsystem = "api", component = "auth", error = %e, "Token rejected");
                return Err(invalid_token());
            }
        };
        let user = self
            .users
            .find_by_cognito_sub(&identity.sub)
            .await?
            .ok_or_else(invalid_token)?;
        Ok(AuthUser {
            account_type: identity.account_type(),
            user,
        })
    }

    async fn local_user(&self, access_token: &str) -> Option<User> {
        match self.resolve_access_token(access_token).await {
            Ok(auth) => Some(auth.user),
            Err(e) => {
                debug!(subsystem = "api", component = "auth", error = %e, "No local profile for session");
                None
            }
        }
    }
}
