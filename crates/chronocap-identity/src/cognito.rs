//! Amazon Cognito user pool client.
//!
//! Talks to the public (unauthenticated) user pool API: every call is a JSON
//! POST with an `X-Amz-Target` header naming the action. Only app-client
//! operations are used, so no AWS request signing is needed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use chronocap_core::{AuthSession, Error, IdentityProvider, IdentityUser, Result, SignUpOutcome};

use crate::claims::decode_unverified;
use crate::error::to_chronocap_error;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Cognito client configuration.
#[derive(Debug, Clone)]
pub struct CognitoConfig {
    pub region: String,
    /// App client id of the user pool.
    pub client_id: String,
    /// API endpoint; defaults to the regional Cognito endpoint.
    pub endpoint: String,
}

impl CognitoConfig {
    pub fn new(region: impl Into<String>, client_id: impl Into<String>) -> Self {
        let region = region.into();
        let endpoint = regional_endpoint(&region);
        Self {
            region,
            client_id: client_id.into(),
            endpoint,
        }
    }

    /// Point the client at a different endpoint (local emulators, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Create from environment variables.
    ///
    /// - `COGNITO_CLIENT_ID` (required)
    /// - `COGNITO_REGION` (default `us-east-1`)
    /// - `COGNITO_ENDPOINT` (default regional endpoint)
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("COGNITO_CLIENT_ID")
            .map_err(|_| Error::Config("COGNITO_CLIENT_ID is not set".to_string()))?;
        let region =
            std::env::var("COGNITO_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());
        let mut config = Self::new(region, client_id);
        if let Ok(endpoint) = std::env::var("COGNITO_ENDPOINT") {
            if !endpoint.is_empty() {
                config.endpoint = endpoint;
            }
        }
        Ok(config)
    }
}

fn regional_endpoint(region: &str) -> String {
    format!("https://cognito-idp.{}.amazonaws.com/", region)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SignUpResponse {
    user_sub: String,
    #[serde(default)]
    user_confirmed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
    challenge_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    access_token: String,
    id_token: String,
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetUserResponse {
    username: String,
    #[serde(default)]
    user_attributes: Vec<AttributeType>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeType {
    name: String,
    value: Option<String>,
}

/// Cognito-backed [`IdentityProvider`].
#[derive(Clone)]
pub struct CognitoIdentityProvider {
    client: reqwest::Client,
    config: CognitoConfig,
}

impl CognitoIdentityProvider {
    pub fn new(config: CognitoConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(CognitoConfig::from_env()?))
    }

    pub fn config(&self) -> &CognitoConfig {
        &self.config
    }

    /// POST one action and return the parsed JSON body.
    async fn call(&self, action: &str, body: Value) -> Result<Value> {
        debug!(
            subsystem = "identity",
            component = "cognito",
            op = action,
            "Calling identity provider"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .header("X-Amz-Target", format!("{}.{}", TARGET_PREFIX, action))
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let err = to_chronocap_error(status.as_u16(), &text);
            info!(
                subsystem = "identity",
                component = "cognito",
                op = action,
                status = status.as_u16(),
                error = %err,
                "Identity provider rejected request"
            );
            return Err(err);
        }
        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn initiate_auth(&self, flow: &str, parameters: Value) -> Result<AuthSession> {
        let body = json!({
            "AuthFlow": flow,
            "ClientId": self.config.client_id,
            "AuthParameters": parameters,
        });
        let response: InitiateAuthResponse = serde_json::from_value(self.call("InitiateAuth", body).await?)?;
        match (response.authentication_result, response.challenge_name) {
            (Some(result), _) => Ok(AuthSession {
                access_token: result.access_token,
                id_token: result.id_token,
                refresh_token: result.refresh_token,
            }),
            (None, Some(challenge)) => Err(Error::upstream(
                403,
                format!("Authentication challenge {} is not supported", challenge),
            )),
            (None, None) => Err(Error::upstream(
                502,
                "Identity provider returned no authentication result",
            )),
        }
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    #[instrument(skip(self, password), fields(subsystem = "identity", component = "cognito", op = "sign_up"))]
    async fn register(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let body = json!({
            "ClientId": self.config.client_id,
            "Username": email,
            "Password": password,
            "UserAttributes": [AttributeType { name: "email".to_string(), value: Some(email.to_string()) }],
        });
        let response: SignUpResponse = serde_json::from_value(self.call("SignUp", body).await?)?;
        Ok(SignUpOutcome {
            user_sub: response.user_sub,
            user_confirmed: response.user_confirmed,
        })
    }

    #[instrument(skip(self, password), fields(subsystem = "identity", component = "cognito", op = "authenticate"))]
    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.initiate_auth(
            "USER_PASSWORD_AUTH",
            json!({ "USERNAME": email, "PASSWORD": password }),
        )
        .await
    }

    #[instrument(skip_all, fields(subsystem = "identity", component = "cognito", op = "refresh"))]
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession> {
        self.initiate_auth(
            "REFRESH_TOKEN_AUTH",
            json!({ "REFRESH_TOKEN": refresh_token }),
        )
        .await
    }

    #[instrument(skip(self), fields(subsystem = "identity", component = "cognito", op = "forgot_password"))]
    async fn forgot_password(&self, email: &str) -> Result<()> {
        let body = json!({ "ClientId": self.config.client_id, "Username": email });
        self.call("ForgotPassword", body).await?;
        Ok(())
    }

    #[instrument(skip(self, code, new_password), fields(subsystem = "identity", component = "cognito", op = "confirm_password"))]
    async fn confirm_password(&self, email: &str, code: &str, new_password: &str) -> Result<()> {
        let body = json!({
            "ClientId": self.config.client_id,
            "Username": email,
            "ConfirmationCode": code,
            "Password": new_password,
        });
        self.call("ConfirmForgotPassword", body).await?;
        Ok(())
    }

    #[instrument(skip(self, code), fields(subsystem = "identity", component = "cognito", op = "confirm_sign_up"))]
    async fn confirm_registration(&self, email: &str, code: &str) -> Result<()> {
        let body = json!({
            "ClientId": self.config.client_id,
            "Username": email,
            "ConfirmationCode": code,
        });
        self.call("ConfirmSignUp", body).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(subsystem = "identity", component = "cognito", op = "get_user"))]
    async fn get_user(&self, access_token: &str) -> Result<IdentityUser> {
        let body = json!({ "AccessToken": access_token });
        let response: GetUserResponse = serde_json::from_value(self.call("GetUser", body).await?)?;

        let attribute = |name: &str| {
            response
                .user_attributes
                .iter()
                .find(|a| a.name == name)
                .and_then(|a| a.value.clone())
        };
        // The provider accepted the token, so its claims can be trusted.
        let claims = decode_unverified(access_token)?;
        let sub = attribute("sub").unwrap_or_else(|| claims.sub.clone());

        Ok(IdentityUser {
            sub,
            username: response.username.clone(),
            email: attribute("email"),
            groups: claims.groups,
        })
    }

    #[instrument(skip_all, fields(subsystem = "identity", component = "cognito", op = "sign_out"))]
    async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.call("GlobalSignOut", json!({ "AccessToken": access_token }))
            .await?;
        Ok(())
    }
}
