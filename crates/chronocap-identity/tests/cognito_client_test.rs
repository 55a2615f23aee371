//! Cognito client against a mock HTTP server.

use chronocap_core::{Error, IdentityProvider};
use chronocap_identity::{CognitoConfig, CognitoIdentityProvider};
use jsonwebtoken::{encode, EncodingKey, Header};
use wiremock::matchers::{body_partial_json, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> CognitoIdentityProvider {
    CognitoIdentityProvider::new(
        CognitoConfig::new("eu-central-1", "test-client").with_endpoint(server.uri()),
    )
}

fn target(action: &str) -> String {
    format!("AWSCognitoIdentityProviderService.{}", action)
}

#[tokio::test]
async fn test_sign_up_sends_target_and_reads_sub() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("X-Amz-Target", target("SignUp").as_str()))
        .and(header("Content-Type", "application/x-amz-json-1.1"))
        .and(body_partial_json(serde_json::json!({
            "ClientId": "test-client",
            "Username": "ada@example.com",
            "UserAttributes": [{ "Name": "email", "Value": "ada@example.com" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "UserSub": "sub-123",
            "UserConfirmed": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = provider(&server)
        .register("ada@example.com", "Secret123!")
        .await
        .expect("sign up");
    assert_eq!(outcome.user_sub, "sub-123");
    assert!(!outcome.user_confirmed);
}

#[tokio::test]
async fn test_password_auth_returns_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("X-Amz-Target", target("InitiateAuth").as_str()))
        .and(body_partial_json(serde_json::json!({
            "AuthFlow": "USER_PASSWORD_AUTH",
            "AuthParameters": { "USERNAME": "ada@example.com", "PASSWORD": "pw" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "AuthenticationResult": {
                "AccessToken": "access",
                "IdToken": "id",
                "RefreshToken": "refresh",
                "ExpiresIn": 3600,
                "TokenType": "Bearer"
            }
        })))
        .mount(&server)
        .await;

    let session = provider(&server)
        .authenticate("ada@example.com", "pw")
        .await
        .expect("login");
    assert_eq!(session.access_token, "access");
    assert_eq!(session.id_token, "id");
    assert_eq!(session.refresh_token.as_deref(), Some("refresh"));
}

#[tokio::test]
async fn test_refresh_flow_has_no_new_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "AuthFlow": "REFRESH_TOKEN_AUTH",
            "AuthParameters": { "REFRESH_TOKEN": "refresh" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "AuthenticationResult": { "AccessToken": "access2", "IdToken": "id2" }
        })))
        .mount(&server)
        .await;

    let session = provider(&server).refresh_session("refresh").await.unwrap();
    assert_eq!(session.access_token, "access2");
    assert!(session.refresh_token.is_none());
}

#[tokio::test]
async fn test_not_authorized_maps_to_401() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "__type": "NotAuthorizedException",
            "message": "Incorrect username or password."
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .authenticate("ada@example.com", "wrong")
        .await
        .unwrap_err();
    match err {
        Error::Upstream { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect username or password.");
        }
        other => panic!("Expected Upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_challenge_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ChallengeName": "NEW_PASSWORD_REQUIRED",
            "Session": "abc"
        })))
        .mount(&server)
        .await;

    let err = provider(&server).authenticate("a", "b").await.unwrap_err();
    assert!(err.to_string().contains("NEW_PASSWORD_REQUIRED"));
}

#[tokio::test]
async fn test_get_user_reads_groups_from_token() {
    let server = MockServer::start().await;
    let access_token = encode(
        &Header::default(),
        &serde_json::json!({
            "sub": "sub-123",
            "cognito:groups": ["paidUser"],
            "token_use": "access",
            "exp": 4102444800u64
        }),
        &EncodingKey::from_secret(b"unused"),
    )
    .unwrap();

    Mock::given(method("POST"))
        .and(header("X-Amz-Target", target("GetUser").as_str()))
        .and(body_partial_json(serde_json::json!({ "AccessToken": access_token })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Username": "ada",
            "UserAttributes": [
                { "Name": "sub", "Value": "sub-123" },
                { "Name": "email", "Value": "ada@example.com" }
            ]
        })))
        .mount(&server)
        .await;

    let user = provider(&server).get_user(&access_token).await.unwrap();
    assert_eq!(user.sub, "sub-123");
    assert_eq!(user.username, "ada");
    assert_eq!(user.email.as_deref(), Some("ada@example.com"));
    assert_eq!(user.groups, vec!["paidUser"]);
}

#[tokio::test]
async fn test_empty_success_body_is_ok() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("X-Amz-Target", target("ConfirmSignUp").as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    provider(&server)
        .confirm_registration("ada@example.com", "123456")
        .await
        .expect("confirm");
}
