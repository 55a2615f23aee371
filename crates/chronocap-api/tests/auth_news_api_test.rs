//! Authentication, news and award endpoints over HTTP with the mock identity
//! provider.

mod common;

use chronocap_identity::mock::MockIdentityProvider;
use common::TestServer;
use serde_json::{json, Value};

fn set_cookies(res: &reqwest::Response) -> Vec<String> {
    res.headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_login_sets_session_cookies() {
    let server = TestServer::spawn_with(
        MockIdentityProvider::new().with_user("ada@example.com", "Secret123!", &["paidUser"]),
    )
    .await;

    let res = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": "ada@example.com", "password": "Secret123!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let cookies = set_cookies(&res);
    assert_eq!(cookies.len(), 3);
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=mock-refresh-")));
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=mock-access-")));
    assert!(cookies.iter().any(|c| c.starts_with("sessionId=mock-id-")));
    assert!(cookies.iter().all(|c| c.contains("HttpOnly") && c.contains("SameSite=Strict")));

    let body: Value = res.json().await.unwrap();
    assert!(body["accessToken"].as_str().unwrap().starts_with("mock-access-"));
    // Account exists only at the provider, so there is no local profile.
    assert!(body["user"].is_null());
}

#[tokio::test]
async fn test_wrong_password_forwards_provider_status() {
    let server = TestServer::spawn_with(
        MockIdentityProvider::new().with_user("ada@example.com", "Secret123!", &[]),
    )
    .await;

    let res = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": "ada@example.com", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Incorrect username or password.");
}

#[tokio::test]
async fn test_refresh_reads_cookie() {
    let server = TestServer::spawn_with(
        MockIdentityProvider::new().with_user("ada@example.com", "Secret123!", &[]),
    )
    .await;

    let res = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": "ada@example.com", "password": "Secret123!" }))
        .send()
        .await
        .unwrap();
    let refresh = set_cookies(&res)
        .into_iter()
        .find(|c| c.starts_with("refreshToken="))
        .unwrap();
    let pair = refresh.split(';').next().unwrap().to_string();

    let res = server
        .client
        .post(server.url("/auth/refresh"))
        .header("cookie", pair)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let cookies = set_cookies(&res);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| !c.starts_with("refreshToken=")));
}

#[tokio::test]
async fn test_refresh_without_token_is_401() {
    let server = TestServer::spawn().await;
    let res = server
        .client
        .post(server.url("/auth/refresh"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn test_logout_clears_cookies_and_revokes() {
    let server = TestServer::spawn().await;
    let (token, _) = server.signed_in_user("ada@example.com").await;

    let res = server
        .client
        .post(server.url("/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let cookies = set_cookies(&res);
    assert_eq!(cookies.len(), 3);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    assert_eq!(server.provider.call_count("sign_out"), 1);

    // The revoked token no longer authenticates.
    let res = server
        .client
        .post(server.url("/news"))
        .bearer_auth(&token)
        .json(&json!({ "type": "news", "topic": "t", "text": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let server = TestServer::spawn().await;
    server.signed_in_user("ada@example.com").await;

    let res = server
        .client
        .post(server.url("/auth/reset/request"))
        .json(&json!({ "email": "ada@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = server
        .client
        .post(server.url("/auth/reset/confirm"))
        .json(&json!({
            "email": "ada@example.com",
            "code": chronocap_identity::mock::MOCK_CONFIRMATION_CODE,
            "newPassword": "NewSecret456!"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Password successfully reset");

    let res = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": "ada@example.com", "password": "NewSecret456!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_protected_route_messages() {
    let server = TestServer::spawn().await;
    let body = json!({ "type": "news", "topic": "t", "text": "x" });

    let res = server.client.post(server.url("/news")).json(&body).send().await.unwrap();
    assert_eq!(res.status(), 401);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["message"], "Please provide Authorization header");

    let res = server
        .client
        .post(server.url("/news"))
        .header("authorization", "Token abc")
        .json(&body)
        .send()
        .await
        .unwrap();
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["message"], "Auth header should be of type Bearer");

    let res = server
        .client
        .post(server.url("/news"))
        .bearer_auth("forged")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["message"], "Invalid token");
}

#[tokio::test]
async fn test_news_create_list_delete() {
    let server = TestServer::spawn().await;
    let (token, user_id) = server.signed_in_user("ada@example.com").await;

    for (topic, kind) in [("Spring launch", "news"), ("Our story", "video stories")] {
        let res = server
            .client
            .post(server.url("/news"))
            .bearer_auth(&token)
            .json(&json!({ "type": kind, "typeAccount": "agencyUser", "topic": topic, "text": "..." }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let created: Value = res.json().await.unwrap();
        assert_eq!(created["userId"], user_id.as_str());
    }

    let body: Value = server
        .client
        .get(server.url("/news?type=video%20stories"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalItems"], 1);
    assert_eq!(body["news"][0]["topic"], "Our story");

    let body: Value = server
        .client
        .get(server.url("/news?sortField=topic&sortOrder=asc"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalItems"], 2);
    assert_eq!(body["news"][0]["topic"], "Our story");
    let id = body["news"][0]["_id"].as_str().unwrap().to_string();

    let res = server
        .client
        .get(server.url(&format!("/news/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = server
        .client
        .delete(server.url(&format!("/news/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = server
        .client
        .get(server.url(&format!("/news/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["message"], "News not found");
}

#[tokio::test]
async fn test_news_without_account_type_is_rejected() {
    // No provider group and no typeAccount in the body.
    let server = TestServer::spawn().await;
    let (token, _) = server.signed_in_user("ada@example.com").await;

    let res = server
        .client
        .post(server.url("/news"))
        .bearer_auth(&token)
        .json(&json!({ "type": "news", "topic": "t", "text": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["message"], "typeAccount is required");
}

#[tokio::test]
async fn test_awards_have_set_semantics() {
    let server = TestServer::spawn().await;
    let (token, user_id) = server.signed_in_user("ada@example.com").await;
    let url = server.url(&format!("/users/{}/awards", user_id));

    for award in ["first-capsule", " first-capsule "] {
        let res = server
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&json!({ "awardId": award }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
    }
    let user: Value = server
        .client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "awardId": "explorer" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(user["awards"], json!(["first-capsule", "explorer"]));

    let res = server
        .client
        .post(server.url("/users/not-an-id/awards"))
        .bearer_auth(&token)
        .json(&json!({ "awardId": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["message"], "Invalid user id");

    let res = server
        .client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "awardId": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
}
