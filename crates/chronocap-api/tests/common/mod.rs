//! Test server: the full router on an ephemeral port with in-memory storage
//! and the mock identity provider.

#![allow(dead_code)]

use std::sync::Arc;

use chronocap_api::{build_router, config::parse_allowed_origins, AppState, Repositories};
use chronocap_identity::mock::MockIdentityProvider;

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub provider: MockIdentityProvider,
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::spawn_with(MockIdentityProvider::new()).await
    }

    pub async fn spawn_with(provider: MockIdentityProvider) -> Self {
        let state = AppState::new(Repositories::memory(), Arc::new(provider.clone()), false);
        let app = build_router(state, parse_allowed_origins(Some("http://localhost:5173")));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
            provider,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register, confirm and log in; returns the access token and local user id.
    pub async fn signed_in_user(&self, email: &str) -> (String, String) {
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&serde_json::json!({ "email": email, "password": "Secret123!" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 201);

        let res = self
            .client
            .post(self.url("/auth/confirm"))
            .json(&serde_json::json!({
                "email": email,
                "code": chronocap_identity::mock::MOCK_CONFIRMATION_CODE
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);

        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": "Secret123!" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let body: serde_json::Value = res.json().await.unwrap();
        (
            body["accessToken"].as_str().unwrap().to_string(),
            body["user"]["_id"].as_str().unwrap().to_string(),
        )
    }
}

pub fn capsule_body(user: &str, city: &str, lat: f64, lon: f64, opens: &str) -> serde_json::Value {
    serde_json::json!({
        "userId": user,
        "location": { "lat": lat, "lon": lon, "country": "Ukraine", "city": city },
        "timeToOpen": opens,
        "message": format!("hello from {}", city)
    })
}
