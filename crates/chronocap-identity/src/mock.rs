//! Mock identity provider for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chronocap_identity::mock::MockIdentityProvider;
//!
//! let provider = MockIdentityProvider::new()
//!     .with_user("ada@example.com", "secret", &["paidUser"]);
//! let session = provider.authenticate("ada@example.com", "secret").await?;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use chronocap_core::{AuthSession, Error, IdentityProvider, IdentityUser, Result, SignUpOutcome};

/// Code accepted by `confirm_registration` and `confirm_password`.
pub const MOCK_CONFIRMATION_CODE: &str = "123456";

#[derive(Debug, Clone)]
struct MockAccount {
    sub: String,
    password: String,
    confirmed: bool,
    groups: Vec<String>,
}

#[derive(Debug, Default)]
struct MockState {
    accounts: HashMap<String, MockAccount>,
    /// access token -> email
    access_tokens: HashMap<String, String>,
    /// refresh token -> email
    refresh_tokens: HashMap<String, String>,
    issued: u64,
    calls: Vec<MockCall>,
    auto_confirm: bool,
}

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

/// In-process [`IdentityProvider`] with scripted accounts.
#[derive(Clone, Default)]
pub struct MockIdentityProvider {
    state: Arc<Mutex<MockState>>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a confirmed account.
    pub fn with_user(self, email: &str, password: &str, groups: &[&str]) -> Self {
        self.lock().accounts.insert(
            email.to_string(),
            MockAccount {
                sub: uuid::Uuid::new_v4().to_string(),
                password: password.to_string(),
                confirmed: true,
                groups: groups.iter().map(|g| g.to_string()).collect(),
            },
        );
        self
    }

    /// Confirm new registrations immediately.
    pub fn with_auto_confirm(self) -> Self {
        self.lock().auto_confirm = true;
        self
    }

    /// Subject of a registered account.
    pub fn sub_of(&self, email: &str) -> Option<String> {
        self.lock().accounts.get(email).map(|a| a.sub.clone())
    }

    /// All logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Number of calls for one operation.
    pub fn call_count(&self, operation: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn issue(state: &mut MockState, email: &str, with_refresh: bool) -> AuthSession {
        state.issued += 1;
        let n = state.issued;
        let access_token = format!("mock-access-{}", n);
        state
            .access_tokens
            .insert(access_token.clone(), email.to_string());
        let refresh_token = if with_refresh {
            let token = format!("mock-refresh-{}", n);
            state.refresh_tokens.insert(token.clone(), email.to_string());
            Some(token)
        } else {
            None
        };
        AuthSession {
            access_token,
            id_token: format!("mock-id-{}", n),
            refresh_token,
        }
    }
}

fn record(state: &mut MockState, operation: &str, input: &str) {
    state.calls.push(MockCall {
        operation: operation.to_string(),
        input: input.to_string(),
    });
}

fn not_authorized() -> Error {
    Error::upstream(401, "Incorrect username or password.")
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn register(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let mut state = self.lock();
        record(&mut state, "register", email);
        if state.accounts.contains_key(email) {
            return Err(Error::upstream(409, "User already exists"));
        }
        let sub = uuid::Uuid::new_v4().to_string();
        let confirmed = state.auto_confirm;
        state.accounts.insert(
            email.to_string(),
            MockAccount {
                sub: sub.clone(),
                password: password.to_string(),
                confirmed,
                groups: Vec::new(),
            },
        );
        Ok(SignUpOutcome {
            user_sub: sub,
            user_confirmed: confirmed,
        })
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthSession> {
        let mut state = self.lock();
        record(&mut state, "authenticate", email);
        let account = state.accounts.get(email).cloned().ok_or_else(not_authorized)?;
        if account.password != password {
            return Err(not_authorized());
        }
        if !account.confirmed {
            return Err(Error::upstream(403, "User is not confirmed."));
        }
        Ok(Self::issue(&mut state, email, true))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession> {
        let mut state = self.lock();
        record(&mut state, "refresh_session", "");
        let email = state
            .refresh_tokens
            .get(refresh_token)
            .cloned()
            .ok_or_else(|| Error::upstream(401, "Invalid Refresh Token"))?;
        Ok(Self::issue(&mut state, &email, false))
    }

    async fn forgot_password(&self, email: &str) -> Result<()> {
        let mut state = self.lock();
        record(&mut state, "forgot_password", email);
        if !state.accounts.contains_key(email) {
            return Err(Error::upstream(404, "Username/client id combination not found."));
        }
        Ok(())
    }

    async fn confirm_password(&self, email: &str, code: &str, new_password: &str) -> Result<()> {
        let mut state = self.lock();
        record(&mut state, "confirm_password", email);
        if code != MOCK_CONFIRMATION_CODE {
            return Err(Error::upstream(400, "Invalid verification code provided, please try again."));
        }
        let account = state
            .accounts
            .get_mut(email)
            .ok_or_else(|| Error::upstream(404, "Username/client id combination not found."))?;
        account.password = new_password.to_string();
        Ok(())
    }

    async fn confirm_registration(&self, email: &str, code: &str) -> Result<()> {
        let mut state = self.lock();
        record(&mut state, "confirm_registration", email);
        if code != MOCK_CONFIRMATION_CODE {
            return Err(Error::upstream(400, "Invalid verification code provided, please try again."));
        }
        let account = state
            .accounts
            .get_mut(email)
            .ok_or_else(|| Error::upstream(404, "Username/client id combination not found."))?;
        account.confirmed = true;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<IdentityUser> {
        let mut state = self.lock();
        record(&mut state, "get_user", "");
        let email = state
            .access_tokens
            .get(access_token)
            .cloned()
            .ok_or_else(|| Error::upstream(401, "Invalid Access Token"))?;
        let account = state
            .accounts
            .get(&email)
            .ok_or_else(|| Error::upstream(401, "Invalid Access Token"))?;
        Ok(IdentityUser {
            sub: account.sub.clone(),
            username: email.clone(),
            email: Some(email),
            groups: account.groups.clone(),
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let mut state = self.lock();
        record(&mut state, "sign_out", "");
        let email = state
            .access_tokens
            .remove(access_token)
            .ok_or_else(|| Error::upstream(401, "Invalid Access Token"))?;
        state.access_tokens.retain(|_, e| *e != email);
        state.refresh_tokens.retain(|_, e| *e != email);
        Ok(())
    }
}
