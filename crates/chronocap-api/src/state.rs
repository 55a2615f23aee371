//! Shared application state.

use std::sync::Arc;

use chronocap_core::{CapsuleRepository, IdentityProvider, NewsRepository, UserRepository};
use chronocap_db::{Database, MemoryCapsuleRepository, MemoryNewsRepository, MemoryUserRepository};

use crate::services::{AuthService, CapsuleService, NewsService, UserService};

/// Repository handles the services are built from.
#[derive(Clone)]
pub struct Repositories {
    pub capsules: Arc<dyn CapsuleRepository>,
    pub news: Arc<dyn NewsRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool.
    pub fn postgres(db: &Database) -> Self {
        Self {
            capsules: Arc::new(db.capsules.clone()),
            news: Arc::new(db.news.clone()),
            users: Arc::new(db.users.clone()),
        }
    }

    /// Process-local repositories.
    pub fn memory() -> Self {
        Self {
            capsules: Arc::new(MemoryCapsuleRepository::new()),
            news: Arc::new(MemoryNewsRepository::new()),
            users: Arc::new(MemoryUserRepository::new()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub capsules: CapsuleService,
    pub news: NewsService,
    pub users: UserService,
    pub auth: AuthService,
    /// Mark auth cookies `Secure`.
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        identity: Arc<dyn IdentityProvider>,
        cookie_secure: bool,
    ) -> Self {
        Self {
            capsules: CapsuleService::new(repos.capsules),
            news: NewsService::new(repos.news),
            users: UserService::new(repos.users.clone()),
            auth: AuthService::new(identity, repos.users),
            cookie_secure,
        }
    }
}
