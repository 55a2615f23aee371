//! In-memory repositories.
//!
//! Capsule pipelines run through [`Pipeline::run`], so results match the
//! Postgres compiler stage for stage. Used for `STORAGE_BACKEND=memory` and
//! in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use chronocap_core::defaults::DEFAULT_USER_NAME;
use chronocap_core::{
    new_v7, Capsule, CapsuleHit, CapsulePatch, CapsuleRepository, Error, NewCapsule, NewNews,
    NewUser, News, NewsQuery, NewsRepository, Pipeline, PipelineOutput, Result, User,
    UserRepository,
};

/// Capsules held in a map keyed by id.
#[derive(Default)]
pub struct MemoryCapsuleRepository {
    capsules: RwLock<HashMap<Uuid, Capsule>>,
}

impl MemoryCapsuleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn run(&self, pipeline: &Pipeline) -> PipelineOutput {
        let docs: Vec<CapsuleHit> = self
            .capsules
            .read()
            .await
            .values()
            .cloned()
            .map(CapsuleHit::from)
            .collect();
        pipeline.run(docs)
    }
}

#[async_trait]
impl CapsuleRepository for MemoryCapsuleRepository {
    async fn count(&self, pipeline: &Pipeline) -> Result<u64> {
        match self.run(pipeline).await {
            PipelineOutput::Count(n) => Ok(n),
            PipelineOutput::Documents(_) => Err(Error::Internal(
                "count called with a pipeline that does not end in a count stage".to_string(),
            )),
        }
    }

    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<CapsuleHit>> {
        match self.run(pipeline).await {
            PipelineOutput::Documents(docs) => Ok(docs),
            PipelineOutput::Count(_) => Err(Error::Internal(
                "aggregate called with a count pipeline".to_string(),
            )),
        }
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Capsule>> {
        Ok(self.capsules.read().await.get(&id).cloned())
    }

    async fn insert(&self, capsule: NewCapsule) -> Result<Capsule> {
        let now = Utc::now();
        let stored = Capsule {
            id: new_v7(),
            user_id: capsule.user_id,
            location: capsule.location,
            time_to_open: capsule.time_to_open,
            message: capsule.message,
            media: capsule.media,
            files: capsule.files,
            created_at: now,
            updated_at: now,
        };
        self.capsules.write().await.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: Uuid, patch: CapsulePatch) -> Result<Option<Capsule>> {
        let mut capsules = self.capsules.write().await;
        Ok(capsules.get_mut(&id).map(|capsule| {
            patch.apply(capsule, Utc::now());
            capsule.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Capsule>> {
        Ok(self.capsules.write().await.remove(&id))
    }
}

/// News items held in a map keyed by id.
#[derive(Default)]
pub struct MemoryNewsRepository {
    news: RwLock<HashMap<Uuid, News>>,
}

impl MemoryNewsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NewsRepository for MemoryNewsRepository {
    async fn count(&self, query: &NewsQuery) -> Result<u64> {
        let news = self.news.read().await;
        Ok(news.values().filter(|n| query.filter.matches(n)).count() as u64)
    }

    async fn find(&self, query: &NewsQuery) -> Result<Vec<News>> {
        let mut items: Vec<News> = self
            .news
            .read()
            .await
            .values()
            .filter(|n| query.filter.matches(n))
            .cloned()
            .collect();
        query.sort(&mut items);
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.per_page).unwrap_or(usize::MAX);
        Ok(items.into_iter().skip(offset).take(limit).collect())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<News>> {
        Ok(self.news.read().await.get(&id).cloned())
    }

    async fn insert(&self, news: NewNews) -> Result<News> {
        let now = Utc::now();
        let stored = News {
            id: new_v7(),
            user_id: news.user_id,
            news_type: news.news_type,
            type_account: news.type_account,
            topic: news.topic,
            text: news.text,
            files: news.files,
            created_at: now,
            updated_at: now,
        };
        self.news.write().await.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<News>> {
        Ok(self.news.write().await.remove(&id))
    }
}

/// Users held in a map keyed by id.
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.cognito_sub == user.cognito_sub || u.nickname == user.nickname)
        {
            return Err(Error::Conflict("User already exists".to_string()));
        }
        let stored = User {
            id: new_v7(),
            cognito_sub: user.cognito_sub,
            nickname: user.nickname,
            name: user.name.unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
            avatar: user.avatar.unwrap_or_default(),
            awards: Vec::new(),
        };
        users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_cognito_sub(&self, sub: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.cognito_sub == sub)
            .cloned())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn add_award(&self, id: Uuid, award_id: &str) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            if !user.awards.iter().any(|a| a == award_id) {
                user.awards.push(award_id.to_string());
            }
            user.clone()
        }))
    }
}
