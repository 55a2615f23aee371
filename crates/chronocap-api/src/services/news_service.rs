//! News feed.

use std::sync::Arc;

use tracing::info;

use chronocap_core::{
    calculate_pagination_data, CreateNewsRequest, Error, ListNewsResponse, News, NewsRepository,
    Result,
};

use super::{parse_record_id, to_i64, AuthUser};
use crate::query_types::NewsQueryParse;

const NOT_FOUND: &str = "News not found";

fn not_found() -> Error {
    Error::NotFound(NOT_FOUND.to_string())
}

#[derive(Clone)]
pub struct NewsService {
    repo: Arc<dyn NewsRepository>,
}

impl NewsService {
    pub fn new(repo: Arc<dyn NewsRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, parsed: &NewsQueryParse) -> Result<ListNewsResponse> {
        let query = &parsed.query;
        let page = to_i64(query.page);
        let per_page = to_i64(query.per_page);

        if parsed.unsatisfiable {
            return Ok(ListNewsResponse {
                pagination: calculate_pagination_data(0, page, per_page),
                news: Vec::new(),
            });
        }

        let (total, news) = tokio::try_join!(self.repo.count(query), self.repo.find(query))?;
        Ok(ListNewsResponse {
            pagination: calculate_pagination_data(to_i64(total), page, per_page),
            news,
        })
    }

    pub async fn get(&self, id: &str) -> Result<News> {
        let id = parse_record_id(id).ok_or_else(not_found)?;
        self.repo.fetch(id).await?.ok_or_else(not_found)
    }

    /// Publish a news item. Missing author fields come from the caller.
    pub async fn create(&self, request: CreateNewsRequest, caller: &AuthUser) -> Result<News> {
        let caller_id = caller.user.id.to_string();
        let new = request.validate(Some(&caller_id), caller.account_type)?;
        let news = self.repo.insert(new).await?;
        info!(
            subsystem = "api",
            component = "news",
            op = "create",
            news_id = %news.id,
            user_id = %caller.user.id,
            "News published"
        );
        Ok(news)
    }

    pub async fn delete(&self, id: &str) -> Result<News> {
        let id = parse_record_id(id).ok_or_else(not_found)?;
        let news = self.repo.delete(id).await?.ok_or_else(not_found)?;
        info!(subsystem = "api", component = "news", op = "delete", news_id = %news.id, "News deleted");
        Ok(news)
    }
}
