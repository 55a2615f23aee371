//! News repository backed by PostgreSQL.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use chronocap_core::{
    new_v7, Error, NewNews, News, NewsQuery, NewsRepository, Result,
};

use crate::escape_like;
use crate::query_param::{to_bigint, ParamList, QueryParam};

const NEWS_COLUMNS: &str =
    "id, user_id, news_type, type_account, topic, text, files, created_at, updated_at";

/// Build the WHERE clause for a news query, or an empty string.
fn build_where_clause(query: &NewsQuery, params: &mut ParamList) -> String {
    let filter = &query.filter;
    let mut conditions = Vec::new();

    if let Some(topic) = &filter.topic {
        let p = params.push(QueryParam::String(format!("%{}%", escape_like(topic))));
        conditions.push(format!("topic ILIKE {}", p));
    }
    if let Some(account) = filter.type_account {
        let p = params.push(QueryParam::String(account.as_str().to_string()));
        conditions.push(format!("type_account = {}", p));
    }
    if let Some(user_id) = &filter.user_id {
        let p = params.push(QueryParam::String(user_id.clone()));
        conditions.push(format!("user_id = {}", p));
    }
    if let Some(news_type) = filter.news_type {
        let p = params.push(QueryParam::String(news_type.as_str().to_string()));
        conditions.push(format!("news_type = {}", p));
    }

    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

fn build_order_clause(query: &NewsQuery) -> String {
    format!(
        " ORDER BY {} {}, id ASC",
        query.sort_field.column(),
        query.sort_direction.as_sql()
    )
}

fn map_row_to_news(row: &sqlx::postgres::PgRow) -> Result<News> {
    let news_type: String = row.get("news_type");
    let type_account: String = row.get("type_account");
    Ok(News {
        id: row.get("id"),
        user_id: row.get("user_id"),
        news_type: news_type
            .parse()
            .map_err(|_| Error::Internal(format!("Stored news type `{}` is unknown", news_type)))?,
        type_account: type_account.parse().map_err(|_| {
            Error::Internal(format!("Stored account type `{}` is unknown", type_account))
        })?,
        topic: row.get("topic"),
        text: row.get("text"),
        files: row.get("files"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// PostgreSQL news repository.
#[derive(Clone)]
pub struct PgNewsRepository {
    pool: Pool<Postgres>,
}

impl PgNewsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NewsRepository for PgNewsRepository {
    async fn count(&self, query: &NewsQuery) -> Result<u64> {
        let mut params = ParamList::new();
        let where_clause = build_where_clause(query, &mut params);
        let sql = format!("SELECT COUNT(*) AS count FROM news{}", where_clause);
        let params = params.into_inner();

        let row = crate::bind_query_params!(sqlx::query(&sql), &params)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        let count: i64 = row.get("count");
        Ok(count.max(0) as u64)
    }

    async fn find(&self, query: &NewsQuery) -> Result<Vec<News>> {
        let mut params = ParamList::new();
        let where_clause = build_where_clause(query, &mut params);
        let offset = params.push(QueryParam::BigInt(to_bigint(query.offset())));
        let limit = params.push(QueryParam::BigInt(to_bigint(query.per_page)));
        let sql = format!(
            "SELECT {} FROM news{}{} OFFSET {} LIMIT {}",
            NEWS_COLUMNS,
            where_clause,
            build_order_clause(query),
            offset,
            limit
        );
        let params = params.into_inner();

        debug!(
            subsystem = "database",
            component = "news",
            op = "find",
            sql = %sql,
            "Listing news"
        );

        let rows = crate::bind_query_params!(sqlx::query(&sql), &params)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        rows.iter().map(map_row_to_news).collect()
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<News>> {
        let sql = format!("SELECT {} FROM news WHERE id = $1", NEWS_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        row.as_ref().map(map_row_to_news).transpose()
    }

    async fn insert(&self, news: NewNews) -> Result<News> {
        let sql = format!(
            "INSERT INTO news (id, user_id, news_type, type_account, topic, text, files) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            NEWS_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(new_v7())
            .bind(&news.user_id)
            .bind(news.news_type.as_str())
            .bind(news.type_account.as_str())
            .bind(&news.topic)
            .bind(&news.text)
            .bind(news.files)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        map_row_to_news(&row)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<News>> {
        let sql = format!("DELETE FROM news WHERE id = $1 RETURNING {}", NEWS_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        row.as_ref().map(map_row_to_news).transpose()
    }
}
