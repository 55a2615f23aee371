//! News list filters and sorting.

use crate::defaults::{DEFAULT_PAGE, DEFAULT_PER_PAGE};
use crate::models::{AccountType, News, NewsType};
use crate::pipeline::SortDirection;

/// Fields news lists can be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsSortField {
    CreatedAt,
    UpdatedAt,
    Topic,
    Type,
    TypeAccount,
}

impl NewsSortField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            "topic" => Some(Self::Topic),
            "type" => Some(Self::Type),
            "typeAccount" => Some(Self::TypeAccount),
            _ => None,
        }
    }

    /// Column name in the `news` table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Topic => "topic",
            Self::Type => "news_type",
            Self::TypeAccount => "type_account",
        }
    }
}

/// Normalized news filter criteria.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsFilter {
    /// Case-insensitive substring of the topic.
    pub topic: Option<String>,
    pub type_account: Option<AccountType>,
    pub user_id: Option<String>,
    pub news_type: Option<NewsType>,
}

impl NewsFilter {
    pub fn matches(&self, news: &News) -> bool {
        if let Some(topic) = &self.topic {
            if !news.topic.to_lowercase().contains(&topic.to_lowercase()) {
                return false;
            }
        }
        if let Some(account) = self.type_account {
            if news.type_account != account {
                return false;
            }
        }
        if let Some(user_id) = &self.user_id {
            if news.user_id != *user_id {
                return false;
            }
        }
        if let Some(news_type) = self.news_type {
            if news.news_type != news_type {
                return false;
            }
        }
        true
    }
}

/// A news list request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsQuery {
    pub filter: NewsFilter,
    pub page: u64,
    pub per_page: u64,
    pub sort_field: NewsSortField,
    pub sort_direction: SortDirection,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            filter: NewsFilter::default(),
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            sort_field: NewsSortField::CreatedAt,
            sort_direction: SortDirection::Descending,
        }
    }
}

impl NewsQuery {
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// Sort in place the way the SQL `ORDER BY` does, ties broken by id.
    pub fn sort(&self, items: &mut [News]) {
        items.sort_by(|a, b| {
            let ord = match self.sort_field {
                NewsSortField::CreatedAt => a.created_at.cmp(&b.created_at),
                NewsSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                NewsSortField::Topic => a.topic.cmp(&b.topic),
                NewsSortField::Type => a.news_type.as_str().cmp(b.news_type.as_str()),
                NewsSortField::TypeAccount => a.type_account.as_str().cmp(b.type_account.as_str()),
            };
            let ord = match self.sort_direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            };
            ord.then_with(|| a.id.cmp(&b.id))
        });
    }
}
