//! Positional parameters for dynamically built SQL.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A value bound to a `$N` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Uuid(Uuid),
    BigInt(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
    String(String),
}

/// Collects parameters and hands out their placeholders.
#[derive(Debug, Default)]
pub struct ParamList {
    params: Vec<QueryParam>,
}

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter and return its placeholder (`$1`, `$2`, ...).
    pub fn push(&mut self, param: QueryParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn into_inner(self) -> Vec<QueryParam> {
        self.params
    }
}

/// Bind every [`QueryParam`] in order onto a `sqlx::query`.
#[macro_export]
macro_rules! bind_query_params {
    ($query:expr, $params:expr) => {{
        let mut q = $query;
        for param in $params {
            q = match param {
                $crate::QueryParam::Uuid(v) => q.bind(*v),
                $crate::QueryParam::BigInt(v) => q.bind(*v),
                $crate::QueryParam::Float(v) => q.bind(*v),
                $crate::QueryParam::Timestamp(v) => q.bind(*v),
                $crate::QueryParam::String(v) => q.bind(v.clone()),
            };
        }
        q
    }};
}

/// Clamp an unsigned count into a Postgres `BIGINT`.
pub fn to_bigint(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_sequential() {
        let mut params = ParamList::new();
        assert_eq!(params.push(QueryParam::BigInt(1)), "$1");
        assert_eq!(params.push(QueryParam::String("x".to_string())), "$2");
        assert_eq!(params.len(), 2);
        assert_eq!(
            params.into_inner(),
            vec![QueryParam::BigInt(1), QueryParam::String("x".to_string())]
        );
    }

    #[test]
    fn test_to_bigint_saturates() {
        assert_eq!(to_bigint(5), 5);
        assert_eq!(to_bigint(u64::MAX), i64::MAX);
    }
}
