//! Capsule repository backed by PostgreSQL.
//!
//! Pipelines are compiled into nested subqueries, one level per stage group,
//! so a count and a page built from the same prefix share identical SQL up to
//! the final level.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use chronocap_core::logging::SLOW_QUERY_THRESHOLD_MS;
use chronocap_core::{
    new_v7, Capsule, CapsuleField, CapsuleHit, CapsulePatch, CapsuleRepository, Error, GeoPoint,
    Location, NewCapsule, Pipeline, Predicate, Result, SortSpec, Stage, EARTH_RADIUS_KM,
};

use crate::escape_like;
use crate::query_param::{to_bigint, ParamList, QueryParam};

/// Stored capsule columns, in select order.
const CAPSULE_COLUMNS: &str = "id, user_id, lat, lon, country, city, time_to_open, message, \
                               media, files, created_at, updated_at";

/// A pipeline compiled to SQL.
#[derive(Debug)]
pub struct CompiledPipeline {
    pub sql: String,
    pub params: Vec<QueryParam>,
    pub is_count: bool,
}

/// One `SELECT` level under construction.
struct Level {
    select: String,
    from: String,
    filters: Vec<String>,
    order: Option<String>,
    offset: Option<String>,
    limit: Option<String>,
    /// Projects a computed column, so WHERE cannot see it at this level.
    computed: bool,
}

impl Level {
    fn base() -> Self {
        Self {
            select: format!("{}, NULL::float8 AS distance", CAPSULE_COLUMNS),
            from: "capsule".to_string(),
            filters: Vec::new(),
            order: None,
            offset: None,
            limit: None,
            computed: false,
        }
    }

    fn over(inner: Level, alias: usize, select: String, computed: bool) -> Self {
        Self {
            select,
            from: format!("({}) s{}", inner.to_sql(), alias),
            filters: Vec::new(),
            order: None,
            offset: None,
            limit: None,
            computed,
        }
    }

    fn windowed(&self) -> bool {
        self.order.is_some() || self.offset.is_some() || self.limit.is_some()
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("SELECT {} FROM {}", self.select, self.from);
        if !self.filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.filters.join(" AND "));
        }
        if let Some(order) = &self.order {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        if let Some(offset) = &self.offset {
            sql.push_str(" OFFSET ");
            sql.push_str(offset);
        }
        if let Some(limit) = &self.limit {
            sql.push_str(" LIMIT ");
            sql.push_str(limit);
        }
        sql
    }
}

/// Compile a pipeline into a single parameterized statement.
pub fn compile_pipeline(pipeline: &Pipeline) -> CompiledPipeline {
    let mut params = ParamList::new();
    let mut level = Level::base();
    let mut depth = 0usize;
    let mut is_count = false;

    let wrap = |level: Level, depth: &mut usize, select: String, computed: bool| {
        *depth += 1;
        Level::over(level, *depth, select, computed)
    };

    for stage in &pipeline.stages {
        match stage {
            Stage::Match(predicates) => {
                if predicates.is_empty() {
                    continue;
                }
                if level.computed || level.windowed() {
                    level = wrap(level, &mut depth, "*".to_string(), false);
                }
                for predicate in predicates {
                    level.filters.push(predicate_sql(predicate, &mut params));
                }
            }
            Stage::AddDistance(origin) => {
                let expr = distance_sql(*origin, &mut params);
                let select = format!("{}, {} AS distance", CAPSULE_COLUMNS, expr);
                level = wrap(level, &mut depth, select, true);
            }
            Stage::Sort(spec) => {
                if level.windowed() {
                    level = wrap(level, &mut depth, "*".to_string(), false);
                }
                level.order = Some(order_sql(spec));
            }
            Stage::Skip(n) => {
                if level.offset.is_some() || level.limit.is_some() {
                    level = wrap(level, &mut depth, "*".to_string(), false);
                }
                level.offset = Some(params.push(QueryParam::BigInt(to_bigint(*n))));
            }
            Stage::Limit(n) => {
                if level.limit.is_some() {
                    level = wrap(level, &mut depth, "*".to_string(), false);
                }
                level.limit = Some(params.push(QueryParam::BigInt(to_bigint(*n))));
            }
            Stage::Count => {
                is_count = true;
                break;
            }
        }
    }

    let sql = if is_count {
        format!("SELECT COUNT(*) AS count FROM ({}) counted", level.to_sql())
    } else {
        level.to_sql()
    };

    CompiledPipeline {
        sql,
        params: params.into_inner(),
        is_count,
    }
}

fn predicate_sql(predicate: &Predicate, params: &mut ParamList) -> String {
    match predicate {
        Predicate::UserIdEquals(id) => {
            format!("user_id = {}", params.push(QueryParam::String(id.clone())))
        }
        Predicate::CountryContains(s) => format!(
            "country ILIKE {}",
            params.push(QueryParam::String(format!("%{}%", escape_like(s))))
        ),
        Predicate::CityContains(s) => format!(
            "city ILIKE {}",
            params.push(QueryParam::String(format!("%{}%", escape_like(s))))
        ),
        Predicate::TimeToOpenAtOrAfter(t) => {
            format!("time_to_open >= {}", params.push(QueryParam::Timestamp(*t)))
        }
        Predicate::TimeToOpenAtOrBefore(t) => {
            format!("time_to_open <= {}", params.push(QueryParam::Timestamp(*t)))
        }
        Predicate::DistanceAtMost(km) => {
            format!("distance <= {}", params.push(QueryParam::Float(*km)))
        }
    }
}

/// Law of cosines in SQL, matching `great_circle_distance_km`.
///
/// The origin's trigonometry is computed once here and bound as parameters.
fn distance_sql(origin: GeoPoint, params: &mut ParamList) -> String {
    let lat = params.push(QueryParam::Float(origin.lat));
    let lon = params.push(QueryParam::Float(origin.lon));
    let lat_rad = origin.lat.to_radians();
    let sin_lat = params.push(QueryParam::Float(lat_rad.sin()));
    let cos_lat = params.push(QueryParam::Float(lat_rad.cos()));
    let lon_rad = params.push(QueryParam::Float(origin.lon.to_radians()));
    format!(
        "CASE WHEN lat = {lat} AND lon = {lon} THEN 0.0::float8 \
         ELSE {r}::float8 * acos(LEAST(1.0::float8, GREATEST(-1.0::float8, \
         {sin_lat} * sin(radians(lat)) + {cos_lat} * cos(radians(lat)) * cos(radians(lon) - {lon_rad})))) END",
        lat = lat,
        lon = lon,
        r = EARTH_RADIUS_KM,
        sin_lat = sin_lat,
        cos_lat = cos_lat,
        lon_rad = lon_rad,
    )
}

fn sort_column(field: CapsuleField) -> &'static str {
    match field {
        CapsuleField::UserId => "user_id",
        CapsuleField::Country => "country",
        CapsuleField::City => "city",
        CapsuleField::TimeToOpen => "time_to_open",
        CapsuleField::CreatedAt => "created_at",
        CapsuleField::UpdatedAt => "updated_at",
        CapsuleField::Message => "message",
        CapsuleField::Distance => "distance",
    }
}

fn order_sql(spec: &SortSpec) -> String {
    format!(
        "{} {}, id ASC",
        sort_column(spec.field),
        spec.direction.as_sql()
    )
}

fn map_row_to_capsule(row: &sqlx::postgres::PgRow) -> Capsule {
    Capsule {
        id: row.get("id"),
        user_id: row.get("user_id"),
        location: Location {
            lat: row.get("lat"),
            lon: row.get("lon"),
            country: row.get("country"),
            city: row.get("city"),
        },
        time_to_open: row.get("time_to_open"),
        message: row.get("message"),
        media: row.get("media"),
        files: row.get("files"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn map_row_to_hit(row: &sqlx::postgres::PgRow) -> CapsuleHit {
    CapsuleHit {
        capsule: map_row_to_capsule(row),
        distance: row.get("distance"),
    }
}

fn log_timing(op: &str, start: Instant, result_count: usize) {
    let duration_ms = start.elapsed().as_millis() as u64;
    if duration_ms > SLOW_QUERY_THRESHOLD_MS {
        warn!(
            subsystem = "database",
            component = "capsules",
            op,
            duration_ms,
            result_count,
            slow = true,
            "Slow capsule query"
        );
    } else {
        debug!(
            subsystem = "database",
            component = "capsules",
            op,
            duration_ms,
            result_count,
            "Capsule query complete"
        );
    }
}

/// PostgreSQL capsule repository.
#[derive(Clone)]
pub struct PgCapsuleRepository {
    pool: Pool<Postgres>,
}

impl PgCapsuleRepository {
    /// Create a new capsule repository.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CapsuleRepository for PgCapsuleRepository {
    async fn count(&self, pipeline: &Pipeline) -> Result<u64> {
        let compiled = compile_pipeline(pipeline);
        if !compiled.is_count {
            return Err(Error::Internal(
                "count called with a pipeline that does not end in a count stage".to_string(),
            ));
        }
        let start = Instant::now();
        debug!(
            subsystem = "database",
            component = "capsules",
            op = "count",
            stage_count = pipeline.stages.len(),
            sql = %compiled.sql,
            "Running capsule count"
        );

        let q = crate::bind_query_params!(sqlx::query(&compiled.sql), &compiled.params);
        let row = q.fetch_one(&self.pool).await.map_err(Error::Database)?;
        let count: i64 = row.get("count");
        log_timing("count", start, 1);
        Ok(count.max(0) as u64)
    }

    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<CapsuleHit>> {
        let compiled = compile_pipeline(pipeline);
        if compiled.is_count {
            return Err(Error::Internal(
                "aggregate called with a count pipeline".to_string(),
            ));
        }
        let start = Instant::now();
        debug!(
            subsystem = "database",
            component = "capsules",
            op = "aggregate",
            stage_count = pipeline.stages.len(),
            sql = %compiled.sql,
            "Running capsule aggregation"
        );

        let q = crate::bind_query_params!(sqlx::query(&compiled.sql), &compiled.params);
        let rows = q.fetch_all(&self.pool).await.map_err(Error::Database)?;
        let hits: Vec<CapsuleHit> = rows.iter().map(map_row_to_hit).collect();
        log_timing("aggregate", start, hits.len());
        Ok(hits)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Capsule>> {
        let sql = format!("SELECT {} FROM capsule WHERE id = $1", CAPSULE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(map_row_to_capsule))
    }

    async fn insert(&self, capsule: NewCapsule) -> Result<Capsule> {
        let sql = format!(
            "INSERT INTO capsule (id, user_id, lat, lon, country, city, time_to_open, message, media, files) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {}",
            CAPSULE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(new_v7())
            .bind(&capsule.user_id)
            .bind(capsule.location.lat)
            .bind(capsule.location.lon)
            .bind(&capsule.location.country)
            .bind(&capsule.location.city)
            .bind(capsule.time_to_open)
            .bind(&capsule.message)
            .bind(capsule.media)
            .bind(capsule.files)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(map_row_to_capsule(&row))
    }

    async fn update(&self, id: Uuid, patch: CapsulePatch) -> Result<Option<Capsule>> {
        // Each column falls back to its stored value, so concurrent updates
        // to different fields both land.
        let sql = format!(
            "UPDATE capsule SET \
               user_id = COALESCE($2, user_id), \
               lat = COALESCE($3, lat), \
               lon = COALESCE($4, lon), \
               country = COALESCE($5, country), \
               city = COALESCE($6, city), \
               time_to_open = COALESCE($7, time_to_open), \
               message = COALESCE($8, message), \
               media = COALESCE($9, media), \
               files = COALESCE($10, files), \
               updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            CAPSULE_COLUMNS
        );
        let location = patch.location;
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(patch.user_id)
            .bind(location.as_ref().map(|l| l.lat))
            .bind(location.as_ref().map(|l| l.lon))
            .bind(location.as_ref().map(|l| l.country.clone()))
            .bind(location.as_ref().map(|l| l.city.clone()))
            .bind(patch.time_to_open)
            .bind(patch.message)
            .bind(patch.media)
            .bind(patch.files)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(map_row_to_capsule))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Capsule>> {
        let sql = format!(
            "DELETE FROM capsule WHERE id = $1 RETURNING {}",
            CAPSULE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(map_row_to_capsule))
    }
}
