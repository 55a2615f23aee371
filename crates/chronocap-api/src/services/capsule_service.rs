//! Capsule list, lookup and CRUD.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use chronocap_core::{
    calculate_pagination_data, Capsule, CapsuleQuery, CapsuleRepository, CreateCapsuleRequest,
    Error, ListCapsulesResponse, Result, UpdateCapsuleRequest,
};

use super::{parse_record_id, to_i64};

const NOT_FOUND: &str = "Capsule not found";

fn not_found() -> Error {
    Error::NotFound(NOT_FOUND.to_string())
}

#[derive(Clone)]
pub struct CapsuleService {
    repo: Arc<dyn CapsuleRepository>,
}

impl CapsuleService {
    pub fn new(repo: Arc<dyn CapsuleRepository>) -> Self {
        Self { repo }
    }

    /// One page of capsules plus pagination metadata.
    ///
    /// The total and the page run as two pipelines built from the same
    /// match/geo prefix.
    pub async fn get_capsules(&self, query: &CapsuleQuery) -> Result<ListCapsulesResponse> {
        let start = Instant::now();
        let plan = query.plan();
        let count_pipeline = plan.count_pipeline();
        let page_pipeline = plan.page_pipeline();

        let (total, capsules) = tokio::try_join!(
            self.repo.count(&count_pipeline),
            self.repo.aggregate(&page_pipeline)
        )?;

        debug!(
            subsystem = "api",
            component = "capsules",
            op = "list",
            total_items = total,
            result_count = capsules.len(),
            geo = query.filter.geo().is_some(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Capsule list served"
        );

        Ok(ListCapsulesResponse {
            pagination: calculate_pagination_data(
                to_i64(total),
                to_i64(query.page),
                to_i64(query.per_page),
            ),
            capsules,
        })
    }

    pub async fn get_capsule_by_id(&self, id: &str) -> Result<Capsule> {
        let id = parse_record_id(id).ok_or_else(not_found)?;
        self.repo.fetch(id).await?.ok_or_else(not_found)
    }

    pub async fn create_capsule(&self, request: CreateCapsuleRequest) -> Result<Capsule> {
        let capsule = self.repo.insert(request.validate()?).await?;
        info!(
            subsystem = "api",
            component = "capsules",
            op = "create",
            capsule_id = %capsule.id,
            "Capsule created"
        );
        Ok(capsule)
    }

    /// Merge the provided fields into the stored capsule.
    pub async fn update_capsule(&self, id: &str, request: UpdateCapsuleRequest) -> Result<Capsule> {
        let id = parse_record_id(id).ok_or_else(not_found)?;
        let patch = request.validate()?;
        if patch.is_empty() {
            return self.repo.fetch(id).await?.ok_or_else(not_found);
        }
        let capsule = self.repo.update(id, patch).await?.ok_or_else(not_found)?;
        info!(
            subsystem = "api",
            component = "capsules",
            op = "update",
            capsule_id = %capsule.id,
            "Capsule updated"
        );
        Ok(capsule)
    }

    /// Delete and return the removed capsule.
    pub async fn delete_capsule(&self, id: &str) -> Result<Capsule> {
        let id = parse_record_id(id).ok_or_else(not_found)?;
        let capsule = self.repo.delete(id).await?.ok_or_else(not_found)?;
        info!(
            subsystem = "api",
            component = "capsules",
            op = "delete",
            capsule_id = %capsule.id,
            "Capsule deleted"
        );
        Ok(capsule)
    }
}
