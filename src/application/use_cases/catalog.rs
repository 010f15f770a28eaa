// ============================================================
// CATALOG QUERIES
// ============================================================
// Read side of the shared (non-partitioned) database: processes,
// their indicators, and the attributes whose values can extend a
// composite code. Used by the mapping UI before an upload.

use serde::Serialize;
use sqlx::PgPool;

use crate::domain::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProcessSummary {
    pub id: i32,
    pub coding: String,
    pub process_name: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct IndicatorSummary {
    pub id: i32,
    pub coding: String,
    pub indicator_name: String,
    pub indicator_group_id: i32,
    pub indicator_group_coding: String,
    pub indicator_group_name: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AttributeSummary {
    pub id: i32,
    pub coding: String,
    pub description: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PossibleValue {
    pub id: i32,
    pub value: String,
}

pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_processes(&self) -> Result<Vec<ProcessSummary>> {
        sqlx::query_as::<_, ProcessSummary>(
            "SELECT id, coding, process_name FROM process ORDER BY process_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list processes: {}", e)))
    }

    /// Indicators of one process, joined through their indicator group.
    pub async fn list_indicators(&self, process_id: i32) -> Result<Vec<IndicatorSummary>> {
        sqlx::query_as::<_, IndicatorSummary>(
            "SELECT i.id, i.coding, i.indicator_name,\n             ig.id AS indicator_group_id, ig.coding AS indicator_group_coding,\n             ig.indicator_group_name\n             FROM indicator i\n             JOIN indicator_group ig ON i.indicator_group_id = ig.id\n             WHERE ig.process_id = $1",
        )
        .bind(process_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list indicators: {}", e)))
    }

    pub async fn list_attributes(&self) -> Result<Vec<AttributeSummary>> {
        sqlx::query_as::<_, AttributeSummary>(
            "SELECT id, coding, description, position FROM attribute ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list attributes: {}", e)))
    }

    pub async fn list_possible_values(&self, attribute_id: i32) -> Result<Vec<PossibleValue>> {
        sqlx::query_as::<_, PossibleValue>(
            "SELECT id, value FROM possible_value WHERE attribute_id = $1",
        )
        .bind(attribute_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to list possible values: {}", e))
        })
    }

    /// Stored coding of one attribute; `None` when the id is unknown.
    pub async fn attribute_coding(&self, attribute_id: i32) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT coding FROM attribute WHERE id = $1")
            .bind(attribute_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to fetch attribute coding: {}", e))
            })
    }
}
