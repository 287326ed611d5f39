use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One successful profile import. Rows are never updated.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LinkedInImportRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub import_data: Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
