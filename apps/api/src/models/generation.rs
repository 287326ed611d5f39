use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    CoverLetter,
    RecruitmentEmail,
}

/// A cover letter or recruitment email produced for a user.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GenerationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: GenerationKind,
    pub input: Value,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
