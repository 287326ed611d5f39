//! Persistence seam.
//!
//! Every flow reads and writes through `Store` so it can run against the
//! hosted Postgres (`PgStore`) or an in-memory double in tests.

mod postgres;

pub use postgres::PgStore;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::audit::NewAuditLogEntry;
use crate::models::cv::{CvDocument, CvUpdate, NewCvDocument};
use crate::models::generation::{GenerationKind, GenerationRow};
use crate::models::linkedin::LinkedInImportRow;
use crate::models::subscription::{Reconciliation, SubscriptionRecord};

#[async_trait]
pub trait Store: Send + Sync {
    async fn get_subscription(&self, user_id: Uuid)
        -> Result<Option<SubscriptionRecord>, AppError>;

    /// Inserts or overwrites the user's record as `pending` / `free`.
    async fn upsert_pending_subscription(
        &self,
        user_id: Uuid,
        customer_id: &str,
    ) -> Result<(), AppError>;

    async fn reconcile_subscription(
        &self,
        user_id: Uuid,
        reconciliation: &Reconciliation,
    ) -> Result<(), AppError>;

    /// Reads a value from the `app_config` key-value table.
    async fn get_app_config(&self, key: &str) -> Result<Option<Value>, AppError>;

    async fn insert_linkedin_import(
        &self,
        user_id: Uuid,
        import_data: &Value,
    ) -> Result<LinkedInImportRow, AppError>;

    async fn insert_audit_log(&self, entry: &NewAuditLogEntry) -> Result<(), AppError>;

    async fn insert_cv(&self, cv: &NewCvDocument) -> Result<CvDocument, AppError>;

    async fn list_cvs(&self, user_id: Uuid) -> Result<Vec<CvDocument>, AppError>;

    async fn get_cv(&self, user_id: Uuid, id: Uuid) -> Result<Option<CvDocument>, AppError>;

    async fn update_cv(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: &CvUpdate,
    ) -> Result<Option<CvDocument>, AppError>;

    /// Returns false when no document with that id belongs to the user.
    async fn delete_cv(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    async fn insert_generation(
        &self,
        user_id: Uuid,
        kind: GenerationKind,
        input: &Value,
        content: &str,
    ) -> Result<GenerationRow, AppError>;
}
