use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::audit::NewAuditLogEntry;
use crate::models::cv::{CvDocument, CvUpdate, NewCvDocument};
use crate::models::generation::{GenerationKind, GenerationRow};
use crate::models::linkedin::LinkedInImportRow;
use crate::models::subscription::{Reconciliation, SubscriptionRecord};
use crate::store::Store;

const CV_COLUMNS: &str =
    "id, user_id, title, content, template_type, status, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionRecord>, AppError> {
        let record = sqlx::query_as::<_, SubscriptionRecord>(
            r#"
            SELECT user_id, stripe_customer_id, stripe_subscription_id, status, plan_type,
                   current_period_start, current_period_end, updated_at
            FROM subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn upsert_pending_subscription(
        &self,
        user_id: Uuid,
        customer_id: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, stripe_customer_id, status, plan_type)
            VALUES ($1, $2, 'pending', 'free')
            ON CONFLICT (user_id) DO UPDATE
            SET stripe_customer_id = EXCLUDED.stripe_customer_id,
                status = 'pending',
                plan_type = 'free',
                updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(customer_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reconcile_subscription(
        &self,
        user_id: Uuid,
        reconciliation: &Reconciliation,
    ) -> Result<(), AppError> {
        match reconciliation {
            Reconciliation::Active {
                subscription_id,
                current_period_start,
                current_period_end,
            } => {
                sqlx::query(
                    r#"
                    UPDATE subscriptions
                    SET stripe_subscription_id = $2,
                        status = 'active',
                        plan_type = 'premium',
                        current_period_start = $3,
                        current_period_end = $4,
                        updated_at = now()
                    WHERE user_id = $1
                    "#,
                )
                .bind(user_id)
                .bind(subscription_id)
                .bind(current_period_start)
                .bind(current_period_end)
                .execute(&self.pool)
                .await?;
            }
            Reconciliation::Inactive => {
                sqlx::query(
                    "UPDATE subscriptions SET status = 'inactive', plan_type = 'free', updated_at = now() WHERE user_id = $1",
                )
                .bind(user_id)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }

    async fn get_app_config(&self, key: &str) -> Result<Option<Value>, AppError> {
        let value: Option<Value> =
            sqlx::query_scalar("SELECT value FROM app_config WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    async fn insert_linkedin_import(
        &self,
        user_id: Uuid,
        import_data: &Value,
    ) -> Result<LinkedInImportRow, AppError> {
        let row = sqlx::query_as::<_, LinkedInImportRow>(
            r#"
            INSERT INTO linkedin_imports (user_id, import_data, status)
            VALUES ($1, $2, 'completed')
            RETURNING id, user_id, import_data, status, created_at
            "#,
        )
        .bind(user_id)
        .bind(import_data)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_audit_log(&self, entry: &NewAuditLogEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO security_audit_logs (user_id, action, resource, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(entry.resource)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_cv(&self, cv: &NewCvDocument) -> Result<CvDocument, AppError> {
        let query = format!(
            "INSERT INTO cvs (user_id, title, content, template_type, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {CV_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CvDocument>(&query)
            .bind(cv.user_id)
            .bind(&cv.title)
            .bind(Json(&cv.content))
            .bind(&cv.template_type)
            .bind(cv.status)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_cvs(&self, user_id: Uuid) -> Result<Vec<CvDocument>, AppError> {
        let query =
            format!("SELECT {CV_COLUMNS} FROM cvs WHERE user_id = $1 ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, CvDocument>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_cv(&self, user_id: Uuid, id: Uuid) -> Result<Option<CvDocument>, AppError> {
        let query = format!("SELECT {CV_COLUMNS} FROM cvs WHERE id = $1 AND user_id = $2");
        let row = sqlx::query_as::<_, CvDocument>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_cv(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: &CvUpdate,
    ) -> Result<Option<CvDocument>, AppError> {
        let query = format!(
            r#"
            UPDATE cvs
            SET title = COALESCE($3, title),
                content = COALESCE($4, content),
                template_type = COALESCE($5, template_type),
                status = COALESCE($6, status),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {CV_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, CvDocument>(&query)
            .bind(id)
            .bind(user_id)
            .bind(update.title.as_deref())
            .bind(update.content.as_ref().map(Json))
            .bind(update.template_type.as_deref())
            .bind(update.status)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_cv(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM cvs WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_generation(
        &self,
        user_id: Uuid,
        kind: GenerationKind,
        input: &Value,
        content: &str,
    ) -> Result<GenerationRow, AppError> {
        let row = sqlx::query_as::<_, GenerationRow>(
            r#"
            INSERT INTO generations (user_id, kind, input, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, kind, input, content, created_at
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(input)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
