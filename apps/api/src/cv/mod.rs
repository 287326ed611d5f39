//! Owner-scoped CV documents.
//!
//! Every read and write is keyed on the caller's id; a document that belongs
//! to someone else is reported exactly like one that does not exist.

pub mod handlers;

use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::cv::{CvContent, CvDocument, CvStatus, CvUpdate, NewCvDocument, DEFAULT_TEMPLATE};
use crate::store::Store;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCvRequest {
    pub title: Option<String>,
    pub content: CvContent,
    pub template_type: Option<String>,
}

pub async fn create_cv(
    store: &dyn Store,
    caller: &Caller,
    request: CreateCvRequest,
) -> Result<CvDocument, AppError> {
    let info = &request.content.personal_info;
    for (field, value) in [
        ("firstName", &info.first_name),
        ("lastName", &info.last_name),
        ("email", &info.email),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("personalInfo.{field} is required")));
        }
    }

    let title = non_blank(request.title)
        .unwrap_or_else(|| format!("CV - {}", request.content.full_name()));
    let template_type =
        non_blank(request.template_type).unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());

    store
        .insert_cv(&NewCvDocument {
            user_id: caller.id,
            title,
            content: request.content,
            template_type,
            status: CvStatus::Draft,
        })
        .await
}

pub async fn list_cvs(store: &dyn Store, caller: &Caller) -> Result<Vec<CvDocument>, AppError> {
    store.list_cvs(caller.id).await
}

pub async fn get_cv(store: &dyn Store, caller: &Caller, id: Uuid) -> Result<CvDocument, AppError> {
    store
        .get_cv(caller.id, id)
        .await?
        .ok_or_else(|| not_found(id))
}

pub async fn update_cv(
    store: &dyn Store,
    caller: &Caller,
    id: Uuid,
    update: CvUpdate,
) -> Result<CvDocument, AppError> {
    if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }

    store
        .update_cv(caller.id, id, &update)
        .await?
        .ok_or_else(|| not_found(id))
}

pub async fn delete_cv(store: &dyn Store, caller: &Caller, id: Uuid) -> Result<(), AppError> {
    if store.delete_cv(caller.id, id).await? {
        Ok(())
    } else {
        Err(not_found(id))
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("CV {id} not found"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
