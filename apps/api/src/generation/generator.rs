//! Document generation: CVs, cover letters and recruitment emails.
//!
//! Flow: validate input → build prompt → one LLM call → persist → return.
//! A provider failure is returned as-is; nothing is persisted in that case.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::Caller;
use crate::errors::AppError;
use crate::generation::handlers::{GENERATE_COVER_LETTER, GENERATE_CV, GENERATE_RECRUITMENT_EMAIL};
use crate::generation::prompts::{
    COVER_LETTER_PROMPT_TEMPLATE, COVER_LETTER_SYSTEM, CV_PROMPT_TEMPLATE, CV_SYSTEM,
    RECRUITMENT_EMAIL_PROMPT_TEMPLATE, RECRUITMENT_EMAIL_SYSTEM,
};
use crate::llm_client::prompts::{FACTUALITY_INSTRUCTION, JSON_ONLY_SYSTEM, PLAIN_TEXT_INSTRUCTION};
use crate::models::cv::{CvContent, CvDocument, CvStatus, NewCvDocument, DEFAULT_TEMPLATE};
use crate::models::generation::GenerationKind;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateCvRequest {
    pub cv_data: CvContent,
    pub ai_prompt: String,
    pub target_position: String,
    pub years_experience: u32,
    pub industry: String,
    pub template_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoverLetterRequest {
    pub job_title: String,
    pub company_name: String,
    pub job_description: String,
    pub user_experience: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecruitmentEmailRequest {
    pub recipient_name: String,
    pub company_name: String,
    pub position: String,
    pub user_background: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedText {
    pub id: Uuid,
    pub generated_content: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Generators
// ────────────────────────────────────────────────────────────────────────────

pub async fn generate_cv(
    state: &AppState,
    caller: &Caller,
    request: GenerateCvRequest,
) -> Result<CvDocument, AppError> {
    require("aiPrompt", &request.ai_prompt)?;

    let prompt = build_cv_prompt(&request)?;
    let system = format!("{CV_SYSTEM} {JSON_ONLY_SYSTEM}");
    info!(function = GENERATE_CV, step = "generating", user_id = %caller.id, "Generating CV");
    let content: CvContent = state.llm.call_json(&prompt, &system).await?;

    let title = cv_title(&request.target_position, &content);
    let template_type = request
        .template_type
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());

    let document = state
        .store
        .insert_cv(&NewCvDocument {
            user_id: caller.id,
            title,
            content,
            template_type,
            status: CvStatus::Draft,
        })
        .await?;
    info!(function = GENERATE_CV, step = "saved", user_id = %caller.id, cv_id = %document.id, "Saved generated CV");
    Ok(document)
}

pub async fn generate_cover_letter(
    state: &AppState,
    caller: &Caller,
    request: CoverLetterRequest,
) -> Result<GeneratedText, AppError> {
    require("jobTitle", &request.job_title)?;
    require("companyName", &request.company_name)?;

    let prompt = COVER_LETTER_PROMPT_TEMPLATE
        .replace("{job_title}", request.job_title.trim())
        .replace("{company_name}", request.company_name.trim())
        .replace("{job_description}", or_unspecified(&request.job_description))
        .replace("{user_experience}", or_unspecified(&request.user_experience))
        .replace("{factuality_instruction}", FACTUALITY_INSTRUCTION)
        .replace("{plain_text_instruction}", PLAIN_TEXT_INSTRUCTION);

    info!(function = GENERATE_COVER_LETTER, step = "generating", user_id = %caller.id, "Generating cover letter");
    let content = state.llm.call_text(&prompt, COVER_LETTER_SYSTEM).await?;
    persist_text(state, caller, GenerationKind::CoverLetter, &request, content).await
}

pub async fn generate_recruitment_email(
    state: &AppState,
    caller: &Caller,
    request: RecruitmentEmailRequest,
) -> Result<GeneratedText, AppError> {
    require("companyName", &request.company_name)?;
    require("position", &request.position)?;

    let prompt = RECRUITMENT_EMAIL_PROMPT_TEMPLATE
        .replace("{recipient_name}", or_unspecified(&request.recipient_name))
        .replace("{company_name}", request.company_name.trim())
        .replace("{position}", request.position.trim())
        .replace("{user_background}", or_unspecified(&request.user_background))
        .replace("{factuality_instruction}", FACTUALITY_INSTRUCTION)
        .replace("{plain_text_instruction}", PLAIN_TEXT_INSTRUCTION);

    info!(function = GENERATE_RECRUITMENT_EMAIL, step = "generating", user_id = %caller.id, "Generating recruitment email");
    let content = state.llm.call_text(&prompt, RECRUITMENT_EMAIL_SYSTEM).await?;
    persist_text(state, caller, GenerationKind::RecruitmentEmail, &request, content).await
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn persist_text<T: Serialize>(
    state: &AppState,
    caller: &Caller,
    kind: GenerationKind,
    input: &T,
    content: String,
) -> Result<GeneratedText, AppError> {
    let input: Value = serde_json::to_value(input)
        .map_err(|e| AppError::Persistence(format!("could not encode generation input: {e}")))?;
    let row = state
        .store
        .insert_generation(caller.id, kind, &input, &content)
        .await?;

    Ok(GeneratedText {
        id: row.id,
        generated_content: row.content,
    })
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn or_unspecified(value: &str) -> &str {
    match value.trim() {
        "" => "(not specified)",
        v => v,
    }
}

fn build_cv_prompt(request: &GenerateCvRequest) -> Result<String, AppError> {
    let cv_json = serde_json::to_string_pretty(&request.cv_data)
        .map_err(|e| AppError::Validation(format!("Invalid cvData: {e}")))?;
    let years = if request.years_experience == 0 {
        "(not specified)".to_string()
    } else {
        request.years_experience.to_string()
    };

    Ok(CV_PROMPT_TEMPLATE
        .replace("{target_position}", or_unspecified(&request.target_position))
        .replace("{industry}", or_unspecified(&request.industry))
        .replace("{years_experience}", &years)
        .replace("{ai_prompt}", request.ai_prompt.trim())
        .replace("{cv_json}", &cv_json)
        .replace("{factuality_instruction}", FACTUALITY_INSTRUCTION))
}

fn cv_title(target_position: &str, content: &CvContent) -> String {
    let target = target_position.trim();
    if !target.is_empty() {
        return format!("CV - {target}");
    }
    match content.full_name().as_str() {
        "" => "CV".to_string(),
        name => format!("CV - {name}"),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
