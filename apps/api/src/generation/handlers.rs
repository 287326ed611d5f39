//! POST /functions/v1/generate-{cv,cover-letter,recruitment-email}

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::auth::{authenticate, Caller};
use crate::errors::{parse_body, AppError, FunctionError};
use crate::generation::generator::{
    generate_cover_letter, generate_cv, generate_recruitment_email, CoverLetterRequest,
    GenerateCvRequest, GeneratedText, RecruitmentEmailRequest,
};
use crate::models::cv::CvDocument;
use crate::state::AppState;

pub const GENERATE_CV: &str = "generate-cv";
pub const GENERATE_COVER_LETTER: &str = "generate-cover-letter";
pub const GENERATE_RECRUITMENT_EMAIL: &str = "generate-recruitment-email";

pub async fn handle_generate_cv(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CvDocument>, FunctionError> {
    let on_error = FunctionError::on(GENERATE_CV);
    let (caller, request) = prepare::<GenerateCvRequest>(&state, GENERATE_CV, &headers, &body)
        .await
        .map_err(&on_error)?;

    let document = generate_cv(&state, &caller, request)
        .await
        .map_err(&on_error)?;
    info!(function = GENERATE_CV, step = "completed", cv_id = %document.id, "CV generated");
    Ok(Json(document))
}

pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<GeneratedText>, FunctionError> {
    let on_error = FunctionError::on(GENERATE_COVER_LETTER);
    let (caller, request) =
        prepare::<CoverLetterRequest>(&state, GENERATE_COVER_LETTER, &headers, &body)
            .await
            .map_err(&on_error)?;

    let generated = generate_cover_letter(&state, &caller, request)
        .await
        .map_err(&on_error)?;
    info!(function = GENERATE_COVER_LETTER, step = "completed", generation_id = %generated.id, "Cover letter generated");
    Ok(Json(generated))
}

pub async fn handle_generate_recruitment_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<GeneratedText>, FunctionError> {
    let on_error = FunctionError::on(GENERATE_RECRUITMENT_EMAIL);
    let (caller, request) =
        prepare::<RecruitmentEmailRequest>(&state, GENERATE_RECRUITMENT_EMAIL, &headers, &body)
            .await
            .map_err(&on_error)?;

    let generated = generate_recruitment_email(&state, &caller, request)
        .await
        .map_err(&on_error)?;
    info!(function = GENERATE_RECRUITMENT_EMAIL, step = "completed", generation_id = %generated.id, "Recruitment email generated");
    Ok(Json(generated))
}

async fn prepare<T: DeserializeOwned>(
    state: &AppState,
    function: &'static str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(Caller, T), AppError> {
    info!(function, step = "start", "Starting generation");
    let caller = authenticate(state.sessions.as_ref(), headers).await?;
    info!(function, step = "authenticated", user_id = %caller.id, "User authenticated");
    let request = parse_body(body)?;
    Ok((caller, request))
}
