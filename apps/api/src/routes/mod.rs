pub mod health;

use axum::{
    extract::Request,
    http::{header, HeaderName, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::billing::handlers::{handle_check_subscription, handle_create_checkout};
use crate::cv::handlers::{
    handle_create_cv, handle_delete_cv, handle_get_cv, handle_list_cvs, handle_update_cv,
};
use crate::generation::handlers::{
    handle_generate_cover_letter, handle_generate_cv, handle_generate_recruitment_email,
};
use crate::linkedin::handlers::handle_linkedin_auth;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Integration functions
        .route("/functions/v1/linkedin-auth", post(handle_linkedin_auth))
        .route("/functions/v1/create-checkout", post(handle_create_checkout))
        .route(
            "/functions/v1/check-subscription",
            post(handle_check_subscription),
        )
        .route("/functions/v1/generate-cv", post(handle_generate_cv))
        .route(
            "/functions/v1/generate-cover-letter",
            post(handle_generate_cover_letter),
        )
        .route(
            "/functions/v1/generate-recruitment-email",
            post(handle_generate_recruitment_email),
        )
        // CV documents
        .route("/api/v1/cvs", get(handle_list_cvs).post(handle_create_cv))
        .route(
            "/api/v1/cvs/:id",
            get(handle_get_cv)
                .put(handle_update_cv)
                .delete(handle_delete_cv),
        )
        .layer(cors_layer())
        .layer(middleware::from_fn(preflight_no_content))
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

/// Browsers accept either; the hosted functions answered preflight with 204.
async fn preflight_no_content(request: Request, next: Next) -> Response {
    let is_options = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if is_options && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}
