pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue},
    routing::get,
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::education::handlers as education;
use crate::experience::handlers as experience;
use crate::project::handlers as project;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Experience
        .route(
            "/api/experiences",
            get(experience::handle_list_experiences).post(experience::handle_create_experience),
        )
        .route(
            "/api/experiences/:id",
            get(experience::handle_get_experience)
                .put(experience::handle_update_experience)
                .delete(experience::handle_delete_experience),
        )
        // Education
        .route(
            "/api/education",
            get(education::handle_list_education).post(education::handle_create_education),
        )
        .route(
            "/api/education/:id",
            get(education::handle_get_education)
                .put(education::handle_update_education)
                .delete(education::handle_delete_education),
        )
        // Project
        .route(
            "/api/project",
            get(project::handle_list_projects)
                .post(project::handle_create_project)
                .delete(project::handle_delete_all_projects),
        )
        .route(
            "/api/project/:id",
            get(project::handle_get_project)
                .put(project::handle_update_project)
                .delete(project::handle_delete_project),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(security_header(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(security_header(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(security_header(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .with_state(state)
}

fn security_header(name: HeaderName, value: HeaderValue) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(name, value)
}
