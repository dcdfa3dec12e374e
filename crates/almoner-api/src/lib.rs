//! almoner-api
//!
//! JSON HTTP surface of the case register: configuration, application
//! state, bearer-token and request-log middleware, and the route table.

use axum::Router;
use axum::middleware as axum_mw;
use axum::routing::{get, post, put};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use state::AppState;

/// Build the application router over `state`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    let protected = Router::new()
        .route("/me", get(routes::me::current_user))
        // Patients
        .route(
            "/patients",
            get(routes::patients::list_patients).post(routes::patients::create_patient),
        )
        .route("/patients/search", get(routes::patients::search_patients))
        .route(
            "/patients/{id}",
            get(routes::patients::get_patient)
                .put(routes::patients::update_patient)
                .delete(routes::patients::delete_patient),
        )
        .route(
            "/patients/{id}/discharge",
            post(routes::patients::discharge_patient),
        )
        .route("/patients/{id}/death", post(routes::patients::record_death))
        .route(
            "/patients/{id}/archive",
            post(routes::patients::archive_patient),
        )
        .route(
            "/patients/{id}/restore",
            post(routes::patients::restore_patient),
        )
        .route(
            "/patients/{id}/missing-documents",
            get(routes::patients::missing_documents),
        )
        .route("/patients/{id}/card", get(routes::patients::export_card))
        // Assignments
        .route(
            "/assignments",
            get(routes::assignments::list_assignments)
                .post(routes::assignments::create_assignment),
        )
        .route(
            "/assignments/{id}",
            get(routes::assignments::get_assignment),
        )
        .route(
            "/assignments/{id}/assignee",
            post(routes::assignments::set_assignee),
        )
        .route(
            "/assignments/{id}/status",
            post(routes::assignments::change_status),
        )
        .route(
            "/assignments/{id}/notes",
            post(routes::assignments::add_note),
        )
        // Departments
        .route(
            "/departments",
            get(routes::departments::list_departments)
                .post(routes::departments::create_department),
        )
        .route(
            "/departments/{id}",
            get(routes::departments::get_department).put(routes::departments::rename_department),
        )
        .route(
            "/departments/{id}/deactivate",
            post(routes::departments::deactivate_department),
        )
        .route(
            "/departments/{id}/activate",
            post(routes::departments::activate_department),
        )
        // Users
        .route(
            "/users",
            get(routes::users::list_users).post(routes::users::register_user),
        )
        .route(
            "/users/{id}",
            get(routes::users::get_user).put(routes::users::update_user),
        )
        .route("/users/{id}/roles", put(routes::users::set_roles))
        .route(
            "/users/{id}/deactivate",
            post(routes::users::deactivate_user),
        )
        .route("/users/{id}/activate", post(routes::users::activate_user))
        .route("/roles/{role}/users", get(routes::users::users_in_role))
        // Oversight
        .route("/activity", get(routes::activity::list_activity))
        .route("/summary", get(routes::summary::caseload_summary))
        .route("/admin/search/rebuild", post(routes::admin::rebuild_index))
        .route_layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        // Health (no auth)
        .route("/health", get(routes::health::health_check))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(axum_mw::from_fn(middleware::audit::audit_log))
                .layer(cors),
        )
        .with_state(state)
}
