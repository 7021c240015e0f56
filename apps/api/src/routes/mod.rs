pub mod contract;
pub mod health;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::amount::handlers as amount;
use crate::auth;
use crate::pdf::handlers as pdf;
use crate::records::handlers as records;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/v1/contract/defaults",
            get(contract::handle_contract_defaults),
        )
        .route("/api/v1/amount/words", post(amount::handle_amount_words))
        .route("/api/v1/pdf", post(pdf::handle_generate_pdf))
        // Saved people
        .route(
            "/api/v1/sellers",
            get(records::handle_list_sellers).post(records::handle_create_seller),
        )
        .route("/api/v1/sellers/:id", delete(records::handle_delete_seller))
        .route(
            "/api/v1/witnesses",
            get(records::handle_list_witnesses).post(records::handle_create_witness),
        )
        .route(
            "/api/v1/witnesses/:id",
            delete(records::handle_delete_witness),
        )
        .route(
            "/api/v1/people/:collection/:id",
            delete(records::handle_delete_person),
        )
        // Saved jobs
        .route(
            "/api/v1/jobs",
            get(records::handle_list_jobs).post(records::handle_save_job),
        )
        .route("/api/v1/jobs/:id", delete(records::handle_delete_job))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_password,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/login", post(auth::handle_login))
        .merge(protected)
        .with_state(state)
}
