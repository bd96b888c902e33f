#![deny(
    clippy::as_conversions,
    clippy::expect_used,
    clippy::future_not_send,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::pedantic,
    clippy::string_slice,
    clippy::todo,
    clippy::unwrap_used,
    unsafe_code
)]
#![allow(
    clippy::manual_non_exhaustive,
    clippy::missing_errors_doc,
    clippy::module_inception,
    clippy::module_name_repetitions,
    clippy::needless_return,
    clippy::single_match_else,
    clippy::multiple_crate_versions
)]

use std::io;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::Response,
    routing::get,
};
use tower_sessions::{
    Expiry, Session, SessionManagerLayer,
    cookie::{SameSite, time::Duration},
};
use tower_sessions_sqlx_store::SqliteStore;

use crate::{
    error::QuizResult,
    templates::{IndexPage, Layout, render},
};

pub use args::QuizzerArgs;
pub use error::QuizError;
pub use state::QuizzerState;

mod args;
mod auth;
pub mod db;
pub mod document;
mod error;
pub mod flash;
pub mod models;
mod password;
mod routes;
mod state;
mod templates;
pub mod validation;

/// Opens the store and builds the full application, sessions included.
pub async fn server(args: QuizzerArgs) -> Result<Router, io::Error> {
    let db_pool = db::connect(&args.database_url)
        .await
        .map_err(io::Error::other)?;

    let session_store = SqliteStore::new(db_pool.clone());
    session_store.migrate().await.map_err(io::Error::other)?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_same_site(SameSite::Lax)
        .with_secure(args.secure_cookies)
        .with_expiry(Expiry::OnInactivity(Duration::days(args.session_days)));

    tracing::info!(database = %args.database_url, "store ready");

    Ok(router(QuizzerState::new(db_pool, args)).layer(session_layer))
}

/// All routes, without the session layer. Callers must add one.
pub fn router(state: QuizzerState) -> Router {
    Router::new()
        .route("/", get(index))
        .merge(routes::catalog::router())
        .merge(routes::assignment::router())
        .merge(routes::answer::router())
        .merge(auth::auth_router())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error::with_session_layout,
        ))
        .with_state(state)
}

async fn not_found() -> QuizError {
    QuizError::NotFound("page")
}

async fn index(State(state): State<QuizzerState>, session: Session) -> QuizResult<Response> {
    let user = auth::current_user(&session, &state.db_pool).await?;

    let page = IndexPage {
        layout: Layout::load(&session, user.as_ref()).await?,
    };

    render(&page, StatusCode::OK)
}
