use std::ops::Deref;

use axum::{
    Form, Router,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    error::{QuizError, QuizResult},
    flash::{self, Level},
    models::User,
    state::QuizzerState,
    templates::{Layout, LoginPage, RegisterPage, render},
    validation,
};

const USER_ID_KEY: &str = "user_id";

/// A logged-in user. Extracting it redirects anonymous requests to `/login`.
pub struct AuthUser(pub User);

impl Deref for AuthUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<QuizzerState> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &QuizzerState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        current_user(&session, &state.db_pool)
            .await
            .map_err(IntoResponse::into_response)?
            .map(Self)
            .ok_or_else(|| Redirect::to("/login").into_response())
    }
}

/// The user stored in the session, if any. A session pointing at a user
/// that no longer exists counts as anonymous.
pub async fn current_user(session: &Session, db: &SqlitePool) -> QuizResult<Option<User>> {
    let Some(user_id) = session.get::<Uuid>(USER_ID_KEY).await? else {
        return Ok(None);
    };

    Ok(User::find(db, user_id).await?)
}

#[derive(Deserialize)]
struct CredentialsForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn register_form(
    state: &QuizzerState,
    session: &Session,
    username: String,
    errors: Vec<String>,
    status: StatusCode,
) -> QuizResult<Response> {
    let user = current_user(session, &state.db_pool).await?;

    let page = RegisterPage {
        layout: Layout::load(session, user.as_ref()).await?,
        username,
        errors,
    };

    render(&page, status)
}

async fn login_form(
    state: &QuizzerState,
    session: &Session,
    username: String,
    errors: Vec<String>,
    status: StatusCode,
) -> QuizResult<Response> {
    let user = current_user(session, &state.db_pool).await?;

    let page = LoginPage {
        layout: Layout::load(session, user.as_ref()).await?,
        username,
        errors,
    };

    render(&page, status)
}

async fn register_page(
    State(state): State<QuizzerState>,
    session: Session,
) -> QuizResult<Response> {
    register_form(&state, &session, String::new(), Vec::new(), StatusCode::OK).await
}

async fn register(
    State(state): State<QuizzerState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> QuizResult<Response> {
    let credentials = match validation::registration(&form.username, &form.password) {
        Ok(credentials) => credentials,
        Err(errors) => {
            return register_form(
                &state,
                &session,
                form.username,
                validation::messages(&errors),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
        }
    };

    match User::register(&state.db_pool, &credentials.username, &credentials.password).await {
        Ok(user) => {
            flash::push(
                &session,
                Level::Success,
                format!("Account created for {}!", user.username),
            )
            .await?;

            Ok(Redirect::to("/login").into_response())
        }
        Err(e) if e.is_user_facing() => {
            let status = e.status();
            register_form(&state, &session, credentials.username, vec![e.to_string()], status)
                .await
        }
        Err(e) => Err(e),
    }
}

async fn login_page(State(state): State<QuizzerState>, session: Session) -> QuizResult<Response> {
    login_form(&state, &session, String::new(), Vec::new(), StatusCode::OK).await
}

async fn login(
    State(state): State<QuizzerState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> QuizResult<Response> {
    let credentials = match validation::login(&form.username, &form.password) {
        Ok(credentials) => credentials,
        Err(errors) => {
            return login_form(
                &state,
                &session,
                form.username,
                validation::messages(&errors),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
        }
    };

    match User::authenticate(&state.db_pool, &credentials.username, &credentials.password).await {
        Ok(user) => {
            session.cycle_id().await?;
            session.insert(USER_ID_KEY, user.id).await?;
            flash::push(&session, Level::Success, "You have been logged in!").await?;

            tracing::info!(user_id = %user.id, "user logged in");

            Ok(Redirect::to("/").into_response())
        }
        Err(e @ QuizError::InvalidCredentials) => {
            tracing::warn!(username = %credentials.username, "failed login attempt");

            let status = e.status();
            login_form(&state, &session, credentials.username, vec![e.to_string()], status).await
        }
        Err(e) => Err(e),
    }
}

async fn logout(session: Session) -> QuizResult<Redirect> {
    session.remove::<Uuid>(USER_ID_KEY).await?;
    session.cycle_id().await?;
    flash::push(&session, Level::Info, "You have been logged out.").await?;

    Ok(Redirect::to("/login"))
}

pub fn auth_router() -> Router<QuizzerState> {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}
