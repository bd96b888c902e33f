use askama::Template;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tower_sessions::Session;

use crate::{
    auth,
    state::QuizzerState,
    templates::{ErrorPage, Layout},
};

pub type QuizResult<T> = Result<T, QuizError>;

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("Username already exists.")]
    DuplicateUser,

    #[error("Invalid credentials.")]
    InvalidCredentials,

    /// The named entity (`"test"`, `"user"`, `"answer"`, `"page"`) does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(argon2::password_hash::Error),

    #[error("background task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

impl QuizError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::DuplicateUser => StatusCode::CONFLICT,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MalformedDocument(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database(_)
            | Self::PasswordHash(_)
            | Self::Blocking(_)
            | Self::Session(_)
            | Self::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Errors the user caused and can fix by resubmitting a form.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        !self.status().is_server_error()
    }
}

/// Marks a rendered error page so [`with_session_layout`] can redraw it.
#[derive(Debug, Clone)]
struct ErrorMessage(String);

impl IntoResponse for QuizError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if self.is_user_facing() {
            self.to_string()
        } else {
            tracing::error!("request failed: {self}");
            "Something went wrong on our side.".to_owned()
        };

        let mut response = error_page(Layout::default(), status, &message);
        response.extensions_mut().insert(ErrorMessage(message));
        response
    }
}

fn error_page(layout: Layout, status: StatusCode, message: &str) -> Response {
    let page = ErrorPage {
        layout,
        status: status.as_u16(),
        message: message.to_owned(),
    };

    match page.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => (status, message.to_owned()).into_response(),
    }
}

/// Redraws error pages with the visitor's navigation and pending flashes.
pub async fn with_session_layout(
    State(state): State<QuizzerState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    let Some(ErrorMessage(message)) = response.extensions().get::<ErrorMessage>().cloned() else {
        return response;
    };

    let layout = match auth::current_user(&session, &state.db_pool).await {
        Ok(user) => Layout::load(&session, user.as_ref()).await,
        Err(e) => Err(e),
    };

    match layout {
        Ok(layout) => error_page(layout, response.status(), &message),
        Err(e) => {
            tracing::error!("could not load the layout of an error page: {e}");
            response
        }
    }
}
