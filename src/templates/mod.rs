mod answer;
mod assignment;
mod auth;
mod catalog;
mod error;

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tower_sessions::Session;

use crate::{
    error::QuizResult,
    flash::{self, FlashMessage},
    models::User,
};

pub use answer::{AnswersPage, TakeTestPage};
pub use assignment::AssignTestPage;
pub use auth::{IndexPage, LoginPage, RegisterPage};
pub use catalog::{CreateTestPage, DocumentField, TestPage, TestsPage, UploadJsonPage};
pub use error::ErrorPage;

/// Data every page shares through `base.html`.
#[derive(Debug, Default)]
pub struct Layout {
    pub user_name: Option<String>,
    pub flashes: Vec<FlashMessage>,
}

impl Layout {
    /// Consumes the pending flash messages.
    pub async fn load(session: &Session, user: Option<&User>) -> QuizResult<Self> {
        Ok(Self {
            user_name: user.map(|user| user.username.clone()),
            flashes: flash::take(session).await?,
        })
    }
}

pub fn render<T: Template>(page: &T, status: StatusCode) -> QuizResult<Response> {
    let html = page.render()?;
    Ok((status, Html(html)).into_response())
}
