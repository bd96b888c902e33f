use axum::{
    Form, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{QuizError, QuizResult},
    flash::{self, Level},
    models::{Answer, AssignedAnswer},
    state::QuizzerState,
    templates::{AnswersPage, Layout, TakeTestPage, render},
};

pub fn router() -> Router<QuizzerState> {
    Router::new()
        .route("/take-test/{id}", get(take_test_page).post(take_test))
        .route("/answers", get(my_answers))
}

/// Answers assigned to someone else are reported as missing.
async fn owned_answer(
    db: &SqlitePool,
    auth: &AuthUser,
    answer_id: Uuid,
) -> QuizResult<AssignedAnswer> {
    let answer = Answer::get_assigned(db, answer_id).await?;

    if answer.user_id == auth.id {
        Ok(answer)
    } else {
        Err(QuizError::NotFound("answer"))
    }
}

async fn take_test_page(
    auth: AuthUser,
    State(state): State<QuizzerState>,
    session: Session,
    Path(answer_id): Path<Uuid>,
) -> QuizResult<Response> {
    let answer = owned_answer(&state.db_pool, &auth, answer_id).await?;

    let page = TakeTestPage {
        layout: Layout::load(&session, Some(&auth.0)).await?,
        answer,
    };

    render(&page, StatusCode::OK)
}

#[derive(Deserialize)]
struct TakeTestForm {
    #[serde(default)]
    answer: String,
}

async fn take_test(
    auth: AuthUser,
    State(state): State<QuizzerState>,
    session: Session,
    Path(answer_id): Path<Uuid>,
    Form(form): Form<TakeTestForm>,
) -> QuizResult<Redirect> {
    owned_answer(&state.db_pool, &auth, answer_id).await?;
    Answer::submit(&state.db_pool, answer_id, &form.answer).await?;

    flash::push(&session, Level::Success, "Your answer has been saved.").await?;

    Ok(Redirect::to("/answers"))
}

async fn my_answers(
    auth: AuthUser,
    State(state): State<QuizzerState>,
    session: Session,
) -> QuizResult<Response> {
    let answers = Answer::for_user(&state.db_pool, auth.id).await?;

    let page = AnswersPage {
        layout: Layout::load(&session, Some(&auth.0)).await?,
        answers,
    };

    render(&page, StatusCode::OK)
}
