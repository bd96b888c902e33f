use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_typed_multipart::{TryFromMultipart, TypedMultipart, TypedMultipartError};
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{QuizError, QuizResult},
    flash::{self, Level},
    models::{Answer, Question, Test, User},
    state::QuizzerState,
    templates::{AssignTestPage, Layout, render},
    validation,
};

pub fn router() -> Router<QuizzerState> {
    Router::new().route("/assign-test/{id}", get(assign_test_page).post(assign_test))
}

/// Checkbox values are user ids; one part per checked box.
#[derive(Debug, TryFromMultipart)]
pub struct AssignTestForm {
    pub users: Vec<String>,
}

async fn assign_test_form(
    state: &QuizzerState,
    session: &Session,
    auth: &AuthUser,
    test_id: Uuid,
    errors: Vec<String>,
    status: StatusCode,
) -> QuizResult<Response> {
    let test = Test::get_by_id(&state.db_pool, test_id).await?;
    let questions = Question::for_test(&state.db_pool, test.id).await?;
    let users = User::all(&state.db_pool).await?;

    let page = AssignTestPage {
        layout: Layout::load(session, Some(&auth.0)).await?,
        test,
        questions,
        users,
        errors,
    };

    render(&page, status)
}

async fn assign_test_page(
    auth: AuthUser,
    State(state): State<QuizzerState>,
    session: Session,
    Path(test_id): Path<Uuid>,
) -> QuizResult<Response> {
    assign_test_form(&state, &session, &auth, test_id, Vec::new(), StatusCode::OK).await
}

async fn assign_test(
    auth: AuthUser,
    State(state): State<QuizzerState>,
    session: Session,
    Path(test_id): Path<Uuid>,
    form: Result<TypedMultipart<AssignTestForm>, TypedMultipartError>,
) -> QuizResult<Response> {
    let users = match form {
        Ok(TypedMultipart(AssignTestForm { users })) => users,
        Err(e) => {
            tracing::debug!("rejected assignment form: {e}");
            return assign_test_form(
                &state,
                &session,
                &auth,
                test_id,
                vec!["The submitted form could not be read.".to_owned()],
                e.get_status(),
            )
            .await;
        }
    };

    let Ok(user_ids) = users
        .iter()
        .map(|id| Uuid::parse_str(id.trim()))
        .collect::<Result<Vec<_>, _>>()
    else {
        return assign_test_form(
            &state,
            &session,
            &auth,
            test_id,
            vec!["Unknown user selected.".to_owned()],
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .await;
    };

    if let Err(errors) = validation::at_least_one_user(&user_ids) {
        return assign_test_form(
            &state,
            &session,
            &auth,
            test_id,
            validation::messages(&errors),
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .await;
    }

    match Answer::assign(&state.db_pool, test_id, &user_ids).await {
        Ok(_) => {
            flash::push(&session, Level::Success, "Test assigned to selected users.").await?;
            Ok(Redirect::to(&format!("/test/{test_id}")).into_response())
        }
        Err(e @ QuizError::NotFound("user")) => {
            let status = e.status();
            assign_test_form(&state, &session, &auth, test_id, vec![e.to_string()], status).await
        }
        Err(e) => Err(e),
    }
}
