use axum::{
    Form, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart, TypedMultipartError};
use futures::TryStreamExt;
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{QuizError, QuizResult},
    flash::{self, Level},
    models::{Question, Test},
    state::QuizzerState,
    templates::{
        CreateTestPage, DocumentField, Layout, TestPage, TestsPage, UploadJsonPage, render,
    },
    validation,
};

pub fn router() -> Router<QuizzerState> {
    Router::new()
        .route("/create-test", get(create_test_page).post(create_test))
        .route("/upload-json", get(upload_json_page).post(upload_json))
        .route("/tests", get(list_tests))
        .route("/test/{id}", get(view_test))
        .route("/test/{id}/delete", post(delete_test))
}

#[derive(Default, Deserialize)]
struct CreateTestForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    questions: String,
}

async fn create_test_form(
    session: &Session,
    auth: &AuthUser,
    form: CreateTestForm,
    errors: Vec<String>,
    status: StatusCode,
) -> QuizResult<Response> {
    let page = CreateTestPage {
        layout: Layout::load(session, Some(&auth.0)).await?,
        title: form.title,
        questions: form.questions,
        errors,
    };

    render(&page, status)
}

async fn create_test_page(auth: AuthUser, session: Session) -> QuizResult<Response> {
    create_test_form(
        &session,
        &auth,
        CreateTestForm::default(),
        Vec::new(),
        StatusCode::OK,
    )
    .await
}

async fn create_test(
    auth: AuthUser,
    State(state): State<QuizzerState>,
    session: Session,
    Form(form): Form<CreateTestForm>,
) -> QuizResult<Response> {
    let new_test = match validation::new_test(&form.title, &form.questions) {
        Ok(new_test) => new_test,
        Err(errors) => {
            return create_test_form(
                &session,
                &auth,
                form,
                validation::messages(&errors),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
        }
    };

    let test = Test::create_from_lines(&state.db_pool, &new_test.title, &new_test.lines).await?;

    flash::push(&session, Level::Success, "Test has been created!").await?;

    Ok(Redirect::to(&format!("/assign-test/{}", test.id)).into_response())
}

#[derive(Debug, TryFromMultipart)]
pub struct UploadJsonForm {
    #[form_data(limit = "1MiB")]
    pub file: FieldData<Bytes>,
}

async fn upload_json_form(
    session: &Session,
    auth: &AuthUser,
    errors: Vec<String>,
    status: StatusCode,
) -> QuizResult<Response> {
    let page = UploadJsonPage {
        layout: Layout::load(session, Some(&auth.0)).await?,
        errors,
    };

    render(&page, status)
}

async fn upload_json_page(auth: AuthUser, session: Session) -> QuizResult<Response> {
    upload_json_form(&session, &auth, Vec::new(), StatusCode::OK).await
}

async fn upload_json(
    auth: AuthUser,
    State(state): State<QuizzerState>,
    session: Session,
    form: Result<TypedMultipart<UploadJsonForm>, TypedMultipartError>,
) -> QuizResult<Response> {
    let file = match form {
        Ok(TypedMultipart(UploadJsonForm { file })) => file,
        Err(e) => {
            tracing::debug!("rejected upload: {e}");
            let message = match &e {
                TypedMultipartError::MissingField { .. } => "Choose a JSON file to upload.",
                TypedMultipartError::FieldTooLarge { .. } => "The file must be at most 1 MiB.",
                _ => "The upload could not be read.",
            };
            return upload_json_form(&session, &auth, vec![message.to_owned()], e.get_status())
                .await;
        }
    };

    if let Err(errors) = validation::json_file_name(file.metadata.file_name.as_deref()) {
        return upload_json_form(
            &session,
            &auth,
            validation::messages(&errors),
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .await;
    }

    let imported = match std::str::from_utf8(&file.contents) {
        Ok(raw) => Test::import_from_document(&state.db_pool, raw).await,
        Err(_) => Err(QuizError::MalformedDocument(
            "document is not valid UTF-8".to_owned(),
        )),
    };

    match imported {
        Ok(_) => {
            flash::push(&session, Level::Success, "JSON uploaded successfully!").await?;
            Ok(Redirect::to("/tests").into_response())
        }
        Err(e) if e.is_user_facing() => {
            let status = e.status();
            upload_json_form(&session, &auth, vec![e.to_string()], status).await
        }
        Err(e) => Err(e),
    }
}

async fn list_tests(
    auth: AuthUser,
    State(state): State<QuizzerState>,
    session: Session,
) -> QuizResult<Response> {
    let tests: Vec<Test> = Test::list(&state.db_pool).try_collect().await?;

    let page = TestsPage {
        layout: Layout::load(&session, Some(&auth.0)).await?,
        tests,
    };

    render(&page, StatusCode::OK)
}

async fn view_test(
    auth: AuthUser,
    State(state): State<QuizzerState>,
    session: Session,
    Path(test_id): Path<Uuid>,
) -> QuizResult<Response> {
    let test = Test::get_by_id(&state.db_pool, test_id).await?;
    let questions = Question::for_test(&state.db_pool, test.id).await?;
    let document = test.document(&questions)?;

    let page = TestPage {
        layout: Layout::load(&session, Some(&auth.0)).await?,
        fields: DocumentField::from_document(&document),
        test,
        questions,
    };

    render(&page, StatusCode::OK)
}

async fn delete_test(
    _auth: AuthUser,
    State(state): State<QuizzerState>,
    session: Session,
    Path(test_id): Path<Uuid>,
) -> QuizResult<Redirect> {
    Test::delete(&state.db_pool, test_id).await?;

    flash::push(&session, Level::Success, "Test has been deleted.").await?;

    Ok(Redirect::to("/tests"))
}
