//! Form input checks. Each function either returns the cleaned input or
//! every field error found, so a form can be re-displayed with all of them.

use std::{fmt, path::Path};

use validator::{Validate, ValidationErrors};

pub const TITLE_MAX: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub type Validated<T> = Result<T, Vec<FieldError>>;

#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "Username is required."))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

#[derive(Validate)]
struct Registration {
    #[validate(length(
        min = 2,
        max = 20,
        message = "Username must be between 2 and 20 characters."
    ))]
    username: String,

    #[validate(length(min = 1, message = "Password is required."))]
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTest {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Validate)]
struct NewTestInput {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Title is required and must be at most 100 characters."
    ))]
    title: String,

    #[validate(length(min = 1, message = "At least one question is required."))]
    questions: String,
}

/// Field errors in form order. `validator` reports them in a hash map.
fn field_errors(errors: &ValidationErrors, order: &[&'static str]) -> Vec<FieldError> {
    let by_field = errors.field_errors();

    order
        .iter()
        .filter_map(|field| by_field.get(*field).map(|errors| (*field, errors)))
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string);

                FieldError::new(field, message)
            })
        })
        .collect()
}

/// Whitespace-only input counts as missing.
pub fn registration(username: &str, password: &str) -> Validated<Credentials> {
    let username = username.trim();

    Registration {
        username: username.to_owned(),
        password: password.trim().to_owned(),
    }
    .validate()
    .map_err(|errors| field_errors(&errors, &["username", "password"]))?;

    Ok(Credentials {
        username: username.to_owned(),
        password: password.to_owned(),
    })
}

pub fn login(username: &str, password: &str) -> Validated<Credentials> {
    Credentials {
        username: username.trim().to_owned(),
        password: password.trim().to_owned(),
    }
    .validate()
    .map_err(|errors| field_errors(&errors, &["username", "password"]))?;

    Ok(Credentials {
        username: username.trim().to_owned(),
        password: password.to_owned(),
    })
}

/// `questions` is the raw textarea content, one question per line.
pub fn new_test(title: &str, questions: &str) -> Validated<NewTest> {
    let title = title.trim();

    NewTestInput {
        title: title.to_owned(),
        questions: questions.trim().to_owned(),
    }
    .validate()
    .map_err(|errors| field_errors(&errors, &["title", "questions"]))?;

    Ok(NewTest {
        title: title.to_owned(),
        lines: questions.split('\n').map(str::to_owned).collect(),
    })
}

pub fn json_file_name(file_name: Option<&str>) -> Validated<()> {
    let is_json = file_name.is_some_and(|name| {
        Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    });

    if is_json {
        Ok(())
    } else {
        Err(vec![FieldError::new(
            "file",
            "Only JSON files are allowed.",
        )])
    }
}

pub fn at_least_one_user<T>(selected: &[T]) -> Validated<()> {
    if selected.is_empty() {
        Err(vec![FieldError::new("users", "Select at least one user.")])
    } else {
        Ok(())
    }
}

/// Flattens field errors into messages for display.
#[must_use]
pub fn messages(errors: &[FieldError]) -> Vec<String> {
    errors.iter().map(ToString::to_string).collect()
}
