//! Uploaded JSON test documents.

use serde_json::{Map, Value, json};

use crate::{
    error::{QuizError, QuizResult},
    validation::TITLE_MAX,
};

/// A parsed upload. The raw text is kept so the document can be shown
/// again exactly as it was uploaded.
#[derive(Debug, Clone)]
pub struct TestDocument {
    pub title: String,
    pub questions: Vec<String>,
    raw: String,
}

impl TestDocument {
    pub fn parse(raw: impl Into<String>) -> QuizResult<Self> {
        let raw = raw.into();

        let value: Value =
            serde_json::from_str(&raw).map_err(|e| malformed(format!("invalid JSON: {e}")))?;

        let Value::Object(fields) = &value else {
            return Err(malformed("document must be a JSON object"));
        };

        let title = title(fields)?;
        let questions = questions(fields)?;

        Ok(Self {
            title,
            questions,
            raw,
        })
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Document shape used for tests that were authored rather than uploaded.
    #[must_use]
    pub fn synthesize<S: AsRef<str>>(title: &str, questions: &[S]) -> Value {
        let questions: Vec<&str> = questions.iter().map(AsRef::as_ref).collect();

        json!({
            "title": title,
            "questions": questions,
        })
    }
}

fn malformed(reason: impl Into<String>) -> QuizError {
    QuizError::MalformedDocument(reason.into())
}

fn title(fields: &Map<String, Value>) -> QuizResult<String> {
    match fields.get("title") {
        Some(Value::String(title)) if title.trim().is_empty() => {
            Err(malformed("`title` must not be empty"))
        }
        Some(Value::String(title)) if title.chars().count() > TITLE_MAX => Err(malformed(
            format!("`title` must be at most {TITLE_MAX} characters"),
        )),
        Some(Value::String(title)) => Ok(title.clone()),
        Some(_) => Err(malformed("`title` must be a string")),
        None => Err(malformed("missing field `title`")),
    }
}

fn questions(fields: &Map<String, Value>) -> QuizResult<Vec<String>> {
    let items = match fields.get("questions") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(malformed("`questions` must be an array")),
    };

    let mut questions = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let text = match item {
            Value::String(text) => text,
            Value::Object(question) => match question.get("text") {
                Some(Value::String(text)) => text,
                _ => {
                    return Err(malformed(format!(
                        "question {index} has no string `text`"
                    )));
                }
            },
            _ => {
                return Err(malformed(format!(
                    "question {index} must be a string or an object"
                )));
            }
        };

        let text = text.trim();
        if !text.is_empty() {
            questions.push(text.to_owned());
        }
    }

    Ok(questions)
}
