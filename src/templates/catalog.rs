use askama::Template;
use serde_json::Value;

use super::Layout;
use crate::models::{Question, Test};

#[derive(Template)]
#[template(path = "create_test.html")]
pub struct CreateTestPage {
    pub layout: Layout,
    pub title: String,
    pub questions: String,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "upload_json.html")]
pub struct UploadJsonPage {
    pub layout: Layout,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "tests.html")]
pub struct TestsPage {
    pub layout: Layout,
    pub tests: Vec<Test>,
}

#[derive(Template)]
#[template(path = "test.html")]
pub struct TestPage {
    pub layout: Layout,
    pub test: Test,
    pub questions: Vec<Question>,
    pub fields: Vec<DocumentField>,
}

/// One top-level field of a test document, ready for display.
pub struct DocumentField {
    pub name: String,
    pub value: String,
}

impl DocumentField {
    /// Strings are shown as-is, everything else as pretty-printed JSON.
    #[must_use]
    pub fn from_document(document: &Value) -> Vec<Self> {
        let Value::Object(fields) = document else {
            return Vec::new();
        };

        fields
            .iter()
            .map(|(name, value)| Self {
                name: name.clone(),
                value: match value {
                    Value::String(text) => text.clone(),
                    other => serde_json::to_string_pretty(other).unwrap_or_default(),
                },
            })
            .collect()
    }
}
