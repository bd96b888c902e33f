use askama::Template;

use super::Layout;
use crate::models::{Question, Test, User};

#[derive(Template)]
#[template(path = "assign_test.html")]
pub struct AssignTestPage {
    pub layout: Layout,
    pub test: Test,
    pub questions: Vec<Question>,
    pub users: Vec<User>,
    pub errors: Vec<String>,
}
