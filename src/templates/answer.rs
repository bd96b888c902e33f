use askama::Template;

use super::Layout;
use crate::models::AssignedAnswer;

#[derive(Template)]
#[template(path = "take_test.html")]
pub struct TakeTestPage {
    pub layout: Layout,
    pub answer: AssignedAnswer,
}

#[derive(Template)]
#[template(path = "answers.html")]
pub struct AnswersPage {
    pub layout: Layout,
    pub answers: Vec<AssignedAnswer>,
}
