pub use answer::{Answer, AssignedAnswer};
pub use question::Question;
pub use test::Test;
pub use user::User;

mod answer;
mod question;
mod user;
