use std::collections::HashSet;

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    db,
    error::{QuizError, QuizResult},
    models::Question,
};

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Answer {
    pub id: Uuid,

    pub user_id: Uuid,
    pub question_id: Uuid,

    pub answer_text: Option<String>,
    pub answered_at: Option<NaiveDateTime>,
}

/// An answer together with the question and test it belongs to.
#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct AssignedAnswer {
    pub id: Uuid,
    pub user_id: Uuid,

    pub test_id: Uuid,
    pub test_title: String,

    pub position: i64,
    pub question_text: String,

    pub answer_text: Option<String>,
    pub answered_at: Option<NaiveDateTime>,
}

const ASSIGNED_SELECT: &str = "SELECT
        a.id,
        a.user_id,
        q.test_id,
        t.title AS test_title,
        q.position,
        q.text AS question_text,
        a.answer_text,
        a.answered_at
    FROM answers a
    JOIN questions q ON q.id = a.question_id
    JOIN tests t ON t.id = q.test_id";

impl Answer {
    /// Creates one empty answer per (user, question of the test) pair.
    ///
    /// Fails with `NotFound` and writes nothing if the test or any user is
    /// missing. Repeated ids in `user_ids` count once. Assigning the same
    /// test to the same user again creates a second set of answers.
    pub async fn assign(db: &SqlitePool, test_id: Uuid, user_ids: &[Uuid]) -> QuizResult<Vec<Self>> {
        let mut seen = HashSet::new();
        let user_ids: Vec<Uuid> = user_ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let mut tx = db::begin_write(db).await?;

        let test: Option<Uuid> = sqlx::query_scalar("SELECT id FROM tests WHERE id = ?")
            .bind(test_id)
            .fetch_optional(&mut *tx)
            .await?;

        if test.is_none() {
            return Err(QuizError::NotFound("test"));
        }

        for user_id in &user_ids {
            let user: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

            if user.is_none() {
                return Err(QuizError::NotFound("user"));
            }
        }

        let questions = sqlx::query_as::<_, Question>(
            "SELECT id, test_id, position, text FROM questions WHERE test_id = ? ORDER BY position",
        )
        .bind(test_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut answers = Vec::with_capacity(user_ids.len() * questions.len());

        for user_id in &user_ids {
            for question in &questions {
                let answer = Self {
                    id: Uuid::new_v4(),
                    user_id: *user_id,
                    question_id: question.id,
                    answer_text: None,
                    answered_at: None,
                };

                sqlx::query("INSERT INTO answers (id, user_id, question_id) VALUES (?, ?, ?)")
                    .bind(answer.id)
                    .bind(answer.user_id)
                    .bind(answer.question_id)
                    .execute(&mut *tx)
                    .await?;

                answers.push(answer);
            }
        }

        tx.commit().await?;

        tracing::info!(
            test_id = %test_id,
            users = user_ids.len(),
            answers = answers.len(),
            "assigned test"
        );

        Ok(answers)
    }

    /// Overwrites the response. Last write wins.
    pub async fn submit(db: &SqlitePool, answer_id: Uuid, text: &str) -> QuizResult<Self> {
        let answer = sqlx::query_as::<_, Self>(
            "UPDATE answers SET answer_text = ?, answered_at = ? WHERE id = ?
            RETURNING id, user_id, question_id, answer_text, answered_at",
        )
        .bind(text)
        .bind(Utc::now().naive_utc())
        .bind(answer_id)
        .fetch_optional(db)
        .await?
        .ok_or(QuizError::NotFound("answer"))?;

        tracing::info!(answer_id = %answer.id, user_id = %answer.user_id, "saved answer");

        Ok(answer)
    }

    pub async fn get_assigned(db: &SqlitePool, answer_id: Uuid) -> QuizResult<AssignedAnswer> {
        sqlx::query_as::<_, AssignedAnswer>(&format!("{ASSIGNED_SELECT} WHERE a.id = ?"))
            .bind(answer_id)
            .fetch_optional(db)
            .await?
            .ok_or(QuizError::NotFound("answer"))
    }

    pub async fn for_user(db: &SqlitePool, user_id: Uuid) -> sqlx::Result<Vec<AssignedAnswer>> {
        sqlx::query_as::<_, AssignedAnswer>(&format!(
            "{ASSIGNED_SELECT} WHERE a.user_id = ? ORDER BY t.created_at, t.rowid, q.position, a.rowid"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Test, User};

    async fn answer_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM answers")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn fixture(pool: &SqlitePool) -> (Test, User, User) {
        let test = Test::create_from_lines(pool, "Quiz", ["a", "b", "c"])
            .await
            .unwrap();
        let alice = User::register(pool, "alice", "pw").await.unwrap();
        let bob = User::register(pool, "bob", "pw").await.unwrap();

        (test, alice, bob)
    }

    #[tokio::test]
    async fn assign_fans_out_users_times_questions() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let (test, alice, bob) = fixture(&pool).await;

        let answers = Answer::assign(&pool, test.id, &[alice.id, bob.id])
            .await
            .unwrap();

        assert_eq!(answers.len(), 6);
        assert_eq!(answer_count(&pool).await, 6);
        assert!(answers.iter().all(|a| a.answer_text.is_none()));

        let mine = Answer::for_user(&pool, alice.id).await.unwrap();
        let prompts: Vec<_> = mine.iter().map(|a| a.question_text.as_str()).collect();
        assert_eq!(prompts, ["a", "b", "c"]);
        assert!(mine.iter().all(|a| a.test_title == "Quiz"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_assignments_on_a_file_store_all_commit() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("quiz.sqlite").display());
        let pool = db::connect(&url).await.unwrap();
        let (test, alice, bob) = fixture(&pool).await;

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let pool = pool.clone();
                let user_id = if i % 2 == 0 { alice.id } else { bob.id };
                tokio::spawn(async move { Answer::assign(&pool, test.id, &[user_id]).await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().len(), 3);
        }

        assert_eq!(answer_count(&pool).await, 24);
    }

    #[tokio::test]
    async fn unknown_user_aborts_the_whole_assignment() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let (test, alice, _) = fixture(&pool).await;

        let result = Answer::assign(&pool, test.id, &[alice.id, Uuid::new_v4()]).await;

        assert!(matches!(result, Err(QuizError::NotFound("user"))));
        assert_eq!(answer_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn unknown_test_is_not_found() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let (_, alice, _) = fixture(&pool).await;

        let result = Answer::assign(&pool, Uuid::new_v4(), &[alice.id]).await;

        assert!(matches!(result, Err(QuizError::NotFound("test"))));
    }

    #[tokio::test]
    async fn repeated_user_ids_count_once_but_reassigning_duplicates() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let (test, alice, _) = fixture(&pool).await;

        Answer::assign(&pool, test.id, &[alice.id, alice.id]).await.unwrap();
        assert_eq!(answer_count(&pool).await, 3);

        Answer::assign(&pool, test.id, &[alice.id]).await.unwrap();
        assert_eq!(answer_count(&pool).await, 6);
    }

    #[tokio::test]
    async fn submit_overwrites_and_is_idempotent() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let (test, alice, _) = fixture(&pool).await;
        let answers = Answer::assign(&pool, test.id, &[alice.id]).await.unwrap();
        let id = answers[0].id;

        Answer::submit(&pool, id, "4").await.unwrap();
        let first = Answer::get_assigned(&pool, id).await.unwrap();
        Answer::submit(&pool, id, "4").await.unwrap();
        let second = Answer::get_assigned(&pool, id).await.unwrap();

        assert_eq!(first.answer_text.as_deref(), Some("4"));
        assert_eq!(second.answer_text, first.answer_text);

        let changed = Answer::submit(&pool, id, "five").await.unwrap();
        assert_eq!(changed.answer_text.as_deref(), Some("five"));
        assert!(changed.answered_at.is_some());
    }

    #[tokio::test]
    async fn submitting_to_a_missing_answer_fails() {
        let pool = db::connect("sqlite::memory:").await.unwrap();

        assert!(matches!(
            Answer::submit(&pool, Uuid::new_v4(), "x").await,
            Err(QuizError::NotFound("answer"))
        ));
    }

    #[tokio::test]
    async fn deleting_a_test_removes_its_answers() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let (test, alice, _) = fixture(&pool).await;
        Answer::assign(&pool, test.id, &[alice.id]).await.unwrap();

        Test::delete(&pool, test.id).await.unwrap();

        assert_eq!(answer_count(&pool).await, 0);
    }
}
