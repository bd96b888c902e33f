use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Question {
    pub id: Uuid,
    pub test_id: Uuid,

    /// 0-based order within the test.
    pub position: i64,
    pub text: String,
}

impl Question {
    pub async fn for_test(db: &SqlitePool, test_id: Uuid) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, test_id, position, text FROM questions WHERE test_id = ? ORDER BY position",
        )
        .bind(test_id)
        .fetch_all(db)
        .await
    }

    pub(crate) async fn insert_all(
        conn: &mut SqliteConnection,
        test_id: Uuid,
        texts: &[String],
    ) -> sqlx::Result<Vec<Self>> {
        let mut questions = Vec::with_capacity(texts.len());

        for (position, text) in (0_i64..).zip(texts) {
            let question = Self {
                id: Uuid::new_v4(),
                test_id,
                position,
                text: text.clone(),
            };

            sqlx::query("INSERT INTO questions (id, test_id, position, text) VALUES (?, ?, ?, ?)")
                .bind(question.id)
                .bind(question.test_id)
                .bind(question.position)
                .bind(&question.text)
                .execute(&mut *conn)
                .await?;

            questions.push(question);
        }

        Ok(questions)
    }
}
