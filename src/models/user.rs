use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    db,
    error::{QuizError, QuizResult},
    password,
};

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: NaiveDateTime,
}

impl User {
    /// Creates a user with a freshly salted hash of `password`.
    ///
    /// The hash is computed before the write transaction opens so the write
    /// lock is never held across it.
    pub async fn register(db: &SqlitePool, username: &str, password: &str) -> QuizResult<Self> {
        let password_hash = password::hash_blocking(password).await?;

        let mut tx = db::begin_write(db).await?;

        let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&mut *tx)
            .await?;

        if existing.is_some() {
            return Err(QuizError::DuplicateUser);
        }

        let user = Self {
            id: Uuid::new_v4(),
            username: username.to_owned(),
            password_hash,
            created_at: Utc::now().naive_utc(),
        };

        sqlx::query(
            "INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                QuizError::DuplicateUser
            }
            e => QuizError::Database(e),
        })?;

        tx.commit().await?;

        tracing::info!(user_id = %user.id, username = %user.username, "registered user");

        Ok(user)
    }

    pub async fn authenticate(db: &SqlitePool, username: &str, password: &str) -> QuizResult<Self> {
        let user = sqlx::query_as::<_, Self>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(db)
        .await?
        .ok_or(QuizError::InvalidCredentials)?;

        if password::verify_blocking(password, &user.password_hash).await? {
            Ok(user)
        } else {
            Err(QuizError::InvalidCredentials)
        }
    }

    pub async fn find(db: &SqlitePool, id: Uuid) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn get_by_id(db: &SqlitePool, id: Uuid) -> QuizResult<Self> {
        Self::find(db, id).await?.ok_or(QuizError::NotFound("user"))
    }

    pub async fn all(db: &SqlitePool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, username, password_hash, created_at FROM users ORDER BY username",
        )
        .fetch_all(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let pool = db::connect("sqlite::memory:").await.unwrap();

        let user = User::register(&pool, "alice", "s3cret").await.unwrap();
        assert_ne!(user.password_hash, "s3cret");

        let found = User::authenticate(&pool, "alice", "s3cret").await.unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected_without_a_new_row() {
        let pool = db::connect("sqlite::memory:").await.unwrap();

        User::register(&pool, "alice", "one").await.unwrap();
        let second = User::register(&pool, "alice", "two").await;

        assert!(matches!(second, Err(QuizError::DuplicateUser)));
        assert_eq!(user_count(&pool).await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_on_a_file_store_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("quiz.sqlite").display());
        let pool = db::connect(&url).await.unwrap();

        for round in 0..5 {
            let tasks: Vec<_> = (0..4)
                .map(|i| {
                    let pool = pool.clone();
                    tokio::spawn(async move {
                        User::register(&pool, &format!("user-{round}-{i}"), "pw").await
                    })
                })
                .collect();

            for task in tasks {
                task.await.unwrap().unwrap();
            }
        }

        assert_eq!(user_count(&pool).await, 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_registrations_of_one_name_store_a_single_user() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("quiz.sqlite").display());
        let pool = db::connect(&url).await.unwrap();

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let pool = pool.clone();
                tokio::spawn(async move { User::register(&pool, "carol", "pw").await })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(QuizError::DuplicateUser) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(user_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        User::register(&pool, "bob", "right").await.unwrap();

        assert!(matches!(
            User::authenticate(&pool, "bob", "wrong").await,
            Err(QuizError::InvalidCredentials)
        ));
        assert!(matches!(
            User::authenticate(&pool, "nobody", "right").await,
            Err(QuizError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn get_by_id_reports_missing_users() {
        let pool = db::connect("sqlite::memory:").await.unwrap();

        assert!(matches!(
            User::get_by_id(&pool, Uuid::new_v4()).await,
            Err(QuizError::NotFound("user"))
        ));
    }
}
