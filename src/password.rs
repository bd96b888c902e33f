use argon2::{
    Argon2,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::rngs::OsRng;

use crate::error::{QuizError, QuizResult};

/// Salted argon2id hash in PHC string form.
pub fn hash(password: &str) -> QuizResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(QuizError::PasswordHash)
}

pub fn verify(password: &str, stored: &str) -> QuizResult<bool> {
    let parsed = PasswordHash::new(stored).map_err(QuizError::PasswordHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(QuizError::PasswordHash(e)),
    }
}

/// Runs [`hash`] on the blocking thread pool.
pub async fn hash_blocking(password: &str) -> QuizResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash(&password)).await?
}

pub async fn verify_blocking(password: &str, stored: &str) -> QuizResult<bool> {
    let (password, stored) = (password.to_owned(), stored.to_owned());
    tokio::task::spawn_blocking(move || verify(&password, &stored)).await?
}
