#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use quizzer::{QuizzerArgs, QuizzerState, db, router};
use sqlx::SqlitePool;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use uuid::Uuid;

const BOUNDARY: &str = "quizzer-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
}

/// One multipart field. `file_name` makes it a file upload.
pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content: &'a str,
}

impl TestApp {
    pub async fn new() -> Self {
        let pool = db::connect("sqlite::memory:").await.unwrap();

        let config = QuizzerArgs {
            database_url: "sqlite::memory:".to_owned(),
            host: "127.0.0.1".to_owned(),
            port: 0,
            session_days: 7,
            secure_cookies: false,
        };

        let sessions = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);
        let router = router(QuizzerState::new(pool.clone(), config)).layer(sessions);

        Self { router, pool }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::get(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        self.send(request.body(Body::empty()).unwrap()).await
    }

    /// `body` must already be form-urlencoded.
    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, body: &str) -> Response<Body> {
        let mut request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        self.send(request.body(Body::from(body.to_owned())).unwrap())
            .await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        cookie: Option<&str>,
        parts: &[Part<'_>],
    ) -> Response<Body> {
        let mut request = Request::post(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        self.send(request.body(Body::from(multipart_body(parts))).unwrap())
            .await
    }

    pub async fn register(&self, username: &str, password: &str) -> Response<Body> {
        self.post_form(
            "/register",
            None,
            &format!("username={username}&password={password}"),
        )
        .await
    }

    /// Registers `username` and returns the cookie of a logged-in session.
    pub async fn login_as(&self, username: &str) -> String {
        let response = self.register(username, "password").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = self
            .post_form(
                "/login",
                None,
                &format!("username={username}&password=password"),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");

        session_cookie(&response).expect("login sets a session cookie")
    }

    pub async fn user_id(&self, username: &str) -> Uuid {
        sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

fn multipart_body(parts: &[Part<'_>]) -> String {
    let mut body = String::new();

    for part in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));

        match part.file_name {
            Some(file_name) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                part.name
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                part.name
            )),
        }

        body.push_str(part.content);
        body.push_str("\r\n");
    }

    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    let value = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    value.split(';').next().map(str::to_owned)
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

pub async fn text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    String::from_utf8(bytes.to_vec()).unwrap()
}
