#![deny(
    clippy::expect_used,
    clippy::future_not_send,
    clippy::pedantic,
    clippy::as_conversions,
    clippy::unwrap_used,
    unsafe_code
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::manual_non_exhaustive,
    clippy::multiple_crate_versions
)]

use std::io;

use clap::Parser;
use quizzer::{QuizzerArgs, server};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), io::Error> {
    // .env is optional
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quizzer=info")),
        )
        .init();

    let args = QuizzerArgs::parse();

    let listener = TcpListener::bind((args.host.as_str(), args.port))
        .await
        .map_err(io::Error::other)?;

    tracing::info!("listening on {}", listener.local_addr()?);

    let app = server(args).await?;

    axum::serve(listener, app).await
}
