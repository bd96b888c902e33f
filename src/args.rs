use clap::Parser;

#[derive(Clone, Debug, Parser)]
pub struct QuizzerArgs {
    /// SQLite database URL; the file is created if it does not exist
    #[clap(long, env = "QUIZZER_DATABASE_URL", default_value = "sqlite:data.sqlite")]
    pub database_url: String,

    /// Address to listen on
    #[clap(long, env = "QUIZZER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port
    #[clap(short, long, env = "QUIZZER_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Days of inactivity before a session expires
    #[clap(long, env = "QUIZZER_SESSION_DAYS", default_value_t = 7)]
    pub session_days: i64,

    /// Only send the session cookie over HTTPS
    #[clap(long, env = "QUIZZER_SECURE_COOKIES")]
    pub secure_cookies: bool,
}
