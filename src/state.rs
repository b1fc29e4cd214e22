//! Runtime configuration, resolved once at startup from the environment.

pub const DEFAULT_SIGNIN_URL: &str = "https://adam-jerusalem.nd.edu/api/auth/signin";
pub const DEFAULT_GRAPHQL_URL: &str = "https://adam-jerusalem.nd.edu/api/graphql-engine/v1/graphql";

#[derive(Clone)]
pub struct Config {
    pub signin_url: String,
    pub graphql_url: String,
    pub sqlite_path: String,
    pub http_timeout_secs: u64,
    pub tick_ms: u64,
    pub report_path: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            signin_url: std::env::var("SIGNIN_URL").unwrap_or_else(|_| DEFAULT_SIGNIN_URL.to_string()),
            graphql_url: std::env::var("GRAPHQL_URL").unwrap_or_else(|_| DEFAULT_GRAPHQL_URL.to_string()),
            sqlite_path: std::env::var("SQLITE_PATH").unwrap_or_else(|_| "./xpboard.sqlite".to_string()),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
            tick_ms: std::env::var("TICK_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(250),
            report_path: std::env::var("REPORT_PATH").unwrap_or_else(|_| "out/report/index.html".to_string()),
        }
    }
}
