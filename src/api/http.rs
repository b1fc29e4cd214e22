//! HTTP-backed [`Api`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde_json::json;

use crate::api::auth::{encode_basic_credentials, AuthError};
use crate::api::graphql::{extract_profile, ProfileData, ProfileError, PROFILE_QUERY};
use crate::api::Api;
use crate::logging::{log, obj, params_hash, v_str, Domain, Level, ProfileScope};
use crate::state::Config;

pub struct HttpApi {
    client: Client,
    signin_url: String,
    graphql_url: String,
}

impl HttpApi {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            signin_url: config.signin_url.clone(),
            graphql_url: config.graphql_url.clone(),
        }
    }
}

/// Some deployments return the token as a bare string, others as a JSON
/// string literal. Accept both.
fn strip_token_quotes(body: &str) -> &str {
    let token = body.trim();
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token)
}

#[async_trait]
impl Api for HttpApi {
    async fn sign_in(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let _scope =
            ProfileScope::with_context("sign_in", &[("endpoint", v_str(&self.signin_url))]);
        log(
            Level::Debug,
            Domain::Auth,
            "signin_request",
            obj(&[
                ("endpoint", v_str(&self.signin_url)),
                ("username", v_str(username)),
            ]),
        );

        let credentials = encode_basic_credentials(username, password);
        let resp = self
            .client
            .post(&self.signin_url)
            .header(AUTHORIZATION, format!("Basic {}", credentials))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            log(
                Level::Warn,
                Domain::Auth,
                "signin_rejected",
                obj(&[
                    ("status", json!(status.as_u16())),
                    ("username", v_str(username)),
                ]),
            );
            return Err(AuthError::Rejected(format!("{} - {}", status, body)));
        }

        let token = strip_token_quotes(&body).to_string();
        log(
            Level::Info,
            Domain::Auth,
            "signin_ok",
            obj(&[
                ("username", v_str(username)),
                ("token_hash", v_str(&params_hash(&token))),
            ]),
        );
        Ok(token)
    }

    async fn fetch_profile(&self, token: &str) -> Result<ProfileData, ProfileError> {
        let _scope =
            ProfileScope::with_context("fetch_profile", &[("endpoint", v_str(&self.graphql_url))]);
        log(
            Level::Debug,
            Domain::Api,
            "graphql_request",
            obj(&[
                ("endpoint", v_str(&self.graphql_url)),
                ("token_hash", v_str(&params_hash(token))),
            ]),
        );

        let resp = self
            .client
            .post(&self.graphql_url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .json(&json!({ "query": PROFILE_QUERY }))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            log(
                Level::Warn,
                Domain::Api,
                "graphql_rejected",
                obj(&[("status", json!(status.as_u16()))]),
            );
            return Err(ProfileError::Rejected(format!("{} - {}", status, body)));
        }

        let profile = extract_profile(&body)?;
        log(
            Level::Info,
            Domain::Api,
            "graphql_ok",
            obj(&[
                ("xp_entries", json!(profile.user.xps.len())),
                ("transactions", json!(profile.transactions.len())),
            ]),
        );
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_token_quotes() {
        assert_eq!(strip_token_quotes("a.b.c"), "a.b.c");
        assert_eq!(strip_token_quotes("\"a.b.c\""), "a.b.c");
        assert_eq!(strip_token_quotes("  a.b.c\n"), "a.b.c");
        assert_eq!(strip_token_quotes("\""), "\"");
    }
}
