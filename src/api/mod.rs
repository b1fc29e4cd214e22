//! Platform API surface: sign-in and the profile query.
//!
//! `Api` is the seam the rest of the crate talks through, so the UI and
//! tests can run against a fake while the binary wires in [`HttpApi`].

pub mod auth;
pub mod graphql;
pub mod http;

use async_trait::async_trait;

use crate::state::Config;

pub use auth::{encode_basic_credentials, validate_token_shape, AuthError};
pub use graphql::{
    GroupRef, ProfileData, ProfileError, TransactionRecord, UserRecord, XpRecord, PROFILE_QUERY,
};
pub use http::HttpApi;

#[async_trait]
pub trait Api {
    /// Exchange credentials for a token. Returns the raw token text;
    /// shape validation is the caller's concern.
    async fn sign_in(&self, username: &str, password: &str) -> Result<String, AuthError>;

    /// Run the fixed profile query with a bearer token.
    async fn fetch_profile(&self, token: &str) -> Result<ProfileData, ProfileError>;
}

pub fn build(config: &Config) -> Box<dyn Api + Send + Sync> {
    Box::new(HttpApi::new(config))
}
