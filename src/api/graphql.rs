//! The fixed profile query and its response model.

use serde::Deserialize;
use thiserror::Error;

/// The one query this client ever sends. Field names follow the
/// platform schema, hence the camelCase.
pub const PROFILE_QUERY: &str = r#"{
    user {
        id
        firstName
        lastName
        auditRatio
        xps {
            amount
            path
        }
        groups {
            id
        }
    }
    transaction {
        type
        amount
        createdAt
    }
}"#;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("no stored session")]
    NoSession,
    #[error("profile request rejected: {0}")]
    Rejected(String),
    #[error("user data not available")]
    NoUserData,
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct XpRecord {
    pub amount: f64,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupRef {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: u64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub audit_ratio: f64,
    #[serde(default)]
    pub xps: Vec<XpRecord>,
    #[serde(default)]
    pub groups: Vec<GroupRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
    #[serde(default)]
    pub created_at: String,
}

/// Everything the profile panel needs, extracted from one response.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileData {
    pub user: UserRecord,
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Payload>,
}

#[derive(Deserialize)]
struct Payload {
    #[serde(default)]
    user: Vec<UserRecord>,
    #[serde(default)]
    transaction: Vec<TransactionRecord>,
}

/// Pull the first user and the transaction list out of a response body.
/// The server returns `user` as an array; only the first entry matters.
/// A missing `data` object or an empty user array both mean there is
/// nothing to show.
pub fn extract_profile(body: &str) -> Result<ProfileData, ProfileError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|err| ProfileError::Malformed(err.to_string()))?;
    let payload = envelope.data.ok_or(ProfileError::NoUserData)?;
    let mut users = payload.user;
    if users.is_empty() {
        return Err(ProfileError::NoUserData);
    }
    Ok(ProfileData {
        user: users.swap_remove(0),
        transactions: payload.transaction,
    })
}
