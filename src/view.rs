//! View models: pure descriptions of what each panel shows.
//!
//! Builders here take domain data and return plain structs; the renderer
//! maps them onto widgets without further decisions. Keeping this layer
//! side-effect-free means the whole panel content is testable without a
//! terminal.

use crate::api::graphql::ProfileData;
use crate::charts::{build_skill_pie, build_xp_line, LineSpec, PieSpec};
use crate::stats::aggregate;

/// Fixed message shown on the login panel after a failed attempt.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

/// Placeholder when no allow-listed skill was seen.
pub const NO_SKILL_DATA: &str = "No skill data available";

/// Placeholder when the profile carried no XP records.
pub const NO_XP_DATA: &str = "No XP data available";

/// Exactly one panel is visible at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Login,
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Password,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginViewModel {
    pub username: String,
    pub masked_password: String,
    pub focus: Field,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileViewModel {
    pub welcome: String,
    pub info_lines: Vec<String>,
    pub pie: Option<PieSpec>,
    pub line: Option<LineSpec>,
    pub last_load_error: Option<String>,
}

pub fn build_login_view(
    username: &str,
    password: &str,
    focus: Field,
    error: Option<&str>,
) -> LoginViewModel {
    LoginViewModel {
        username: username.to_string(),
        masked_password: "*".repeat(password.chars().count()),
        focus,
        error: error.map(|e| e.to_string()),
    }
}

/// Build the profile panel. With no data (load failed or still pending)
/// the panel shows the welcome fallback and the load error; the info
/// block and charts stay empty instead of going stale.
pub fn build_profile_view(
    profile: Option<&ProfileData>,
    stored_username: &str,
    last_load_error: Option<&str>,
) -> ProfileViewModel {
    let first_name = profile
        .and_then(|p| p.user.first_name.as_deref())
        .filter(|name| !name.is_empty());
    let welcome = format!("Welcome, {}!", first_name.unwrap_or(stored_username));

    let (info_lines, pie, line) = match profile {
        Some(profile) => {
            let metrics = aggregate(profile);
            let user = &profile.user;
            let lines = vec![
                format!("ID: {}", user.id),
                format!("Groups: {}", user.groups.len()),
                format!(
                    "Name: {} {}",
                    user.first_name.as_deref().unwrap_or(""),
                    user.last_name.as_deref().unwrap_or("")
                ),
                format!("Audit Ratio: {:.2}", user.audit_ratio),
                format!("Total XP from Piscine-Go: {:.2} KB", metrics.piscine_go_kb),
                format!("Total XP from Piscine-JS: {:.2} KB", metrics.piscine_js_kb),
                format!("Total XP from module: {}%", metrics.module_xp_percent),
                format!("Highest Checkpoint Level: {}%", metrics.highest_checkpoint),
            ];
            (
                lines,
                build_skill_pie(&metrics),
                build_xp_line(&metrics),
            )
        }
        None => (Vec::new(), None, None),
    };

    ProfileViewModel {
        welcome,
        info_lines,
        pie,
        line,
        last_load_error: last_load_error.map(|e| e.to_string()),
    }
}
