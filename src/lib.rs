//! Terminal dashboard for a school platform profile: sign in with Basic
//! credentials, persist the session, run the fixed GraphQL query, and
//! render aggregated XP and skill figures as text and charts.

pub mod api;
pub mod charts;
pub mod logging;
pub mod session;
pub mod state;
pub mod stats;
pub mod ui;
pub mod view;
