//! Application state: which panel is up, what the inputs hold, what the
//! last fetch produced.
//!
//! The store and the API client are injected, so the whole flow runs
//! against fakes in tests. Network calls go through `Handle::block_on`;
//! the flow is strictly sequential and the UI waits with it.

use std::time::Instant;

use crossterm::event::KeyCode;
use serde_json::json;
use tokio::runtime::Handle;

use crate::api::{validate_token_shape, Api, AuthError, ProfileError};
use crate::api::graphql::ProfileData;
use crate::logging::{log, log_session_summary, obj, params_hash, v_str, Domain, Level};
use crate::session::{Session, SessionStore};
use crate::view::{
    build_login_view, build_profile_view, Field, LoginViewModel, Panel, ProfileViewModel,
    LOGIN_FAILED_MESSAGE,
};

pub struct App {
    store: SessionStore,
    api: Box<dyn Api + Send + Sync>,
    runtime: Handle,
    panel: Panel,
    username_input: String,
    password_input: String,
    focus: Field,
    login_error: Option<String>,
    profile: Option<ProfileData>,
    stored_username: String,
    last_load_error: Option<String>,
    should_quit: bool,
    started: Instant,
    sign_ins: u64,
    profile_loads: u64,
    load_errors: u64,
}

impl App {
    pub fn new(store: SessionStore, api: Box<dyn Api + Send + Sync>, runtime: Handle) -> Self {
        Self {
            store,
            api,
            runtime,
            panel: Panel::Login,
            username_input: String::new(),
            password_input: String::new(),
            focus: Field::Username,
            login_error: None,
            profile: None,
            stored_username: String::new(),
            last_load_error: None,
            should_quit: false,
            started: Instant::now(),
            sign_ins: 0,
            profile_loads: 0,
            load_errors: 0,
        }
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn login_view(&self) -> LoginViewModel {
        build_login_view(
            &self.username_input,
            &self.password_input,
            self.focus,
            self.login_error.as_deref(),
        )
    }

    pub fn profile_view(&self) -> ProfileViewModel {
        build_profile_view(
            self.profile.as_ref(),
            &self.stored_username,
            self.last_load_error.as_deref(),
        )
    }

    pub fn current_session(&self) -> Option<Session> {
        self.store.current().ok().flatten()
    }

    /// Resume a stored session on startup: a persisted token means the
    /// profile loads immediately, no sign-in required.
    pub fn startup_resume(&mut self) {
        if let Some(session) = self.current_session() {
            log(
                Level::Info,
                Domain::Session,
                "session_resumed",
                obj(&[
                    ("username", v_str(&session.username)),
                    ("token_hash", v_str(&params_hash(&session.token))),
                ]),
            );
            self.stored_username = session.username;
            self.load_profile();
        }
    }

    pub fn on_key(&mut self, code: KeyCode) {
        match self.panel {
            Panel::Login => self.on_login_key(code),
            Panel::Profile => self.on_profile_key(code),
        }
    }

    fn on_login_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.focus = match self.focus {
                    Field::Username => Field::Password,
                    Field::Password => Field::Username,
                };
            }
            KeyCode::Backspace => {
                self.focused_input_mut().pop();
            }
            KeyCode::Enter => self.submit_login(),
            KeyCode::Char(c) => self.focused_input_mut().push(c),
            _ => {}
        }
    }

    fn on_profile_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('l') => self.logout(),
            KeyCode::Char('r') => self.load_profile(),
            _ => {}
        }
    }

    fn focused_input_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Username => &mut self.username_input,
            Field::Password => &mut self.password_input,
        }
    }

    /// The login flow: sign in, check the token shape, persist the
    /// session, then load the profile. Any failure keeps the session
    /// store untouched and the login panel up with the fixed message.
    pub fn submit_login(&mut self) {
        let username = self.username_input.clone();
        let password = self.password_input.clone();
        log(
            Level::Info,
            Domain::Ui,
            "login_submitted",
            obj(&[("username", v_str(&username))]),
        );

        let token = match self
            .runtime
            .block_on(self.api.sign_in(&username, &password))
        {
            Ok(token) => token,
            Err(err) => {
                self.fail_login(&err);
                return;
            }
        };

        if !validate_token_shape(&token) {
            log(
                Level::Warn,
                Domain::Auth,
                "token_shape_invalid",
                obj(&[("token_hash", v_str(&params_hash(&token)))]),
            );
            self.fail_login(&AuthError::InvalidTokenShape);
            return;
        }

        let session = Session {
            token,
            username: username.clone(),
        };
        if let Err(err) = self.store.save(&session) {
            log(
                Level::Error,
                Domain::Session,
                "session_save_failed",
                obj(&[("msg", v_str(&err.to_string()))]),
            );
            self.login_error = Some(LOGIN_FAILED_MESSAGE.to_string());
            return;
        }
        log(
            Level::Info,
            Domain::Session,
            "session_saved",
            obj(&[
                ("username", v_str(&session.username)),
                ("token_hash", v_str(&params_hash(&session.token))),
            ]),
        );

        self.sign_ins += 1;
        self.stored_username = username;
        self.login_error = None;
        self.load_profile();
    }

    fn fail_login(&mut self, err: &AuthError) {
        log(
            Level::Warn,
            Domain::Auth,
            "login_failed",
            obj(&[("msg", v_str(&err.to_string()))]),
        );
        self.login_error = Some(LOGIN_FAILED_MESSAGE.to_string());
    }

    /// Fetch the profile with the stored token. The panel switches
    /// before the fetch, so a failed load shows the profile frame with
    /// the error surfaced rather than bouncing back to login.
    pub fn load_profile(&mut self) {
        self.set_panel(Panel::Profile);

        let session = match self.store.current() {
            Ok(session) => session,
            Err(err) => {
                self.fail_load(&err.to_string());
                return;
            }
        };
        let session = match session {
            Some(session) => session,
            None => {
                self.fail_load(&ProfileError::NoSession.to_string());
                return;
            }
        };
        self.stored_username = session.username;

        match self.runtime.block_on(self.api.fetch_profile(&session.token)) {
            Ok(profile) => {
                self.profile_loads += 1;
                log(
                    Level::Info,
                    Domain::Stats,
                    "profile_loaded",
                    obj(&[
                        ("xp_entries", json!(profile.user.xps.len())),
                        ("transactions", json!(profile.transactions.len())),
                        ("groups", json!(profile.user.groups.len())),
                    ]),
                );
                self.profile = Some(profile);
                self.last_load_error = None;
            }
            Err(err) => self.fail_load(&err.to_string()),
        }
    }

    // A failed load keeps any previously fetched profile on screen;
    // only the error field changes.
    fn fail_load(&mut self, msg: &str) {
        self.load_errors += 1;
        log(
            Level::Error,
            Domain::Api,
            "profile_load_failed",
            obj(&[("msg", v_str(msg))]),
        );
        self.last_load_error = Some(msg.to_string());
    }

    /// Drop the stored session and return to the login panel.
    pub fn logout(&mut self) {
        if let Err(err) = self.store.clear() {
            log(
                Level::Error,
                Domain::Session,
                "session_clear_failed",
                obj(&[("msg", v_str(&err.to_string()))]),
            );
        } else {
            log(Level::Info, Domain::Session, "session_cleared", obj(&[]));
        }
        self.profile = None;
        self.last_load_error = None;
        self.login_error = None;
        self.username_input.clear();
        self.password_input.clear();
        self.focus = Field::Username;
        self.set_panel(Panel::Login);
    }

    fn set_panel(&mut self, panel: Panel) {
        if self.panel != panel {
            log(
                Level::Debug,
                Domain::Ui,
                "panel_switched",
                obj(&[(
                    "panel",
                    v_str(match panel {
                        Panel::Login => "login",
                        Panel::Profile => "profile",
                    }),
                )]),
            );
        }
        self.panel = panel;
    }

    pub fn log_shutdown_summary(&self) {
        log_session_summary(
            self.started.elapsed().as_secs(),
            self.sign_ins,
            self.profile_loads,
            self.load_errors,
        );
    }
}
