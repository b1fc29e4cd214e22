use anyhow::Result;

use xpboard::api;
use xpboard::logging::{log, obj, v_str, Domain, Level};
use xpboard::session::SessionStore;
use xpboard::state::Config;
use xpboard::ui::{self, App};

fn main() -> Result<()> {
    let config = Config::from_env();
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("signin_url", v_str(&config.signin_url)),
            ("graphql_url", v_str(&config.graphql_url)),
            ("sqlite_path", v_str(&config.sqlite_path)),
        ]),
    );

    let store = SessionStore::open(&config.sqlite_path)?;
    let api = api::build(&config);

    // The event loop is synchronous; network calls run on this runtime
    // via block_on, one at a time.
    let runtime = tokio::runtime::Runtime::new()?;

    let mut app = App::new(store, api, runtime.handle().clone());
    ui::run(&mut app, config.tick_ms)?;

    log(Level::Info, Domain::System, "shutdown", obj(&[]));
    Ok(())
}
