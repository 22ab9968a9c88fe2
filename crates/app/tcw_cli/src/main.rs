// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands};
use tcw_core::auth::client::AuthClient;
use tcw_core::config::AuthConfig;
use tcw_core::session::SessionController;
use tcw_core::storage::{FileStore, SessionStore};
use tracing::debug;

mod cli;
mod commands;
mod logging;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    if let Err(e) = run().await {
        debug!(error = ?e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    logging::init()?;

    let args = Cli::parse();

    if let Commands::Version = args.command {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        println!("tcw_core {}", tcw_core::version());
        return Ok(());
    }

    let controller = controller(&args)?;
    controller.start();

    let result = match args.command {
        Commands::Login { username, password } => {
            commands::login(&controller, username, password, args.json).await
        }
        Commands::Status => commands::status(&controller, args.json),
        Commands::Whoami => commands::whoami(&controller, args.json),
        Commands::Menu => commands::menu(&controller, args.json),
        Commands::Refresh => commands::refresh(&controller, args.json).await,
        Commands::Logout => commands::logout(&controller),
        Commands::Version => Ok(()),
    };

    controller.shutdown();
    result
}

/// Wire config, file-backed storage and the auth client into a controller.
fn controller(args: &Cli) -> Result<SessionController> {
    let mut config = AuthConfig::from_env();
    if let Some(base) = &args.base_url {
        config = config.with_base_url(base);
    }

    let file = match &args.store {
        Some(path) => FileStore::new(path),
        None => FileStore::default_location(),
    };
    debug!(path = %file.path().display(), token_endpoint = %config.token_endpoint, "session store");

    let store = SessionStore::new(Arc::new(file), &config.storage_namespace);
    let client = AuthClient::new(config, store)?;
    Ok(SessionController::new(Arc::new(client)))
}
