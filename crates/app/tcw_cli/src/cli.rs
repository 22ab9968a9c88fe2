use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tcw", version, about = "TCW session client")]
pub struct Cli {
    /// Session file. Defaults to `<data dir>/tcw/session.json`.
    #[arg(long, env = "TCW_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Base URL serving `/connect/token` and `/api/user/current`.
    /// Overrides the configured endpoints.
    #[arg(long, env = "TCW_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and persist the session
    Login {
        #[arg(short, long, env = "TCW_USERNAME")]
        username: String,

        #[arg(short, long, env = "TCW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show whether a valid session is stored
    Status,
    /// Print the signed-in user
    Whoami,
    /// List the menu items visible to the signed-in user
    Menu,
    /// Re-fetch the profile with the stored token
    Refresh,
    /// Clear the stored session
    Logout,
    /// Print version information
    Version,
}
