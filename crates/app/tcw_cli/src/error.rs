use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("IO::{:?}: {}", .0, .0)]
    Io(#[from] std::io::Error),

    #[error("Json::{:?}: {}", .0, .0)]
    Json(#[from] serde_json::Error),

    #[error("LogFilter::{:?}: {}", .0, .0)]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),

    #[error("{}", tcw_core::auth::user_message(.0))]
    Auth(#[from] tcw_core::auth::AuthError),
}
