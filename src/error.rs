use std::{convert::Infallible, io};

use crate::render::EngineError;

/// Startup-fatal errors. Anything that surfaces here before the listener is
/// up aborts the process with a non-zero exit.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("config: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("asset bundle is empty")]
    EmptyAssetBundle,

    #[error("render engine: {0}")]
    Engine(#[from] EngineError),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("http: {0}")]
    Http(#[from] http::Error),

    #[error("matchit: {0}")]
    MatchitInsert(#[from] matchit::InsertError),

    #[error("failed to parse address")]
    FailedToParseAddr,

    #[error("invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("serde_json: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl From<Infallible> for Error {
    fn from(_: Infallible) -> Self {
        panic!("Infallible can never be constructed")
    }
}
