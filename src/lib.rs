pub use http_body_util;
pub use hyper;

pub mod api;
mod app;
pub mod assets;
mod config;
mod ctx;
mod dispatch;
mod error;
mod handler;
pub mod middlewares;
pub mod render;
mod request;
mod response;
mod router;
mod status_error;

pub mod prelude {
    pub use crate::app::{App, AppState};
    pub use crate::config::Config;
    pub use crate::ctx::Ctx;
    pub use crate::dispatch::{Dispatch, Favicon};
    pub use crate::error::Error as PlinthError;
    pub use crate::handler::{Handler, HandlerOutput};
    pub use crate::middlewares::{CatchPanicMiddleware, LoggingMiddleware};
    pub use crate::render::{RenderContext, RenderPool};
    pub use crate::router::Router;
    pub use crate::status_error::StatusError;
    pub use http::StatusCode;
    pub use http::method::Method;
}

pub use crate::app::{App, AppState};
pub use crate::config::{ApiConfig, Config, EngineConfig};
pub use crate::ctx::Ctx;
pub use crate::dispatch::{Dispatch, Favicon};
pub use crate::error::Error;
pub use crate::handler::{DynHandler, Handler, HandlerOutput};
pub use crate::request::Request;
pub use crate::response::{HttpBody, Response};
pub use crate::router::Router;
pub use crate::status_error::StatusError;
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
