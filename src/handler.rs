use std::sync::Arc;

use async_trait::async_trait;

use crate::{ctx::Ctx, status_error::StatusError};

pub type HandlerOutput = Result<(), StatusError>;

pub type DynHandler = Arc<dyn Handler>;

/// A unit in a request's handler chain. Middlewares call `c.next().await`
/// to run the rest of the chain; terminal handlers just write the response.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, c: &mut Ctx) -> HandlerOutput;
}
