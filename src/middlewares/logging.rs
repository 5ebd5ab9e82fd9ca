use async_trait::async_trait;

use crate::{
    ctx::Ctx,
    handler::{Handler, HandlerOutput},
};

pub struct LoggingMiddleware {
    _p: (),
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self { _p: () }
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

struct FormattedDuration(std::time::Duration);

impl std::fmt::Display for FormattedDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let nanos = self.0.as_nanos() as u64;
        if nanos >= 1_000_000_000 {
            let ms = nanos / 1_000_000;
            write!(f, "{}.{:03}s", ms / 1000, ms % 1000)
        } else if nanos >= 1_000_000 {
            let us = nanos / 1_000;
            write!(f, "{}.{:03}ms", us / 1000, us % 1000)
        } else {
            write!(f, "{}.{:03}µs", nanos / 1000, nanos % 1000)
        }
    }
}

#[async_trait]
impl Handler for LoggingMiddleware {
    async fn call(&self, c: &mut Ctx) -> HandlerOutput {
        let time = std::time::Instant::now();

        let result = c.next().await;

        // A StatusError is written into the response after the chain
        // unwinds; log the status it will produce, not the stale one.
        let status = match &result {
            Ok(()) => c.res.status_code(),
            Err(e) => e.code,
        };

        tracing::info!(
            "{} | {:^10} | {} | {:^7} | {} | {}",
            status.as_u16(),
            FormattedDuration(time.elapsed()),
            c.req.ip(),
            c.req.method().as_str(),
            c.req.uri().path(),
            c.id,
        );

        result
    }
}
