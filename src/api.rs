//! JSON API route registration. The endpoints here are deliberately thin;
//! the group exists so application routes can hang off `api.prefix` without
//! touching the dispatcher's fallback path.

use async_trait::async_trait;
use serde_json::json;

use crate::{
    ctx::Ctx,
    handler::{Handler, HandlerOutput},
    router::Router,
};

/// Build the API group mounted at `prefix`.
pub fn routes(prefix: &str) -> Router {
    Router::group(prefix).get("/ping", Ping).get("/conf", Conf)
}

struct Ping;

#[async_trait]
impl Handler for Ping {
    async fn call(&self, c: &mut Ctx) -> HandlerOutput {
        c.res.json(&json!({ "result": "pong" }));
        Ok(())
    }
}

/// Echoes the request-scoped identifier and build metadata; demonstrates
/// that per-request data reaches API handlers without globals.
struct Conf;

#[async_trait]
impl Handler for Conf {
    async fn call(&self, c: &mut Ctx) -> HandlerOutput {
        let body = json!({
            "requestId": c.id.to_string(),
            "debug": c.state.config.debug,
            "commit": c.state.config.commit_hash.clone(),
        });
        c.res.json(&body);
        Ok(())
    }
}
