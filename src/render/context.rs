use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::{config::Config, request::Request};

/// Immutable per-request input to the rendering entry point.
///
/// Serialized into the script runtime's native value representation, so the
/// rendering logic can vary behavior (verbose errors, commit stamping)
/// without reaching into global state.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext {
    /// The request identifier, generated once per request.
    pub id: Uuid,
    pub path: String,
    pub query: HashMap<String, String>,
    pub debug: bool,
    pub commit_hash: String,
}

impl RenderContext {
    pub fn build(id: Uuid, req: &Request, config: &Config) -> Self {
        // Malformed query strings are attacker-controlled input; render with
        // an empty map rather than failing the request.
        let query = req
            .query::<HashMap<String, String>>()
            .unwrap_or_default();

        Self {
            id,
            path: req.uri().path().to_string(),
            query,
            debug: config.debug,
            commit_hash: config.commit_hash.clone(),
        }
    }
}
