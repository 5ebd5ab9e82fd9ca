use serde::Deserialize;

use crate::error::Error;

/// Baked-in default configuration document. Compiled into the binary so the
/// server runs with no external files; see `conf.toml` for the keys.
pub const DEFAULTS: &str = include_str!("../conf.toml");

const ENV_PREFIX: &str = "PLINTH";

/// Process-wide configuration snapshot.
///
/// Loaded once at startup by merging the baked-in document with environment
/// overrides, then shared read-only for the life of the process — there is
/// no writer after initialization, so reads need no lock.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Enables verbose error bodies and engine debug output.
    pub debug: bool,

    /// Build identifier surfaced to rendering for diagnostics.
    pub commit_hash: String,

    pub host: String,
    pub port: u16,

    /// Max request body size in bytes.
    pub body_limit: usize,

    /// How long to wait for in-flight connections on shutdown.
    pub shutdown_timeout_secs: u64,

    pub api: ApiConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Mount point of the JSON API group.
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bundle or filesystem path of the rendering entry point.
    pub path: String,

    /// Number of independent script engine instances.
    pub pool_size: usize,

    /// Wall-clock limit for a single render call.
    pub timeout_ms: u64,

    /// Script operation cap, 0 = unlimited.
    pub max_operations: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            commit_hash: "dev".to_string(),
            host: "0.0.0.0".to_string(),
            port: 5000,
            body_limit: 4 * 1024 * 1024,
            shutdown_timeout_secs: 10,
            api: ApiConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: "/api".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: "render/app.rhai".to_string(),
            pool_size: 4,
            timeout_ms: 2000,
            max_operations: 5_000_000,
        }
    }
}

impl Config {
    /// Load the snapshot: baked-in defaults overridden by `PLINTH_*`
    /// environment variables (`__` separates sections, e.g.
    /// `PLINTH_ENGINE__POOL_SIZE=8`).
    pub fn load() -> Result<Self, Error> {
        Self::parse(DEFAULTS, true)
    }

    /// Parse a configuration document layered over the baked-in defaults,
    /// without consulting the environment. Used by tests.
    pub fn from_str(doc: &str) -> Result<Self, Error> {
        Self::parse(doc, false)
    }

    fn parse(doc: &str, with_env: bool) -> Result<Self, Error> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULTS, config::FileFormat::Toml));

        if doc != DEFAULTS {
            builder = builder.add_source(config::File::from_str(doc, config::FileFormat::Toml));
        }

        if with_env {
            builder = builder.add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.engine.pool_size == 0 {
            return Err(Error::ConfigInvalid(
                "engine.pool_size must be at least 1".into(),
            ));
        }
        if self.engine.timeout_ms == 0 {
            return Err(Error::ConfigInvalid(
                "engine.timeout_ms must be positive".into(),
            ));
        }
        if self.engine.path.is_empty() {
            return Err(Error::ConfigInvalid("engine.path must be set".into()));
        }
        if !self.api.prefix.starts_with('/')
            || self.api.prefix.ends_with('/')
            || self.api.prefix.len() < 2
        {
            return Err(Error::ConfigInvalid(
                "api.prefix must be a non-root absolute path without a trailing slash".into(),
            ));
        }
        Ok(())
    }
}
