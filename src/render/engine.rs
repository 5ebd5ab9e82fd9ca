use rhai::{AST, Engine, Scope};

use super::context::RenderContext;

/// The function every rendering script must define.
const ENTRY_POINT: &str = "render";

/// Failed to bring the rendering runtime up. Fatal: the process must not
/// start serving traffic without a working engine.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("rendering entry point not found: {path}")]
    SourceNotFound { path: String },

    #[error("rendering entry point is not valid UTF-8: {path}")]
    SourceNotUtf8 { path: String },

    #[error("failed to read rendering entry point {path}: {source}")]
    SourceRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile rendering script: {0}")]
    Compile(String),

    #[error("rendering script does not define a `{ENTRY_POINT}` function")]
    MissingEntryPoint,
}

/// A rendering call failed. Recoverable: the dispatcher converts this into
/// a 500-class response and the process keeps serving.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("render call failed: {0}")]
    Script(String),

    #[error("render call returned no output")]
    NoOutput,

    #[error("render call timed out")]
    Timeout,

    #[error("render call was aborted")]
    Canceled,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct EngineSettings {
    /// Script operation cap, 0 = unlimited. Bounds runaway scripts so an
    /// abandoned invocation terminates instead of pinning a thread.
    pub max_operations: u64,
    pub debug: bool,
}

/// Compiled rendering program plus the settings needed to stamp out
/// runtime instances. Compilation happens once at startup; instances are
/// cheap afterwards.
#[derive(Clone, Debug)]
pub(crate) struct EngineTemplate {
    ast: AST,
    settings: EngineSettings,
}

impl EngineTemplate {
    pub(crate) fn compile(source: &str, settings: EngineSettings) -> Result<Self, EngineError> {
        let engine = build_engine(settings);
        let ast = engine
            .compile(source)
            .map_err(|e| EngineError::Compile(e.to_string()))?;

        if !ast.iter_functions().any(|f| f.name == ENTRY_POINT) {
            return Err(EngineError::MissingEntryPoint);
        }

        Ok(Self { ast, settings })
    }

    /// A fresh runtime instance. Infallible: the program is already
    /// compiled, so pool replacements can never fail mid-flight.
    pub(crate) fn instance(&self) -> ScriptEngine {
        ScriptEngine {
            engine: build_engine(self.settings),
            ast: self.ast.clone(),
        }
    }
}

/// One embedded script runtime instance. Not safe for concurrent
/// invocation; exclusive access is enforced by the pool's checkout
/// discipline (`&mut self` here keeps the contract visible).
pub(crate) struct ScriptEngine {
    engine: Engine,
    ast: AST,
}

impl ScriptEngine {
    /// Run the rendering entry point against a request context and return
    /// the produced markup.
    pub(crate) fn invoke(&mut self, ctx: &RenderContext) -> Result<String, RenderError> {
        let value = rhai::serde::to_dynamic(ctx).map_err(|e| RenderError::Script(e.to_string()))?;

        let mut scope = Scope::new();
        let html: String = self
            .engine
            .call_fn(&mut scope, &self.ast, ENTRY_POINT, (value,))
            .map_err(|e| RenderError::Script(e.to_string()))?;

        if html.is_empty() {
            return Err(RenderError::NoOutput);
        }
        Ok(html)
    }
}

fn build_engine(settings: EngineSettings) -> Engine {
    let mut engine = Engine::new();
    if settings.max_operations > 0 {
        engine.set_max_operations(settings.max_operations);
    }
    engine.on_print(|text| tracing::info!(target: "plinth::engine", "{text}"));
    if settings.debug {
        engine.on_debug(|text, source, pos| {
            tracing::debug!(target: "plinth::engine", ?source, %pos, "{text}");
        });
    }
    engine
}
