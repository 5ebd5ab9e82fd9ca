//! Server-side rendering: the embedded script engine, the per-request
//! render context, and the instance pool that serializes access to the
//! runtime.

mod context;
mod engine;
mod pool;

pub use context::RenderContext;
pub use engine::{EngineError, RenderError};
pub use pool::RenderPool;

/// Load the rendering entry point source: the asset bundle first, the
/// filesystem second.
pub fn load_entry_point(path: &str) -> Result<String, EngineError> {
    if let Some(data) = crate::assets::raw(path) {
        return String::from_utf8(data.into_owned()).map_err(|_| EngineError::SourceNotUtf8 {
            path: path.to_string(),
        });
    }

    match std::fs::read_to_string(path) {
        Ok(source) => Ok(source),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(EngineError::SourceNotFound {
                path: path.to_string(),
            })
        }
        Err(e) => Err(EngineError::SourceRead {
            path: path.to_string(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_entry_point_loads() {
        let source = load_entry_point("render/app.rhai").unwrap();
        assert!(source.contains("fn render"));
    }

    #[test]
    fn missing_entry_point_is_init_error() {
        let err = load_entry_point("render/nope.rhai").unwrap_err();
        assert!(matches!(err, EngineError::SourceNotFound { .. }));
    }
}
