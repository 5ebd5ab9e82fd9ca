use std::{
    borrow::Cow,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use mime_guess::Mime;
use rust_embed::RustEmbed;

/// The embedded asset bundle. Everything under `assets/` is baked into the
/// binary at compile time; entries are unique per path and read-only for
/// the life of the process.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/assets/"]
pub(crate) struct Assets;

pub struct ResolvedAsset {
    pub data: Cow<'static, [u8]>,
    pub mime: Mime,
    pub last_modified: Option<SystemTime>,
}

/// Look up a request path in the bundle.
///
/// Path input is attacker-controlled: empty paths, traversal segments and
/// backslashes resolve to `None` (render fallback) rather than an error.
pub fn resolve(path: &str) -> Option<ResolvedAsset> {
    let path = path.trim_start_matches('/');
    if path.is_empty() || path.contains('\\') {
        return None;
    }
    if path.split('/').any(|segment| segment == "..") {
        return None;
    }

    let file = Assets::get(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let last_modified = file
        .metadata
        .last_modified()
        .map(|secs| UNIX_EPOCH + Duration::from_secs(secs));

    Some(ResolvedAsset {
        data: file.data,
        mime,
        last_modified,
    })
}

/// Startup probe: an empty bundle means the build shipped without assets.
pub fn is_empty() -> bool {
    Assets::iter().next().is_none()
}

/// Raw bundle lookup without content-type metadata. Used to load the
/// rendering entry point at startup.
pub(crate) fn raw(path: &str) -> Option<Cow<'static, [u8]>> {
    Assets::get(path.trim_start_matches('/')).map(|file| file.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_path_resolves_with_type() {
        let asset = resolve("/static/css/app.css").expect("bundled asset");
        assert_eq!(asset.mime.as_ref(), "text/css");
        assert!(!asset.data.is_empty());
    }

    #[test]
    fn leading_slash_is_stripped() {
        assert!(resolve("static/js/app.js").is_some());
        assert!(resolve("/static/js/app.js").is_some());
    }

    #[test]
    fn unknown_path_misses() {
        assert!(resolve("/static/nope.css").is_none());
        assert!(resolve("/about").is_none());
    }

    #[test]
    fn malformed_paths_miss_instead_of_crashing() {
        assert!(resolve("").is_none());
        assert!(resolve("/").is_none());
        assert!(resolve("/../conf.toml").is_none());
        assert!(resolve("/static/../../etc/passwd").is_none());
        assert!(resolve("static\\css\\app.css").is_none());
    }

    #[test]
    fn bundle_is_not_empty() {
        assert!(!is_empty());
    }

    #[test]
    fn render_entry_point_is_bundled() {
        assert!(raw("render/app.rhai").is_some());
    }
}
