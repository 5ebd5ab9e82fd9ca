use async_trait::async_trait;
use http::{StatusCode, header};

use crate::{
    assets,
    ctx::Ctx,
    handler::{Handler, HandlerOutput},
    render::RenderContext,
};

/// Opaque body for render failures outside debug mode.
const ERROR_PAGE: &str = "<!doctype html><html><head><title>Something went wrong</title></head>\
<body><h1>Something went wrong</h1><p>Please try again later.</p></body></html>";

/// The fallback orchestrator: every request no registered route claims
/// lands here. Two-branch decision per request — serve an embedded asset,
/// or build a render context and invoke the engine. An asset match never
/// falls through to rendering.
pub struct Dispatch;

#[async_trait]
impl Handler for Dispatch {
    async fn call(&self, c: &mut Ctx) -> HandlerOutput {
        if let Some(asset) = assets::resolve(c.req.uri().path()) {
            c.res.status(StatusCode::OK);
            c.res.set(header::CONTENT_TYPE, asset.mime.as_ref())?;
            if let Some(modified) = asset.last_modified {
                c.res
                    .set(header::LAST_MODIFIED, httpdate::fmt_http_date(modified))?;
            }
            c.res.send(asset.data.into_owned());
            return Ok(());
        }

        let state = c.state.clone();
        let render_ctx = RenderContext::build(c.id, &c.req, &state.config);
        match state.renderer.render(render_ctx).await {
            Ok(html) => {
                c.res.html(html);
            }
            Err(e) => {
                tracing::error!(id = %c.id, path = %c.req.uri().path(), error = %e, "rendering failed");
                c.res.status(StatusCode::INTERNAL_SERVER_ERROR);
                if state.config.debug {
                    c.res.send(format!("rendering failed: {e}\nrequest: {}", c.id));
                } else {
                    c.res.content_type("text/html; charset=utf-8")?;
                    c.res.send(ERROR_PAGE);
                }
            }
        }
        Ok(())
    }
}

/// `/favicon.ico` is an alias into the bundle, kept for clients that probe
/// the root path.
pub struct Favicon;

#[async_trait]
impl Handler for Favicon {
    async fn call(&self, c: &mut Ctx) -> HandlerOutput {
        c.res
            .redirect(StatusCode::MOVED_PERMANENTLY, "/static/images/favicon.ico")?;
        Ok(())
    }
}
