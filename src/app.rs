use std::{net, sync::Arc, time::Duration};

use http::{Method, StatusCode};
use hyper::{Request as HyperRequest, body::Incoming as IncomingBody};
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    ctx::Ctx,
    error::Error,
    render::RenderPool,
    request::Request,
    response::{HttpBody, HttpResponse, Response},
    router::{BuiltRouter, RouteMatch, Router},
};

/// Process-wide shared state, built once at startup and passed explicitly
/// into every request's context. Read-only after construction.
pub struct AppState {
    pub config: Config,
    pub renderer: RenderPool,
}

pub struct App {
    state: Arc<AppState>,
    router: Router,
}

impl App {
    pub fn new(state: AppState) -> Self {
        App {
            state: Arc::new(state),
            router: Router::new(),
        }
    }

    /// Sets the router for the application.
    ///
    /// Changes to the router after the server has started will not take
    /// effect.
    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Listen on the configured address with ctrl+c shutdown.
    pub async fn listen(self) -> Result<(), Error> {
        let token = CancellationToken::new();
        let t = token.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C signal handler");
            t.cancel();
        });

        let addr = {
            use std::net::ToSocketAddrs;
            let config = &self.state.config;
            (config.host.as_str(), config.port)
                .to_socket_addrs()?
                .next()
                .ok_or(Error::FailedToParseAddr)?
        };
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, token).await
    }

    /// Serve on a pre-bound listener until `shutdown` is cancelled, then
    /// drain in-flight connections within the configured timeout.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), Error> {
        let shared = Arc::new(Shared {
            router: self.router.build()?,
            state: self.state,
        });
        let shutdown_timeout = Duration::from_secs(shared.state.config.shutdown_timeout_secs);

        tracing::info!(
            "Http app listening on http://{}",
            listener.local_addr()?
        );

        let server = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new());
        let graceful = hyper_util::server::graceful::GracefulShutdown::new();

        let _ = shutdown
            .run_until_cancelled(async {
                loop {
                    let Ok((stream, peer_addr)) = listener.accept().await else {
                        continue;
                    };
                    let io = TokioIo::new(stream);
                    let shared = shared.clone();
                    let service = hyper::service::service_fn(move |req| {
                        handle_request(req, shared.clone(), peer_addr)
                    });

                    let conn = server.serve_connection(io, service);
                    let fut = graceful.watch(conn.into_owned());
                    tokio::spawn(async move {
                        if let Err(e) = fut.await {
                            tracing::trace!("connection failed: {e:?}");
                        }
                    });
                }
            })
            .await;

        tracing::info!("Shutdown signal received!");
        tracing::info!(
            "Waiting for connections to close (timeout: {:?})...",
            shutdown_timeout
        );

        match tokio::time::timeout(shutdown_timeout, graceful.shutdown()).await {
            Ok(()) => tracing::info!("All connections closed!"),
            Err(_) => tracing::info!("Shutdown timed out!"),
        }

        Ok(())
    }
}

struct Shared {
    state: Arc<AppState>,
    router: BuiltRouter,
}

async fn handle_request(
    request: HyperRequest<IncomingBody>,
    shared: Arc<Shared>,
    peer_addr: net::SocketAddr,
) -> Result<HttpResponse, std::convert::Infallible> {
    let path = normalize_path(request.uri().path());

    let chain = match shared.router.at(&path, request.method()) {
        RouteMatch::Chain(chain) => chain,
        RouteMatch::MethodNotAllowed => {
            tracing::debug!("requested method not allowed: {} {}", request.method(), path);
            let mut response = HttpResponse::new(HttpBody::default());
            *response.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
            return Ok(response);
        }
        RouteMatch::NotFound => {
            tracing::debug!("requested path not found: {path}");
            let mut response = HttpResponse::new(HttpBody::default());
            *response.status_mut() = StatusCode::NOT_FOUND;
            return Ok(response);
        }
    };

    let body_limit = shared.state.config.body_limit;
    let req = Request::new(request, peer_addr, body_limit);
    let res = Response::new();

    let mut c = Ctx::new(shared.state.clone(), req, res, chain);
    if let Err(e) = c.next().await {
        c.res.status(e.code);
        if e.brief.is_empty() {
            c.res.send_status(e.code);
        } else {
            c.res.send(e.brief);
        }
    }

    if c.req.method() == Method::HEAD {
        *c.res.inner.body_mut() = HttpBody::default();
    }

    Ok(c.res.inner)
}

fn normalize_path(s: &str) -> std::borrow::Cow<'_, str> {
    let mut result = None;

    for (i, ch) in s.char_indices() {
        if ch == '\\' {
            let mut owned = result.take().unwrap_or_else(|| {
                let mut buf = String::with_capacity(s.len());
                buf.push_str(&s[..i]);
                buf
            });
            owned.push('/');
            result = Some(owned);
        } else if let Some(ref mut owned) = result {
            owned.push(ch);
        }
    }

    match result {
        None => {
            if s.len() > 1 && s.ends_with('/') {
                std::borrow::Cow::Borrowed(&s[..s.len() - 1])
            } else {
                std::borrow::Cow::Borrowed(s)
            }
        }

        Some(mut owned) => {
            if owned.len() > 1 && owned.ends_with('/') {
                owned.pop();
            }
            std::borrow::Cow::Owned(owned)
        }
    }
}
