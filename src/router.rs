use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use http::Method;

use crate::{
    error::Error,
    handler::{DynHandler, Handler},
};

pub type Handlers = HashMap<Method, Arc<[DynHandler]>>;

enum RouterItem {
    Middleware(DynHandler),
    Route(Method, String, DynHandler),
    Child(Router),
}

/// Route table builder: groups, middlewares and method routes, flattened
/// into a matchit router at listen time. Registration order matters — a
/// middleware only applies to routes (and child groups) added after it.
#[derive(Default)]
pub struct Router {
    path: String,
    items: Vec<RouterItem>,
    fallback: Option<DynHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sub-router mounted at `path`.
    pub fn group(path: impl Into<String>) -> Self {
        let path = path.into();
        if path != "/" && (!path.starts_with('/') || path.ends_with('/')) {
            panic!("Path must start with / and not end with / - got {path}");
        }
        Self {
            path,
            items: Vec::new(),
            fallback: None,
        }
    }

    pub fn push(mut self, router: Router) -> Self {
        self.items.push(RouterItem::Child(router));
        self
    }

    pub fn middleware(mut self, handler: impl Handler + 'static) -> Self {
        self.items.push(RouterItem::Middleware(Arc::new(handler)));
        self
    }

    pub fn add(
        mut self,
        method: Method,
        path: impl Into<String>,
        handler: impl Handler + 'static,
    ) -> Self {
        self.items
            .push(RouterItem::Route(method, path.into(), Arc::new(handler)));
        self
    }

    pub fn get(self, path: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.add(Method::GET, path, handler)
    }

    pub fn post(self, path: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.add(Method::POST, path, handler)
    }

    pub fn put(self, path: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.add(Method::PUT, path, handler)
    }

    pub fn delete(self, path: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.add(Method::DELETE, path, handler)
    }

    /// Handler chain run when no registered route matches, for any method.
    /// Root-level middlewares apply to it; only the root fallback is used.
    pub fn fallback(mut self, handler: impl Handler + 'static) -> Self {
        self.fallback = Some(Arc::new(handler));
        self
    }

    pub(crate) fn build(&self) -> Result<BuiltRouter, Error> {
        let mut flat: BTreeMap<String, Handlers> = BTreeMap::new();
        Self::walk("", self, &[], &mut flat);

        let mut match_router = matchit::Router::new();
        for (path, handlers) in flat {
            match_router.insert(path, handlers)?;
        }

        let fallback = self.fallback.as_ref().map(|handler| {
            let mut chain: Vec<DynHandler> = self
                .items
                .iter()
                .filter_map(|item| match item {
                    RouterItem::Middleware(m) => Some(m.clone()),
                    _ => None,
                })
                .collect();
            chain.push(handler.clone());
            Arc::from(chain.into_boxed_slice())
        });

        Ok(BuiltRouter {
            match_router,
            fallback,
        })
    }

    fn walk(
        base: &str,
        router: &Router,
        inherited_mw: &[DynHandler],
        out: &mut BTreeMap<String, Handlers>,
    ) {
        let prefix = join_paths(base, &router.path);
        let mut inherited = inherited_mw.to_vec();

        for item in &router.items {
            match item {
                RouterItem::Middleware(m) => inherited.push(m.clone()),
                RouterItem::Route(method, path, handler) => {
                    let full_path = join_paths(&prefix, path);
                    let mut chain = inherited.clone();
                    chain.push(handler.clone());

                    let entry = out.entry(full_path.clone()).or_default();
                    if entry.contains_key(method) {
                        panic!("Handler for method {method} already exists at path {full_path}");
                    }
                    entry.insert(method.clone(), Arc::from(chain.into_boxed_slice()));
                }
                RouterItem::Child(child) => {
                    Self::walk(&prefix, child, &inherited, out);
                }
            }
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut flat = BTreeMap::new();
        Self::walk("", self, &[], &mut flat);
        let routes: Vec<String> = flat
            .iter()
            .flat_map(|(path, handlers)| {
                handlers
                    .keys()
                    .map(move |method| format!("{method} {path}"))
            })
            .collect();
        f.debug_struct("Router").field("routes", &routes).finish()
    }
}

pub(crate) struct BuiltRouter {
    match_router: matchit::Router<Handlers>,
    fallback: Option<Arc<[DynHandler]>>,
}

pub(crate) enum RouteMatch {
    Chain(Arc<[DynHandler]>),
    MethodNotAllowed,
    NotFound,
}

impl BuiltRouter {
    /// Select the handler chain for a request. HEAD requests fall through
    /// to the GET chain; unmatched paths go to the fallback chain when one
    /// is registered.
    pub(crate) fn at(&self, path: &str, method: &Method) -> RouteMatch {
        match self.match_router.at(path) {
            Ok(matched) => {
                let handlers = matched.value;
                let chain = handlers.get(method).or_else(|| {
                    (*method == Method::HEAD)
                        .then(|| handlers.get(&Method::GET))
                        .flatten()
                });
                match chain {
                    Some(chain) => RouteMatch::Chain(chain.clone()),
                    None => RouteMatch::MethodNotAllowed,
                }
            }
            Err(_) => match &self.fallback {
                Some(chain) => RouteMatch::Chain(chain.clone()),
                None => RouteMatch::NotFound,
            },
        }
    }
}

fn join_paths(parent: &str, child: &str) -> String {
    match (parent, child) {
        ("", "") => "/".to_string(),
        ("", c) => c.to_string(),
        (p, "") => p.to_string(),
        (p, "/") => p.to_string(),
        ("/", c) => c.to_string(),
        (p, c) => format!("{p}{c}"),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{ctx::Ctx, handler::HandlerOutput};

    struct Noop;

    #[async_trait]
    impl Handler for Noop {
        async fn call(&self, _: &mut Ctx) -> HandlerOutput {
            Ok(())
        }
    }

    #[test]
    fn routes_win_over_fallback() {
        let router = Router::new()
            .get("/favicon.ico", Noop)
            .push(Router::group("/api").get("/ping", Noop))
            .fallback(Noop);
        let built = router.build().unwrap();

        assert!(matches!(
            built.at("/favicon.ico", &Method::GET),
            RouteMatch::Chain(_)
        ));
        assert!(matches!(
            built.at("/api/ping", &Method::GET),
            RouteMatch::Chain(_)
        ));
    }

    #[test]
    fn unmatched_paths_use_fallback() {
        let built = Router::new().fallback(Noop).build().unwrap();
        for path in ["/", "/about", "/deep/nested/route"] {
            assert!(matches!(built.at(path, &Method::GET), RouteMatch::Chain(_)));
        }
    }

    #[test]
    fn no_fallback_means_not_found() {
        let built = Router::new().get("/x", Noop).build().unwrap();
        assert!(matches!(
            built.at("/missing", &Method::GET),
            RouteMatch::NotFound
        ));
    }

    #[test]
    fn wrong_method_is_rejected() {
        let built = Router::new().get("/x", Noop).build().unwrap();
        assert!(matches!(
            built.at("/x", &Method::POST),
            RouteMatch::MethodNotAllowed
        ));
    }

    #[test]
    fn head_falls_through_to_get() {
        let built = Router::new().get("/x", Noop).build().unwrap();
        assert!(matches!(
            built.at("/x", &Method::HEAD),
            RouteMatch::Chain(_)
        ));
    }

    #[test]
    fn middleware_applies_to_routes_after_it() {
        let router = Router::new()
            .get("/before", Noop)
            .middleware(Noop)
            .get("/after", Noop);
        let built = router.build().unwrap();

        let chain_len = |m: RouteMatch| match m {
            RouteMatch::Chain(c) => c.len(),
            _ => panic!("expected a chain"),
        };
        assert_eq!(chain_len(built.at("/before", &Method::GET)), 1);
        assert_eq!(chain_len(built.at("/after", &Method::GET)), 2);
    }

    #[test]
    fn fallback_chain_includes_root_middlewares() {
        let router = Router::new().middleware(Noop).fallback(Noop);
        let built = router.build().unwrap();
        match built.at("/anything", &Method::GET) {
            RouteMatch::Chain(chain) => assert_eq!(chain.len(), 2),
            _ => panic!("expected the fallback chain"),
        }
    }
}
