use std::sync::Arc;

use uuid::Uuid;

use crate::{
    app::AppState,
    handler::{DynHandler, HandlerOutput},
    request::Request,
    response::Response,
};

/// Per-request context.
///
/// The request identifier and the shared application state are attached
/// here, before any handler runs, so every handler in the chain (including
/// the JSON API routes) can read them without globals. The context is owned
/// by its request's chain and dropped once the response is written.
pub struct Ctx {
    pub id: Uuid,
    pub state: Arc<AppState>,
    pub req: Request,
    pub res: Response,
    pub(crate) handlers: Arc<[DynHandler]>,
    pub(crate) index_handler: usize,
}

impl Ctx {
    pub(crate) fn new(
        state: Arc<AppState>,
        req: Request,
        res: Response,
        handlers: Arc<[DynHandler]>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            state,
            req,
            res,
            handlers,
            index_handler: 0,
        }
    }

    #[inline]
    pub fn handlers(&self) -> &[DynHandler] {
        &self.handlers
    }

    #[inline]
    pub fn current_handler_index(&self) -> usize {
        self.index_handler
    }

    /// Run the next handler in the chain, if any.
    pub async fn next(&mut self) -> HandlerOutput {
        if let Some(handler) = self.handlers.get(self.index_handler) {
            let handler = handler.clone();
            self.index_handler += 1;
            handler.call(self).await
        } else {
            Ok(())
        }
    }
}
