use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use tokio::sync::Semaphore;

use super::{
    context::RenderContext,
    engine::{EngineError, EngineSettings, EngineTemplate, RenderError, ScriptEngine},
};
use crate::config::EngineConfig;

/// Pool of independent script runtime instances.
///
/// The runtime is not safe for concurrent invocation, so access follows a
/// checkout/checkin discipline: a semaphore permit plus an idle stack. The
/// invocation runs on a blocking thread which performs the checkin itself
/// on every completion path — a caller that gives up (client disconnect)
/// merely abandons the result, the instance still comes back clean. A
/// checkout the waiter has flagged as poisoned (timeout) is discarded and
/// replaced with a fresh instance instead of being recycled.
pub struct RenderPool {
    sem: Arc<Semaphore>,
    shared: Arc<Shared>,
    timeout: Duration,
}

struct Shared {
    idle: Mutex<Vec<ScriptEngine>>,
    template: EngineTemplate,
}

impl RenderPool {
    /// Compile the rendering program and warm up `pool_size` instances.
    pub fn new(cfg: &EngineConfig, source: &str, debug: bool) -> Result<Self, EngineError> {
        let settings = EngineSettings {
            max_operations: cfg.max_operations,
            debug,
        };
        let template = EngineTemplate::compile(source, settings)?;
        let idle: Vec<ScriptEngine> = (0..cfg.pool_size).map(|_| template.instance()).collect();

        Ok(Self {
            sem: Arc::new(Semaphore::new(cfg.pool_size)),
            shared: Arc::new(Shared {
                idle: Mutex::new(idle),
                template,
            }),
            timeout: Duration::from_millis(cfg.timeout_ms),
        })
    }

    /// Render one request. Bounded by the configured wall-clock timeout.
    pub async fn render(&self, ctx: RenderContext) -> Result<String, RenderError> {
        let permit = Arc::clone(&self.sem)
            .acquire_owned()
            .await
            .map_err(|_| RenderError::Canceled)?;

        // A permit is held, so an instance is normally idle; after a panic
        // the replacement may not have landed yet, in which case a fresh
        // instance is stamped out instead.
        let mut instance = {
            let mut idle = self.shared.idle.lock().expect("pool lock");
            idle.pop()
        }
        .unwrap_or_else(|| self.shared.template.instance());

        let poisoned = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&poisoned);
        let shared = Arc::clone(&self.shared);

        let handle = tokio::task::spawn_blocking(move || {
            let result = instance.invoke(&ctx);

            {
                let mut idle = shared.idle.lock().expect("pool lock");
                if flag.load(Ordering::Acquire) {
                    // The waiter timed out while this instance was running;
                    // it must not be reused. Check in a replacement.
                    idle.push(shared.template.instance());
                } else {
                    idle.push(instance);
                }
            }
            drop(permit);

            result
        });

        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                tracing::error!("render task panicked: {join_err}");
                Err(RenderError::Canceled)
            }
            Err(_elapsed) => {
                poisoned.store(true, Ordering::Release);
                Err(RenderError::Timeout)
            }
        }
    }
}
