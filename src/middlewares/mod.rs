mod catch_panic;
mod logging;

pub use catch_panic::CatchPanicMiddleware;
pub use logging::LoggingMiddleware;
