//! Pipeline logger.
//!
//! A [`UseCase`](crate::UseCase) with a logger reports every failing
//! invocation, whether the error came from a middleware or from the business
//! function. Without one, errors are only returned.

use tracing::warn;

/// Sink for pipeline failures.
///
/// Any `Fn(&str)` closure is a logger, which keeps tests short:
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use usecase::log::Logger;
///
/// let seen = Arc::new(Mutex::new(Vec::<String>::new()));
/// let sink = Arc::clone(&seen);
/// let logger = move |msg: &str| sink.lock().unwrap().push(msg.to_owned());
/// logger.log("no more treats");
/// assert_eq!(seen.lock().unwrap().len(), 1);
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, message: &str);
}

impl<F> Logger for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, message: &str) {
        self(message)
    }
}

/// Forwards failures to `tracing` at `warn`, tagged with the use case name.
#[derive(Clone, Debug)]
pub struct TracingLogger {
    name: String,
}

impl TracingLogger {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        warn!(use_case = %self.name, "{message}");
    }
}
