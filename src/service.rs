//! The live registration target: router plus OpenAPI collector.

use http::Method;

use crate::action::{Action, IntoAction};
use crate::error::Error;
use crate::openapi::{Collector, Info};
use crate::router::Router;

/// Where routes end up when they are mounted.
///
/// Every registration lands in both the [`Router`] (so requests reach it)
/// and the [`Collector`] (so the docs listener describes it).
#[derive(Default)]
pub struct Service {
    router: Router,
    collector: Collector,
}

impl Service {
    pub fn new(info: Info) -> Self {
        Self { router: Router::new(), collector: Collector::new(info) }
    }

    /// Registers `action` for `method` on the fully-qualified `path`.
    pub fn method(&mut self, method: Method, path: &str, action: impl IntoAction) -> Result<(), Error> {
        self.register(method, path, action.into_action())
    }

    pub(crate) fn register(&mut self, method: Method, path: &str, action: Action) -> Result<(), Error> {
        self.router.insert(method.clone(), path, action.handler)?;
        self.collector.add(&method, path, &action.operation);
        Ok(())
    }

    pub fn router(&self) -> &Router { &self.router }
    pub fn collector(&self) -> &Collector { &self.collector }
    pub fn collector_mut(&mut self) -> &mut Collector { &mut self.collector }

    pub(crate) fn into_parts(self) -> (Router, Collector) {
        (self.router, self.collector)
    }
}
