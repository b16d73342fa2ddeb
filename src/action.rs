//! What route tables store: a handler plus its documentation.

use std::fmt;

use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{self, Layer};
use crate::openapi::Operation;

/// A type-erased endpoint and the OpenAPI operation describing it.
///
/// Cloning is cheap; the handler is shared.
#[derive(Clone)]
pub struct Action {
    pub(crate) handler: BoxedHandler,
    pub(crate) operation: Operation,
}

impl Action {
    pub fn new(handler: BoxedHandler, operation: Operation) -> Self {
        Self { handler, operation }
    }

    pub fn handler(&self) -> &BoxedHandler { &self.handler }
    pub fn operation(&self) -> &Operation { &self.operation }

    /// Replaces the operation tags, as a node does for everything it mounts.
    pub(crate) fn tagged(mut self, tags: &[String]) -> Self {
        if !tags.is_empty() {
            self.operation.tags = tags.to_vec();
        }
        self
    }

    pub(crate) fn layered(mut self, layers: &[Layer]) -> Self {
        self.handler = middleware::apply(layers, self.handler);
        self
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("operation", &self.operation).finish_non_exhaustive()
    }
}

/// Anything that can be registered on a route.
///
/// Implemented for plain handlers (`async fn(Request) -> impl IntoResponse`),
/// for [`UseCase`](crate::UseCase) pipelines and for [`Action`] itself.
pub trait IntoAction {
    fn into_action(self) -> Action;
}

impl IntoAction for Action {
    fn into_action(self) -> Action {
        self
    }
}

impl<H: Handler> IntoAction for H {
    fn into_action(self) -> Action {
        Action::new(self.into_boxed_handler(), Operation::default())
    }
}
