//! Use-case pipelines.
//!
//! A [`UseCase`] is a typed business function behind an ordered chain of
//! typed middleware:
//!
//! ```text
//! request ─decode→ I ─┬→ m1(ctx₀, &I, &mut O) → ctx₁
//!                     ├→ m2(ctx₁, &I, &mut O) → ctx₂
//!                     ├→ …
//!                     └→ business(ctxₙ, I, &mut O) ─encode→ 200 + JSON(O)
//! ```
//!
//! Every stage shares the same output value and mutates it in place; that is
//! the only way a stage contributes to the response. The first stage to fail
//! stops the chain: later middleware and the business function never run,
//! the error is handed to the logger (if any) and returned to the router,
//! which turns it into the HTTP response.
//!
//! The context `C` is an explicit accumulator. Each middleware receives the
//! value its predecessor returned, so what one stage hands the next is
//! visible in the types rather than hidden in keyed storage. The default,
//! [`RequestContext`], carries the request's method, path, parameters and id.
//!
//! ```rust
//! use usecase::{Error, UseCase};
//!
//! #[derive(Default)]
//! struct Out { seen: u32 }
//!
//! let count = |n: u32, _: &(), _: &mut Out| -> Result<u32, Error> { Ok(n + 1) };
//! let pipeline = UseCase::new(|n: u32, _: (), out: &mut Out| {
//!         out.seen = n;
//!         Ok(())
//!     })
//!     .with(count)
//!     .with(count);
//!
//! let mut out = Out::default();
//! pipeline.interact(0, (), &mut out).unwrap();
//! assert_eq!(out.seen, 2);
//! ```
//!
//! The output is always reached through `&mut O`, so a stage that wants to
//! take it by value does not type-check:
//!
//! ```rust,compile_fail
//! use usecase::{Error, UseCase};
//!
//! let by_value = |_: (), _: (), out: String| -> Result<(), Error> { drop(out); Ok(()) };
//! let _ = UseCase::<(), String, ()>::new(by_value);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use utoipa::ToSchema;

use crate::action::{Action, IntoAction};
use crate::decode::decode;
use crate::error::Error;
use crate::handler::boxed;
use crate::log::Logger;
use crate::openapi::{Body, Operation};
use crate::request::Request;
use crate::response::Response;

/// The terminal business function of a pipeline.
pub type UseCaseFn<I, O, C> = Arc<dyn Fn(C, I, &mut O) -> Result<(), Error> + Send + Sync>;

/// A pipeline stage. Returns the context handed to the next stage.
pub type Middleware<I, O, C> = Arc<dyn Fn(C, &I, &mut O) -> Result<C, Error> + Send + Sync>;

// ── RequestContext ────────────────────────────────────────────────────────────

/// What a pipeline knows about the request beyond its decoded input.
///
/// Pipelines with their own context type build it from this one through
/// `From<RequestContext>`.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub params: HashMap<String, String>,
    pub request_id: Option<String>,
}

impl From<&Request> for RequestContext {
    fn from(req: &Request) -> Self {
        Self {
            method: req.method().clone(),
            path: req.path().to_owned(),
            params: req.params().clone(),
            request_id: req.request_id().map(str::to_owned),
        }
    }
}

/// For pipelines that need no context at all.
impl From<RequestContext> for () {
    fn from(_: RequestContext) -> Self {}
}

// ── UseCase ───────────────────────────────────────────────────────────────────

/// A typed request-handling unit: input → middleware chain → business
/// function → mutated output.
///
/// Built once at startup and moved into a route table through
/// [`IntoAction`]. Middleware added before that point takes effect for every
/// request the pipeline serves.
pub struct UseCase<I, O, C = RequestContext> {
    operation: Operation,
    business: UseCaseFn<I, O, C>,
    middleware: Vec<Middleware<I, O, C>>,
    logger: Option<Arc<dyn Logger>>,
}

impl<I, O, C> UseCase<I, O, C>
where
    I: 'static,
    O: 'static,
    C: 'static,
{
    pub fn new<F>(business: F) -> Self
    where
        F: Fn(C, I, &mut O) -> Result<(), Error> + Send + Sync + 'static,
    {
        Self {
            operation: Operation::default(),
            business: Arc::new(business),
            middleware: Vec::new(),
            logger: None,
        }
    }

    /// Applies `decorator` to the pipeline's documentation.
    pub fn decorate(mut self, decorator: impl FnOnce(&mut Operation)) -> Self {
        decorator(&mut self.operation);
        self
    }

    /// Reports failing invocations to `logger`.
    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Appends one middleware.
    pub fn with<M>(mut self, middleware: M) -> Self
    where
        M: Fn(C, &I, &mut O) -> Result<C, Error> + Send + Sync + 'static,
    {
        self.use_middleware(middleware);
        self
    }

    /// Appends already-shared middleware, in order.
    pub fn middleware(mut self, middleware: impl IntoIterator<Item = Middleware<I, O, C>>) -> Self {
        self.middleware.extend(middleware);
        self
    }

    /// Appends one middleware in place.
    pub fn use_middleware<M>(&mut self, middleware: M)
    where
        M: Fn(C, &I, &mut O) -> Result<C, Error> + Send + Sync + 'static,
    {
        self.middleware.push(Arc::new(middleware));
    }

    pub fn operation(&self) -> &Operation { &self.operation }

    /// Number of middleware stages ahead of the business function.
    pub fn stages(&self) -> usize { self.middleware.len() }

    /// Runs the chain once.
    ///
    /// Middleware run in registration order, each with the original input,
    /// the shared output and the context returned by its predecessor. The
    /// business function runs last, exactly once, unless a stage failed.
    pub fn interact(&self, ctx: C, input: I, output: &mut O) -> Result<(), Error> {
        let result = self.run(ctx, input, output);
        if let (Err(err), Some(logger)) = (&result, &self.logger) {
            logger.log(&err.to_string());
        }
        result
    }

    fn run(&self, mut ctx: C, input: I, output: &mut O) -> Result<(), Error> {
        for stage in &self.middleware {
            ctx = stage(ctx, &input, output)?;
        }
        (self.business)(ctx, input, output)
    }
}

impl<I, O, C> UseCase<I, O, C>
where
    I: DeserializeOwned + 'static,
    O: Serialize + Default + 'static,
    C: From<RequestContext> + 'static,
{
    /// Decodes, runs and encodes one request.
    fn handle(&self, req: &Request) -> Result<Response, Error> {
        let input: I = decode(req)?;
        let ctx = C::from(RequestContext::from(req));
        let mut output = O::default();
        self.interact(ctx, input, &mut output)?;
        Response::to_json(&output)
    }
}

impl<I, O, C> IntoAction for UseCase<I, O, C>
where
    I: DeserializeOwned + ToSchema + 'static,
    O: Serialize + ToSchema + Default + 'static,
    C: From<RequestContext> + 'static,
{
    fn into_action(self) -> Action {
        let mut operation = self.operation.clone();
        operation.input.get_or_insert_with(Body::of::<I>);
        operation.output.get_or_insert_with(Body::of::<O>);

        let pipeline = Arc::new(self);
        let handler = boxed(move |req: Request| {
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.handle(&req) }
        });
        Action::new(handler, operation)
    }
}

impl<I, O, C> Clone for UseCase<I, O, C> {
    fn clone(&self) -> Self {
        Self {
            operation: self.operation.clone(),
            business: Arc::clone(&self.business),
            middleware: self.middleware.clone(),
            logger: self.logger.clone(),
        }
    }
}

impl<I, O, C> fmt::Debug for UseCase<I, O, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UseCase")
            .field("operation", &self.operation)
            .field("stages", &self.middleware.len())
            .field("logged", &self.logger.is_some())
            .finish()
    }
}
