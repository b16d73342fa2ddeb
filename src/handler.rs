//! Handler trait and type erasure.
//!
//! # How typed endpoints are stored
//!
//! A route table holds handlers of *different* types in one
//! radix tree per method: plain `async fn`s, layered handlers, and use-case
//! pipelines with their own `Input`/`Output` types. Everything is erased to
//! the same trait object once, at registration, so no runtime type checks
//! are needed when a request arrives.
//!
//! ```text
//! async fn liveness(req: Request) -> Response { … }   ← user writes this
//!        ↓ Node::builder("/dog").route(…, liveness)
//! liveness.into_boxed_handler()                        ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(liveness))                        ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req)  at request time                   ← one vtable dispatch
//! ```
//!
//! Pipelines take the same path through [`UseCase::into_action`](crate::UseCase).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
#[doc(hidden)]
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Dispatch interface behind [`BoxedHandler`].
///
/// Public so that [layers](crate::middleware::Layer) can call the handler
/// they wrap: `next.call(req).await`.
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// Automatically satisfied for any `async fn` (or closure returning a
/// future) with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// The trait is sealed; pipelines reach the router through
/// [`IntoAction`](crate::IntoAction) instead.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Newtype bridging a concrete handler `F` to [`ErasedHandler`].
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// Erases `handler`. Mostly useful when writing a [`Layer`](crate::middleware::Layer).
pub fn boxed(handler: impl Handler) -> BoxedHandler {
    handler.into_boxed_handler()
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};

    use super::*;

    async fn teapot(_req: Request) -> StatusCode {
        StatusCode::IM_A_TEAPOT
    }

    #[tokio::test]
    async fn erased_fn_is_callable() {
        let h = boxed(teapot);
        let res = h.call(Request::fake(Method::GET, "/", "")).await;
        assert_eq!(res.status_code(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn closures_are_handlers() {
        let greeting = String::from("woof");
        let h = boxed(move |_req: Request| {
            let greeting = greeting.clone();
            async move { greeting }
        });
        let res = h.call(Request::fake(Method::GET, "/", "")).await;
        assert_eq!(res.body(), b"woof");
    }
}
