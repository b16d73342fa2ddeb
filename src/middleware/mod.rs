//! HTTP-level middleware.
//!
//! A [`Layer`] takes the handler it guards and returns a new one, the same
//! shape chi and tower use. Layers see the raw [`Request`](crate::Request)
//! and [`Response`](crate::Response); pipeline-level middleware, which sees
//! typed input and output, lives in [`pipeline`](crate::pipeline).
//!
//! Built-in layers:
//! - [`request_id`] — tags every request with an id and echoes it back
//! - [`trace`] — one access-log event per request with method, path, status, latency
//! - [`recover`] — turns a panicking handler into `500 Internal Server Error`
//! - [`gzip`] — compresses response bodies for clients that accept it
//!
//! ```rust
//! use std::sync::Arc;
//! use usecase::middleware::{self, Layer};
//! use usecase::{Request, handler};
//!
//! let deny_all: Layer = middleware::layer_fn(|_next| {
//!     handler::boxed(|_req: Request| async { http::StatusCode::FORBIDDEN })
//! });
//! # let _ = deny_all;
//! ```

use std::sync::Arc;

use crate::handler::BoxedHandler;

mod gzip;
mod recover;
mod request_id;
mod trace;

pub use gzip::gzip;
pub use recover::recover;
pub use request_id::{X_REQUEST_ID, request_id};
pub use trace::trace;

/// Wraps a handler with cross-cutting behaviour.
pub type Layer = Arc<dyn Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static>;

/// Turns a closure into a [`Layer`].
pub fn layer_fn<F>(f: F) -> Layer
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps `handler` so that `layers[0]` runs first and the handler last.
pub(crate) fn apply(layers: &[Layer], handler: BoxedHandler) -> BoxedHandler {
    layers.iter().rev().fold(handler, |next, layer| layer(next))
}
