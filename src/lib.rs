//! # usecase
//!
//! Typed use-case pipelines served over HTTP, with OpenAPI documentation on
//! a second port.
//!
//! ## The pieces
//!
//! - [`UseCase`]: a business function `Fn(C, I, &mut O)` behind an ordered
//!   chain of typed middleware. The request is decoded into `I`, every stage
//!   mutates the same `O`, and `O` is written back as JSON.
//! - [`Node`]: a route group under a mount prefix, with its own layers and
//!   OpenAPI tags.
//! - [`Api`]: top-level routes plus nodes, global HTTP layers, and two
//!   listeners (API traffic, documentation).
//!
//! Routing is a radix tree per method via [`matchit`]; the listeners are
//! hyper connections on tokio and drain in-flight requests on SIGTERM /
//! Ctrl-C.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::Method;
//! use serde::{Deserialize, Serialize};
//! use utoipa::ToSchema;
//! use usecase::{Api, Error, Node, RequestContext, UseCase};
//!
//! #[derive(Deserialize, ToSchema)]
//! struct Walk { place: String, times: u32 }
//!
//! #[derive(Default, Serialize, ToSchema)]
//! struct Walked { walked: bool, times: u32 }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let walk = UseCase::new(|_: RequestContext, i: Walk, o: &mut Walked| {
//!         o.walked = !i.place.is_empty();
//!         o.times = i.times;
//!         Ok(())
//!     })
//!     .decorate(|op| {
//!         op.set_title("Walk the dog").set_tags(["dog"]);
//!     });
//!
//!     let dog = Node::builder("/dog")
//!         .route("/walk/{place}/{times}", Method::GET, walk)
//!         .build();
//!
//!     // API on :8001, Swagger UI on :3000/swagger
//!     Api::new(8001, 3000).node(dog).listen().await
//! }
//! ```

mod action;
mod api;
mod config;
mod decode;
mod error;
mod node;
mod pipeline;
mod request;
mod response;
mod router;
mod server;
mod service;

pub mod docs;
pub mod handler;
pub mod health;
pub mod log;
pub mod middleware;
pub mod openapi;

pub use action::{Action, IntoAction};
pub use api::{Api, App};
pub use config::Config;
pub use error::{Error, Result};
pub use handler::{BoxedHandler, Handler};
pub use node::{Node, NodeBuilder, Route, Tree};
pub use pipeline::{Middleware, RequestContext, UseCase, UseCaseFn};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::{Server, shutdown_signal};
pub use service::Service;
