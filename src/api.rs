//! Top-level assembly.
//!
//! An [`Api`] collects top-level routes, nodes and global layers, mounts
//! them onto a [`Service`], and listens on two ports: one for API traffic,
//! one for the OpenAPI document and its UI.
//!
//! The lifecycle is explicit: build → [`mount_routes`](Api::mount_routes) →
//! [`into_app`](Api::into_app) or [`listen`](Api::listen) → shutdown.

use std::fmt::Write as _;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use serde_json::Value;
use tracing::{info, warn};
use utoipa::Modify;

use crate::action::IntoAction;
use crate::config::Config;
use crate::docs;
use crate::error::Error;
use crate::handler::{BoxedHandler, boxed};
use crate::health;
use crate::middleware::{self, Layer};
use crate::node::{Node, Route, Tree, sorted};
use crate::openapi::Info;
use crate::request::Request;
use crate::response::Response;
use crate::server::{Server, shutdown_signal};
use crate::service::Service;

/// The top-level service.
///
/// ```rust,no_run
/// use http::Method;
/// use usecase::{Api, Error, IntoAction, Node, RequestContext, UseCase};
///
/// #[derive(serde::Deserialize, utoipa::ToSchema)]
/// struct Feed { bowls: i32 }
///
/// #[derive(Default, serde::Serialize, utoipa::ToSchema)]
/// struct Fed { happy: bool }
///
/// #[tokio::main]
/// async fn main() -> Result<(), Error> {
///     let feed = UseCase::new(|_: RequestContext, i: Feed, o: &mut Fed| {
///         o.happy = i.bowls >= 2;
///         Ok(())
///     });
///
///     Api::new(8001, 3000)
///         .node(Node::builder("/dog").route("/feed", Method::POST, feed).build())
///         .listen()
///         .await
/// }
/// ```
pub struct Api {
    config: Config,
    service: Service,
    layers: Vec<Layer>,
    wraps: Vec<Layer>,
    actions: Tree,
    nodes: Vec<Node>,
}

impl Api {
    /// An API on `api_port` with its documentation on `docs_port`.
    pub fn new(api_port: u16, docs_port: u16) -> Self {
        Self::from_config(Config::new(api_port, docs_port))
    }

    /// Default global layers are request ids, access logging and panic
    /// recovery, in that order; the default wrap is gzip.
    pub fn from_config(config: Config) -> Self {
        Self {
            service: Service::new(config.info.clone()),
            config,
            layers: vec![middleware::request_id(), middleware::trace(), middleware::recover()],
            wraps: vec![middleware::gzip()],
            actions: Tree::new(),
            nodes: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config { &self.config }
    pub fn nodes(&self) -> &[Node] { &self.nodes }

    /// Registers a top-level action.
    pub fn route(mut self, route: impl Into<Route>, method: Method, action: impl IntoAction) -> Self {
        self.actions
            .entry(route.into())
            .or_default()
            .insert(method, action.into_action());
        self
    }

    /// Adds a node; nodes mount in the order they were added.
    pub fn node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Appends a global layer, run after the ones already present.
    pub fn layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Replaces the global layers.
    pub fn layers(mut self, layers: impl IntoIterator<Item = Layer>) -> Self {
        self.layers = layers.into_iter().collect();
        self
    }

    /// Appends a response wrapper. Wrappers sit outside the global layers and
    /// also see requests that match no route.
    pub fn wrap(mut self, layer: Layer) -> Self {
        self.wraps.push(layer);
        self
    }

    /// Replaces the response wrappers.
    pub fn wraps(mut self, layers: impl IntoIterator<Item = Layer>) -> Self {
        self.wraps = layers.into_iter().collect();
        self
    }

    pub fn health_checks(mut self, enabled: bool) -> Self {
        self.config.health_checks = enabled;
        self
    }

    pub fn info(mut self, info: Info) -> Self {
        self.service.collector_mut().set_info(info.clone());
        self.config.info = info;
        self
    }

    /// Adds a hook run over the rendered OpenAPI document, e.g. to declare
    /// security schemes.
    pub fn modify(mut self, modifier: impl Modify + Send + Sync + 'static) -> Self {
        self.service.collector_mut().modify(modifier);
        self
    }

    /// Registers the top-level actions, then mounts every node in order.
    ///
    /// Stops at the first failing node; nodes mounted before it stay mounted.
    pub fn mount_routes(&mut self) -> Result<(), Error> {
        if self.config.health_checks {
            self.service.method(Method::GET, health::LIVENESS_PATH, health::liveness)?;
            self.service.method(Method::GET, health::READINESS_PATH, health::readiness)?;
        }

        for (route, verbs) in &self.actions {
            for (method, action) in sorted(verbs) {
                self.service.register(method.clone(), route.as_str(), action.clone())?;
            }
        }

        for node in &self.nodes {
            node.mount(&mut self.service)?;
        }

        info!(
            routes = self.actions.len(),
            nodes = self.nodes.len(),
            documented = self.service.collector().len(),
            "routes mounted"
        );
        Ok(())
    }

    /// Diagnostic listing of top-level routes and nodes.
    pub fn routes(&self) -> String {
        let mut out = String::from("\n----- Top Level Routes -----\n");
        for (route, verbs) in &self.actions {
            for (method, _) in sorted(verbs) {
                let _ = writeln!(out, "{route}\t{method}");
            }
        }
        out.push_str("\n----- Mounted Nodes -----\n");
        for node in &self.nodes {
            out.push_str(&node.routes());
        }
        out
    }

    /// Freezes whatever has been mounted into a servable [`App`].
    pub fn into_app(self) -> App {
        let (router, collector) = self.service.into_parts();
        let router = Arc::new(router);
        let dispatch = boxed(move |req: Request| {
            let router = Arc::clone(&router);
            async move { router.dispatch(req).await }
        });

        let root = middleware::apply(&self.wraps, middleware::apply(&self.layers, dispatch));
        App {
            inner: Arc::new(AppInner {
                root,
                openapi: collector.document(),
                docs: docs::handler(&self.config.docs_prefix, &collector),
            }),
        }
    }

    /// Mounts everything and serves until SIGTERM or Ctrl-C.
    pub async fn listen(self) -> Result<(), Error> {
        self.listen_with_shutdown(shutdown_signal()).await
    }

    /// Mounts everything, starts the documentation listener in the
    /// background and serves API traffic until `signal` resolves.
    ///
    /// A failing documentation listener is logged and otherwise ignored; it
    /// never takes the API listener down.
    pub async fn listen_with_shutdown(mut self, signal: impl Future<Output = ()>) -> Result<(), Error> {
        self.mount_routes()?;

        let api_addr = self.config.api_addr();
        let docs_addr = self.config.docs_addr();
        let app = self.into_app();

        let docs_task = match app.docs_handler() {
            Ok(handler) => Some(tokio::spawn(async move {
                if let Err(e) = Server::bind(docs_addr).serve_with_shutdown(handler, std::future::pending()).await {
                    warn!(addr = %docs_addr, "documentation listener failed: {e}");
                }
            })),
            Err(e) => {
                warn!("documentation routes unavailable: {e}");
                None
            }
        };

        let result = Server::bind(api_addr).serve_with_shutdown(app.handler(), signal).await;

        if let Some(task) = docs_task {
            task.abort();
        }
        result
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// A mounted API, ready to serve. Cheap to clone.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

struct AppInner {
    root: BoxedHandler,
    openapi: Value,
    docs: Result<BoxedHandler, Error>,
}

impl App {
    /// Runs one request through the wraps, the global layers and the router.
    pub async fn call(&self, req: http::Request<Bytes>) -> Response {
        let (parts, body) = req.into_parts();
        self.inner.root.call(Request::new(parts, body)).await
    }

    /// Runs one request against the documentation routes.
    pub async fn call_docs(&self, req: http::Request<Bytes>) -> Response {
        let (parts, body) = req.into_parts();
        match &self.inner.docs {
            Ok(docs) => docs.call(Request::new(parts, body)).await,
            Err(e) => Response::status(e.status_code()),
        }
    }

    /// The handler served on the API port.
    pub fn handler(&self) -> BoxedHandler {
        BoxedHandler::clone(&self.inner.root)
    }

    /// The handler served on the documentation port.
    pub fn docs_handler(&self) -> Result<BoxedHandler, Error> {
        match &self.inner.docs {
            Ok(docs) => Ok(BoxedHandler::clone(docs)),
            Err(e) => Err(Error::custom(e)),
        }
    }

    /// The OpenAPI document describing every mounted route.
    pub fn openapi(&self) -> &Value {
        &self.inner.openapi
    }
}
