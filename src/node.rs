//! Route groups.
//!
//! A [`Node`] is a mount prefix with its own route table, layers and
//! OpenAPI tags. The prefix alone is never an endpoint: a node rooted at
//! `/dog` answers `/dog/walk/...` but `/dog` itself is a `404`.
//!
//! ```rust
//! use http::Method;
//! use usecase::{Node, Request, Service};
//!
//! async fn feed(_req: Request) -> &'static str { "happy" }
//!
//! let dog = Node::builder("/dog")
//!     .tags(["dog", "canine"])
//!     .route("/feed", Method::POST, feed)
//!     .build();
//!
//! let mut service = Service::default();
//! dog.mount(&mut service).unwrap();
//! assert_eq!(service.collector().len(), 1);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write as _};

use http::Method;
use tracing::debug;

use crate::action::{Action, IntoAction};
use crate::error::Error;
use crate::middleware::Layer;
use crate::service::Service;

// ── Route ─────────────────────────────────────────────────────────────────────

/// A path pattern, optionally with `{named}` parameters. Must start with `/`
/// to be mounted.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Route(String);

impl Route {
    pub fn as_str(&self) -> &str { &self.0 }

    pub fn is_valid(&self) -> bool {
        self.0.starts_with('/')
    }
}

impl From<&str> for Route {
    fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for Route {
    fn from(s: String) -> Self { Self(s) }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// route → verb → action
pub type Tree = BTreeMap<Route, HashMap<Method, Action>>;

/// Verbs of one route in a stable order.
pub(crate) fn sorted(verbs: &HashMap<Method, Action>) -> Vec<(&Method, &Action)> {
    let mut verbs: Vec<_> = verbs.iter().collect();
    verbs.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
    verbs
}

// ── Node ──────────────────────────────────────────────────────────────────────

/// A named group of routes sharing a mount prefix, tags and layers.
#[derive(Clone, Default)]
pub struct Node {
    root: String,
    tags: Vec<String>,
    layers: Vec<Layer>,
    default_options: Option<Action>,
    tree: Tree,
}

impl Node {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into(), ..Self::default() }
    }

    pub fn builder(root: impl Into<String>) -> NodeBuilder {
        NodeBuilder { node: Self::new(root) }
    }

    pub fn root(&self) -> &str { &self.root }
    pub fn tags(&self) -> &[String] { &self.tags }
    pub fn layers(&self) -> &[Layer] { &self.layers }
    pub fn tree(&self) -> &Tree { &self.tree }

    /// Appends layers applied to every handler of this node.
    pub fn use_layers(&mut self, layers: impl IntoIterator<Item = Layer>) {
        self.layers.extend(layers);
    }

    /// Adds (or replaces) the handler for `method` on `route`.
    pub fn insert(&mut self, route: impl Into<Route>, method: Method, action: impl IntoAction) {
        self.tree
            .entry(route.into())
            .or_default()
            .insert(method, action.into_action());
    }

    /// Sets the OPTIONS handler used by routes that do not register their own.
    pub fn set_default_options(&mut self, action: impl IntoAction) {
        self.default_options = Some(action.into_action());
    }

    /// Human-readable listing of the node for diagnostics:
    ///
    /// ```text
    /// /dog
    /// 	POST	/feed
    /// 	GET	/walk/{place}/{times}
    /// ```
    pub fn routes(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.root);
        for (route, verbs) in &self.tree {
            for (method, _) in sorted(verbs) {
                let _ = writeln!(out, "\t{method}\t{route}");
            }
        }
        out
    }

    /// Fails on the first route that does not start with `/`.
    pub fn validate(&self) -> Result<(), Error> {
        match self.tree.keys().find(|route| !route.is_valid()) {
            Some(route) => Err(Error::InvalidRoute(route.to_string())),
            None => Ok(()),
        }
    }

    /// Registers every route of the node on `service` under the node's root.
    ///
    /// Validation runs first, so a malformed route means nothing from this
    /// node is registered. Past that point there is no rollback: if the
    /// router rejects a path, the routes registered before it stay.
    ///
    /// The node's default OPTIONS handler is only used for routes without an
    /// explicit OPTIONS handler.
    pub fn mount(&self, service: &mut Service) -> Result<(), Error> {
        self.validate()?;

        for (route, verbs) in &self.tree {
            let path = self.path_of(route);
            for (method, action) in sorted(verbs) {
                self.register(service, method.clone(), &path, action.clone())?;
            }
            if let Some(default) = &self.default_options {
                if !verbs.contains_key(&Method::OPTIONS) {
                    self.register(service, Method::OPTIONS, &path, default.clone())?;
                }
            }
        }

        debug!(root = %self.root, routes = self.tree.len(), "node mounted");
        Ok(())
    }

    fn register(&self, service: &mut Service, method: Method, path: &str, action: Action) -> Result<(), Error> {
        let action = action.layered(&self.layers).tagged(&self.tags);
        service.register(method, path, action)
    }

    fn path_of(&self, route: &Route) -> String {
        format!("{}{}", self.root.trim_end_matches('/'), route)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("root", &self.root)
            .field("tags", &self.tags)
            .field("layers", &self.layers.len())
            .field("default_options", &self.default_options.is_some())
            .field("tree", &self.tree)
            .finish()
    }
}

// ── NodeBuilder ───────────────────────────────────────────────────────────────

/// Chained construction of a [`Node`].
#[derive(Debug)]
pub struct NodeBuilder {
    node: Node,
}

impl NodeBuilder {
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.node.tags.push(tag.into());
        self
    }

    pub fn tags<T: Into<String>>(mut self, tags: impl IntoIterator<Item = T>) -> Self {
        self.node.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn route(mut self, route: impl Into<Route>, method: Method, action: impl IntoAction) -> Self {
        self.node.insert(route, method, action);
        self
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.node.layers.push(layer);
        self
    }

    pub fn default_options(mut self, action: impl IntoAction) -> Self {
        self.node.set_default_options(action);
        self
    }

    pub fn build(self) -> Node {
        self.node
    }
}
