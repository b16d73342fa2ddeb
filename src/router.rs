//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. Nodes and top-level
//! routes both end up here as fully-prefixed paths; there is no nesting at
//! request time.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use percent_encoding::percent_decode_str;

use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// The routing table behind a [`Service`](crate::Service).
///
/// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a method + path pair.
    ///
    /// Fails when the path is malformed or collides with an existing
    /// registration for the same method, which includes mounting the same
    /// node twice.
    pub fn insert(&mut self, method: Method, path: &str, handler: BoxedHandler) -> Result<(), Error> {
        self.routes
            .entry(method.clone())
            .or_default()
            .insert(path, handler)
            .map_err(|e| Error::Route { method, path: path.to_owned(), reason: e.to_string() })
    }

    /// Finds the handler for `method` + `path` and its percent-decoded
    /// parameters. A parameter that does not decode to UTF-8 is a
    /// [`Error::Decode`].
    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<Result<(BoxedHandler, HashMap<String, String>), Error>> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| {
                percent_decode_str(v)
                    .decode_utf8()
                    .map(|v| (k.to_owned(), v.into_owned()))
                    .map_err(|e| Error::Decode(format!("path parameter `{k}`: {e}")))
            })
            .collect::<Result<HashMap<_, _>, _>>();
        Some(params.map(|params| (handler, params)))
    }

    /// Routes `req` to its handler, or answers `404 Not Found`.
    pub async fn dispatch(&self, mut req: Request) -> Response {
        match self.lookup(&req.method, &req.path) {
            Some(Ok((handler, params))) => {
                req.params = params;
                handler.call(req).await
            }
            Some(Err(e)) => e.into_response(),
            None => Response::status(StatusCode::NOT_FOUND),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::boxed;

    async fn walk(req: Request) -> String {
        format!("{}:{}", req.param("place").unwrap_or("?"), req.param("times").unwrap_or("?"))
    }

    #[tokio::test]
    async fn resolves_named_params() {
        let mut router = Router::new();
        router.insert(Method::GET, "/dog/walk/{place}/{times}", boxed(walk)).unwrap();

        let res = router.dispatch(Request::fake(Method::GET, "/dog/walk/atlanta/4", "")).await;
        assert_eq!(res.body(), b"atlanta:4");
    }

    #[tokio::test]
    async fn params_are_percent_decoded() {
        let mut router = Router::new();
        router.insert(Method::GET, "/dog/walk/{place}/{times}", boxed(walk)).unwrap();

        let res = router.dispatch(Request::fake(Method::GET, "/dog/walk/new%20york/4", "")).await;
        assert_eq!(res.body(), b"new york:4");

        let res = router.dispatch(Request::fake(Method::GET, "/dog/walk/caf%C3%A9/4", "")).await;
        assert_eq!(res.body(), "café:4".as_bytes());
    }

    #[tokio::test]
    async fn undecodable_param_is_bad_request() {
        let mut router = Router::new();
        router.insert(Method::GET, "/dog/walk/{place}/{times}", boxed(walk)).unwrap();

        let res = router.dispatch(Request::fake(Method::GET, "/dog/walk/%FF/4", "")).await;
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_path_or_method_is_not_found() {
        let mut router = Router::new();
        router.insert(Method::GET, "/dog/feed", boxed(walk)).unwrap();

        let res = router.dispatch(Request::fake(Method::GET, "/cat", "")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        let res = router.dispatch(Request::fake(Method::POST, "/dog/feed", "")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mut router = Router::new();
        router.insert(Method::GET, "/dog", boxed(walk)).unwrap();
        let err = router.insert(Method::GET, "/dog", boxed(walk)).unwrap_err();
        assert!(matches!(err, Error::Route { .. }));
    }
}
