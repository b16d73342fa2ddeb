//! The documentation listener's routes.
//!
//! `GET {prefix}/openapi.json` returns the document rendered by the
//! [`Collector`]. Everything else under `{prefix}/` is Swagger UI, served
//! from the assets bundled by `utoipa-swagger-ui` and pointed at that
//! document. `GET {prefix}` redirects to `{prefix}/` so the UI's relative
//! asset paths resolve.

use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use tracing::warn;
use utoipa_swagger_ui::Config;

use crate::error::Error;
use crate::handler::{BoxedHandler, boxed};
use crate::openapi::Collector;
use crate::request::Request;
use crate::response::Response;

const SCHEMA_FILE: &str = "/openapi.json";

/// Builds the handler served on the docs port.
pub fn handler(prefix: &str, collector: &Collector) -> Result<BoxedHandler, Error> {
    let prefix: Arc<str> = Arc::from(prefix.trim_end_matches('/'));
    let schema = serde_json::to_vec(&collector.openapi())
        .map(Bytes::from)
        .map_err(|e| Error::Encode(e.to_string()))?;
    let config = Arc::new(Config::new([format!("{prefix}{SCHEMA_FILE}")]));

    Ok(boxed(move |req: Request| {
        let response = serve(&prefix, &schema, &config, &req);
        async move { response }
    }))
}

fn serve(prefix: &str, schema: &Bytes, config: &Arc<Config<'static>>, req: &Request) -> Response {
    if *req.method() != Method::GET {
        return Response::status(StatusCode::NOT_FOUND);
    }
    let Some(tail) = req.path().strip_prefix(prefix) else {
        return Response::status(StatusCode::NOT_FOUND);
    };

    if tail.is_empty() {
        return Response::builder()
            .status(StatusCode::MOVED_PERMANENTLY)
            .header("location", &format!("{prefix}/"))
            .no_body();
    }
    if tail == SCHEMA_FILE {
        return Response::json(schema.clone());
    }
    let Some(file) = tail.strip_prefix('/') else {
        return Response::status(StatusCode::NOT_FOUND);
    };

    match utoipa_swagger_ui::serve(file, Arc::clone(config)) {
        Ok(Some(file)) => Response::builder()
            .header("content-type", &file.content_type)
            .body(file.bytes.into_owned()),
        Ok(None) => Response::status(StatusCode::NOT_FOUND),
        Err(e) => {
            warn!(path = %req.path(), "swagger ui asset failed: {e}");
            Response::status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::{Info, Operation};

    fn collector() -> Collector {
        let mut c = Collector::new(Info { title: "Dogs".into(), ..Info::default() });
        c.add(&Method::POST, "/cat", &Operation::default());
        c
    }

    #[tokio::test]
    async fn serves_schema_and_ui() {
        let docs = handler("/swagger/", &collector()).unwrap();

        let res = docs.call(Request::fake(Method::GET, "/swagger/openapi.json", "")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        let doc: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert!(doc["paths"]["/cat"]["post"].is_object());
        assert_eq!(doc["info"]["title"], "Dogs");

        let res = docs.call(Request::fake(Method::GET, "/swagger/", "")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert!(res.headers()["content-type"].to_str().unwrap().starts_with("text/html"));

        let res = docs.call(Request::fake(Method::GET, "/swagger/swagger-initializer.js", "")).await;
        assert!(std::str::from_utf8(res.body()).unwrap().contains("/swagger/openapi.json"));

        let res = docs.call(Request::fake(Method::GET, "/swagger", "")).await;
        assert_eq!(res.status_code(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.headers()["location"], "/swagger/");
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let docs = handler("/swagger", &collector()).unwrap();
        for path in ["/cat", "/swaggerish", "/swagger/no-such-asset.js"] {
            let res = docs.call(Request::fake(Method::GET, path, "")).await;
            assert_eq!(res.status_code(), StatusCode::NOT_FOUND, "{path}");
        }
        let res = docs.call(Request::fake(Method::POST, "/swagger/openapi.json", "")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn root_prefix() {
        let docs = handler("/", &collector()).unwrap();
        let res = docs.call(Request::fake(Method::GET, "/openapi.json", "")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        let res = docs.call(Request::fake(Method::GET, "/", "")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
    }
}
