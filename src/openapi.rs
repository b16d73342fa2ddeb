//! OpenAPI document generation.
//!
//! Every registration on a [`Service`](crate::Service) records its
//! [`Operation`] here and the [`Collector`] renders the lot as a `utoipa`
//! document for the docs listener. Pipeline inputs and outputs carry their
//! [`ToSchema`] schemas, which land in `components.schemas` and are
//! referenced from request and response bodies.
//!
//! Anything the collector does not derive (security schemes, servers, extra
//! tags) is added through a [`Modify`] hook:
//!
//! ```rust
//! use utoipa::Modify;
//! use utoipa::openapi::OpenApi;
//! use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme};
//! use usecase::openapi::Collector;
//!
//! struct BearerAuth;
//!
//! impl Modify for BearerAuth {
//!     fn modify(&self, openapi: &mut OpenApi) {
//!         let components = openapi.components.get_or_insert_with(Default::default);
//!         components.add_security_scheme(
//!             "bearerAuth",
//!             SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
//!         );
//!         openapi.security = Some(vec![SecurityRequirement::new("bearerAuth", Vec::<String>::new())]);
//!     }
//! }
//!
//! let mut collector = Collector::default();
//! collector.modify(BearerAuth);
//! let doc = collector.document();
//! assert_eq!(doc["components"]["securitySchemes"]["bearerAuth"]["bearerFormat"], "JWT");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use utoipa::openapi::content::{Content, ContentBuilder};
use utoipa::openapi::info::InfoBuilder;
use utoipa::openapi::path::{HttpMethod, OperationBuilder, ParameterBuilder, ParameterIn, Paths};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::response::ResponseBuilder;
use utoipa::openapi::schema::{Components, Ref, Schema};
use utoipa::openapi::{Deprecated, OpenApi, OpenApiBuilder, RefOr, Required};
use utoipa::{Modify, PartialSchema, ToSchema};

// ── Body ──────────────────────────────────────────────────────────────────────

/// The schema of a request or response body, captured from a [`ToSchema`]
/// type together with the schemas it refers to.
#[derive(Clone, Debug)]
pub struct Body {
    name: String,
    schema: RefOr<Schema>,
    dependencies: Vec<(String, RefOr<Schema>)>,
}

impl Body {
    pub fn of<T: ToSchema>() -> Self {
        let mut dependencies = Vec::new();
        T::schemas(&mut dependencies);
        Self { name: T::name().into_owned(), schema: T::schema(), dependencies }
    }

    /// Component name the body is registered under.
    pub fn name(&self) -> &str { &self.name }
}

// ── Operation ─────────────────────────────────────────────────────────────────

/// Documentation metadata for one endpoint.
///
/// Pipelines receive a mutable reference through
/// [`UseCase::decorate`](crate::UseCase::decorate):
///
/// ```rust
/// use usecase::openapi::Operation;
///
/// let mut op = Operation::default();
/// op.set_title("WalkDog").set_description("Walk the dog").set_tags(["dog"]);
/// assert_eq!(op.summary.as_deref(), Some("WalkDog"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Operation {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub operation_id: Option<String>,
    pub deprecated: bool,
    /// Request body, documented for POST, PUT and PATCH.
    pub input: Option<Body>,
    pub output: Option<Body>,
}

impl Operation {
    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.summary = Some(title.into());
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn set_tags<T: Into<String>>(&mut self, tags: impl IntoIterator<Item = T>) -> &mut Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.operation_id = Some(id.into());
        self
    }

    pub fn set_deprecated(&mut self, deprecated: bool) -> &mut Self {
        self.deprecated = deprecated;
        self
    }
}

// ── Info ──────────────────────────────────────────────────────────────────────

/// The `info` block of the document.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for Info {
    fn default() -> Self {
        Self { title: "API".to_owned(), version: "0.1.0".to_owned(), description: None }
    }
}

// ── Collector ─────────────────────────────────────────────────────────────────

/// Accumulates operations as routes are mounted.
#[derive(Default)]
pub struct Collector {
    info: Info,
    paths: Paths,
    schemas: BTreeMap<String, RefOr<Schema>>,
    operations: usize,
    modifiers: Vec<Arc<dyn Modify + Send + Sync>>,
}

impl Collector {
    pub fn new(info: Info) -> Self {
        Self { info, ..Self::default() }
    }

    pub fn info(&self) -> &Info { &self.info }
    pub fn set_info(&mut self, info: Info) { self.info = info; }

    /// Registers a hook run on every rendered document, in registration order.
    pub fn modify(&mut self, modifier: impl Modify + Send + Sync + 'static) {
        self.modifiers.push(Arc::new(modifier));
    }

    /// Number of documented method + path pairs.
    pub fn len(&self) -> usize {
        self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations == 0
    }

    pub fn add(&mut self, method: &Method, path: &str, op: &Operation) {
        let Some(verb) = http_method(method) else {
            debug!(%method, path, "method has no OpenAPI counterpart, left undocumented");
            return;
        };

        let params: Vec<_> = path_params(path)
            .map(|name| {
                ParameterBuilder::new()
                    .name(name)
                    .parameter_in(ParameterIn::Path)
                    .required(Required::True)
                    .schema(Some(String::schema()))
                    .build()
            })
            .collect();

        let mut builder = OperationBuilder::new()
            .summary(op.summary.clone())
            .description(op.description.clone())
            .operation_id(op.operation_id.clone())
            .tags((!op.tags.is_empty()).then(|| op.tags.clone()))
            .deprecated(op.deprecated.then_some(Deprecated::True))
            .parameters((!params.is_empty()).then_some(params));

        if let Some(input) = op.input.as_ref().filter(|_| has_body(method)) {
            let body = RequestBodyBuilder::new()
                .content("application/json", self.json(input))
                .required(Some(Required::True))
                .build();
            builder = builder.request_body(Some(body));
        }

        let ok = match &op.output {
            Some(output) => ResponseBuilder::new().description("OK").content("application/json", self.json(output)),
            None => ResponseBuilder::new().description("OK"),
        };
        builder = builder
            .response("200", ok.build())
            .response("default", ResponseBuilder::new().description(r#"Failure, as {"error": "<message>"}"#).build());

        self.paths.add_path_operation(path, vec![verb], builder.build());
        self.operations += 1;
    }

    /// Records `body`'s schemas as components and returns JSON content
    /// referring to it.
    fn json(&mut self, body: &Body) -> Content {
        for (name, schema) in &body.dependencies {
            self.schemas.entry(name.clone()).or_insert_with(|| schema.clone());
        }
        self.schemas.entry(body.name.clone()).or_insert_with(|| body.schema.clone());

        let reference: RefOr<Schema> = RefOr::Ref(Ref::from_schema_name(body.name.clone()));
        ContentBuilder::new().schema(Some(reference)).build()
    }

    /// Builds the document, then runs the [`Modify`] hooks over it.
    pub fn openapi(&self) -> OpenApi {
        let info = InfoBuilder::new()
            .title(self.info.title.clone())
            .version(self.info.version.clone())
            .description(self.info.description.clone())
            .build();

        let components = (!self.schemas.is_empty()).then(|| {
            let mut components = Components::default();
            components.schemas = self.schemas.clone();
            components
        });

        let mut doc = OpenApiBuilder::new()
            .info(info)
            .paths(self.paths.clone())
            .components(components)
            .build();
        for modifier in &self.modifiers {
            modifier.modify(&mut doc);
        }
        doc
    }

    /// The rendered document as JSON.
    pub fn document(&self) -> Value {
        serde_json::to_value(self.openapi()).unwrap_or_default()
    }
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("info", &self.info)
            .field("operations", &self.operations)
            .field("schemas", &self.schemas.keys().collect::<Vec<_>>())
            .field("modifiers", &self.modifiers.len())
            .finish()
    }
}

fn http_method(method: &Method) -> Option<HttpMethod> {
    let verb = match *method {
        Method::GET => HttpMethod::Get,
        Method::POST => HttpMethod::Post,
        Method::PUT => HttpMethod::Put,
        Method::DELETE => HttpMethod::Delete,
        Method::OPTIONS => HttpMethod::Options,
        Method::HEAD => HttpMethod::Head,
        Method::PATCH => HttpMethod::Patch,
        Method::TRACE => HttpMethod::Trace,
        _ => return None,
    };
    Some(verb)
}

fn has_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Names of the `{param}` / `{*param}` segments of a route.
fn path_params(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter_map(|segment| {
        segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .map(|s| s.trim_start_matches('*'))
    })
}
