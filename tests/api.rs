use std::io::Read;

use bytes::Bytes;
use flate2::read::GzDecoder;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use usecase::middleware::X_REQUEST_ID;
use usecase::{Api, App, Error, Node, RequestContext, UseCase};
use utoipa::Modify;
use utoipa::ToSchema;
use utoipa::openapi::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme};

#[derive(Deserialize, ToSchema)]
struct ConcatenateRequest {
    input: String,
}

#[derive(Default, Serialize, ToSchema)]
#[serde(transparent)]
struct Concatenated(String);

#[derive(Deserialize, ToSchema)]
struct WalkRequest {
    place: String,
    times: u32,
}

#[derive(Default, Serialize, ToSchema)]
struct WalkResponse {
    walked: bool,
    times: u32,
}

#[derive(Deserialize, ToSchema)]
struct FeedRequest {
    bowls: u32,
}

#[derive(Default, Serialize, ToSchema)]
struct FeedResponse {
    happy: bool,
}

/// Context counting the stages it passed through.
struct Hops(u32);

impl From<RequestContext> for Hops {
    fn from(_: RequestContext) -> Self {
        Hops(0)
    }
}

/// Input of endpoints that read nothing from the request.
#[derive(Deserialize, ToSchema)]
struct Nothing {}

#[derive(Default, Serialize, ToSchema)]
struct Counted {
    counter: u32,
}

fn hop(ctx: Hops, _: &Nothing, _: &mut Counted) -> Result<Hops, Error> {
    Ok(Hops(ctx.0 + 1))
}

fn app() -> App {
    let cat = UseCase::new(|_: RequestContext, i: ConcatenateRequest, o: &mut Concatenated| {
        o.0 = format!("{}{}", i.input, o.0);
        Ok(())
    })
    .with(|ctx: RequestContext, _: &ConcatenateRequest, o: &mut Concatenated| {
        o.0.push_str("suffix");
        Ok(ctx)
    });

    let walk = UseCase::new(|_: RequestContext, i: WalkRequest, o: &mut WalkResponse| {
        o.walked = !i.place.is_empty();
        o.times = i.times;
        Ok(())
    });

    let feed = UseCase::new(|_: RequestContext, i: FeedRequest, o: &mut FeedResponse| {
        o.happy = i.bowls >= 2;
        Ok(())
    });

    let count = UseCase::new(|ctx: Hops, _: Nothing, o: &mut Counted| {
        o.counter = ctx.0;
        Ok(())
    })
    .with(hop)
    .with(hop)
    .with(hop)
    .with(hop);

    let reject = UseCase::new(|_: RequestContext, _: Nothing, _: &mut Counted| {
        Err(Error::status(StatusCode::CONFLICT, "already walked"))
    });

    let dog = Node::builder("/dog")
        .tags(["dog"])
        .route("/walk/{place}/{times}", Method::GET, walk)
        .route("/feed", Method::POST, feed)
        .route("/count", Method::GET, count)
        .route("/again", Method::POST, reject)
        .build();

    let mut api = Api::new(0, 0).route("/cat", Method::POST, cat).node(dog);
    api.mount_routes().unwrap();
    api.into_app()
}

fn request(method: Method, uri: &str, body: &str) -> http::Request<Bytes> {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::from(body.to_owned()))
        .unwrap()
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn cat_concatenates() {
    let res = app().call(request(Method::POST, "/cat", r#"{"input":"banana"}"#)).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(json_body(res.body()), json!("bananasuffix"));
}

#[tokio::test]
async fn dog_walk_reads_path_params() {
    let res = app().call(request(Method::GET, "/dog/walk/atlanta/4", "")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(json_body(res.body()), json!({"walked": true, "times": 4}));
}

#[tokio::test]
async fn path_params_are_percent_decoded() {
    let res = app().call(request(Method::GET, "/dog/walk/new%20york/4", "")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(json_body(res.body()), json!({"walked": true, "times": 4}));

    let res = app().call(request(Method::GET, "/dog/walk/%FF%FE/4", "")).await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dog_feed_reads_body() {
    let app = app();
    let res = app.call(request(Method::POST, "/dog/feed", r#"{"bowls":2}"#)).await;
    assert_eq!(json_body(res.body()), json!({"happy": true}));

    let res = app.call(request(Method::POST, "/dog/feed", r#"{"bowls":1}"#)).await;
    assert_eq!(json_body(res.body()), json!({"happy": false}));
}

#[tokio::test]
async fn malformed_input_is_bad_request() {
    let res = app().call(request(Method::POST, "/dog/feed", "not json")).await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let res = app().call(request(Method::GET, "/dog/walk/atlanta/many", "")).await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pipeline_errors_keep_their_status() {
    let res = app().call(request(Method::POST, "/dog/again", "")).await;
    assert_eq!(res.status_code(), StatusCode::CONFLICT);
    assert_eq!(json_body(res.body()), json!({"error": "already walked"}));
}

#[tokio::test]
async fn four_middleware_four_hops() {
    let res = app().call(request(Method::GET, "/dog/count", "")).await;
    assert_eq!(json_body(res.body()), json!({"counter": 4}));
}

#[tokio::test]
async fn unknown_routes_and_node_roots_are_not_found() {
    let app = app();
    for (method, uri) in [(Method::GET, "/wtf"), (Method::GET, "/dog"), (Method::GET, "/dog/"), (Method::GET, "/cat")] {
        let res = app.call(request(method, uri, "")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn every_response_carries_a_request_id() {
    let app = app();
    let res = app.call(request(Method::GET, "/wtf", "")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert!(res.headers().contains_key(X_REQUEST_ID));

    let res = app.call(request(Method::GET, "/dog/walk/atlanta/4", "")).await;
    assert!(!res.headers()[X_REQUEST_ID].is_empty());

    let mut req = request(Method::GET, "/dog/walk/atlanta/4", "");
    req.headers_mut().insert(X_REQUEST_ID, "walk-1".parse().unwrap());
    let res = app.call(req).await;
    assert_eq!(res.headers()[X_REQUEST_ID], "walk-1");
}

#[tokio::test]
async fn gzip_when_accepted() {
    let mut req = request(Method::GET, "/dog/walk/atlanta/4", "");
    req.headers_mut().insert("accept-encoding", "gzip, deflate".parse().unwrap());
    let res = app().call(req).await;

    assert_eq!(res.headers()["content-encoding"], "gzip");
    let mut body = String::new();
    GzDecoder::new(res.body()).read_to_string(&mut body).unwrap();
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"walked": true, "times": 4}));
}

#[test]
fn openapi_describes_mounted_routes() {
    let app = app();
    let doc = app.openapi();

    assert_eq!(doc["openapi"], "3.1.0");
    assert!(doc["paths"]["/cat"]["post"].is_object());
    let walk = &doc["paths"]["/dog/walk/{place}/{times}"]["get"];
    assert_eq!(walk["tags"], json!(["dog"]));
    assert_eq!(walk["parameters"].as_array().unwrap().len(), 2);

    let feed = &doc["paths"]["/dog/feed"]["post"];
    assert_eq!(
        feed["requestBody"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/FeedRequest"
    );
    let schemas = &doc["components"]["schemas"];
    assert!(schemas["FeedRequest"]["properties"]["bowls"].is_object());
    assert!(schemas["WalkResponse"]["properties"]["walked"].is_object());
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
        openapi.security = Some(vec![SecurityRequirement::new("bearerAuth", Vec::<String>::new())]);
    }
}

#[test]
fn security_schemes_via_modifier() {
    let feed = UseCase::new(|_: RequestContext, i: FeedRequest, o: &mut FeedResponse| {
        o.happy = i.bowls >= 2;
        Ok(())
    });
    let mut api = Api::new(0, 0)
        .info(usecase::openapi::Info {
            title: "My magical API".into(),
            version: "v0.0.1".into(),
            description: Some("Dogs and cats".into()),
        })
        .modify(BearerAuth)
        .route("/feed", Method::POST, feed);
    api.mount_routes().unwrap();
    let app = api.into_app();
    let doc = app.openapi();

    assert_eq!(doc["info"]["description"], "Dogs and cats");
    let scheme = &doc["components"]["securitySchemes"]["bearerAuth"];
    assert_eq!(scheme["scheme"], "bearer");
    assert_eq!(scheme["bearerFormat"], "JWT");
    assert_eq!(doc["security"], json!([{"bearerAuth": []}]));
    // Collected schemas survive alongside the added components.
    assert!(doc["components"]["schemas"]["FeedRequest"].is_object());
}

#[tokio::test]
async fn docs_serve_schema_and_ui() {
    let app = app();

    let res = app.call_docs(request(Method::GET, "/swagger/openapi.json", "")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(&json_body(res.body()), app.openapi());

    let res = app.call_docs(request(Method::GET, "/swagger/", "")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert!(res.headers()["content-type"].to_str().unwrap().starts_with("text/html"));

    let res = app.call_docs(request(Method::GET, "/swagger/swagger-initializer.js", "")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert!(std::str::from_utf8(res.body()).unwrap().contains("/swagger/openapi.json"));

    let res = app.call_docs(request(Method::GET, "/swagger", "")).await;
    assert_eq!(res.status_code(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers()["location"], "/swagger/");

    // Docs are not served on the API handler.
    let res = app.call(request(Method::GET, "/swagger/openapi.json", "")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[test]
fn invalid_node_aborts_mounting() {
    async fn ok(_req: usecase::Request) -> &'static str { "ok" }

    let mut api = Api::new(0, 0).node(Node::builder("/dog").route("walk", Method::GET, ok).build());
    let err = api.mount_routes().unwrap_err();
    assert!(matches!(err, Error::InvalidRoute(ref r) if r == "walk"), "{err}");
}
