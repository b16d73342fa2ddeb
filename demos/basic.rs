//! Cat and dog pipelines behind one API.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -X POST http://localhost:8001/cat -d '{"input":"banana"}'
//!   curl http://localhost:8001/dog/walk/atlanta/4
//!   curl -X POST http://localhost:8001/dog/feed -d '{"bowls":2}'
//!   curl http://localhost:3000/swagger/

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use usecase::log::TracingLogger;
use usecase::{Api, Error, Node, RequestContext, UseCase};
use utoipa::ToSchema;

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

fn concatenate() -> UseCase<ConcatenateRequest, Concatenated> {
    UseCase::new(|_: RequestContext, i: ConcatenateRequest, o: &mut Concatenated| {
        o.0 = format!("{}{}", i.input, o.0);
        Ok(())
    })
    .with(|ctx: RequestContext, _: &ConcatenateRequest, o: &mut Concatenated| {
        o.0.push_str("suffix");
        Ok(ctx)
    })
    .logger(TracingLogger::new("concatenate"))
    .decorate(|op| {
        op.set_title("Concatenate").set_description("Appends a suffix to the input");
    })
}

fn walk() -> UseCase<WalkRequest, WalkResponse> {
    UseCase::new(|_: RequestContext, i: WalkRequest, o: &mut WalkResponse| {
        o.walked = true;
        o.times = i.times;
        Ok(())
    })
    .with(|ctx: RequestContext, i: &WalkRequest, _: &mut WalkResponse| {
        if i.place.is_empty() {
            return Err(Error::status(StatusCode::BAD_REQUEST, "nowhere to walk"));
        }
        Ok(ctx)
    })
    .logger(TracingLogger::new("walk"))
    .decorate(|op| {
        op.set_title("Walk the dog");
    })
}

fn feed() -> UseCase<FeedRequest, FeedResponse> {
    UseCase::new(|_: RequestContext, i: FeedRequest, o: &mut FeedResponse| {
        o.happy = i.bowls >= 2;
        Ok(())
    })
    .logger(TracingLogger::new("feed"))
    .decorate(|op| {
        op.set_title("Feed the dog");
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let dog = Node::builder("/dog")
        .tags(["dog"])
        .route("/walk/{place}/{times}", Method::GET, walk())
        .route("/feed", Method::POST, feed())
        .build();

    let api = Api::new(8001, 3000)
        .health_checks(true)
        .route("/cat", Method::POST, concatenate())
        .node(dog);

    println!("{}", api.routes());
    api.listen().await
}
