use std::sync::Arc;

use http::StatusCode;
use tracing::error;

use super::{Layer, layer_fn};
use crate::handler::boxed;
use crate::request::Request;
use crate::response::Response;

/// Runs the wrapped handler on its own task so a panic is contained and
/// answered with `500 Internal Server Error` instead of dropping the
/// connection.
pub fn recover() -> Layer {
    layer_fn(|next| {
        boxed(move |req: Request| {
            let next = Arc::clone(&next);
            async move {
                let method = req.method().clone();
                let path = req.path().to_owned();
                match tokio::spawn(async move { next.call(req).await }).await {
                    Ok(res) => res,
                    Err(e) => {
                        error!(%method, %path, "handler failed: {e}");
                        Response::status(StatusCode::INTERNAL_SERVER_ERROR)
                    }
                }
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;
    use crate::middleware::apply;

    async fn explode(_req: Request) -> &'static str {
        panic!("the dog ate the handler")
    }

    #[tokio::test]
    async fn panic_becomes_500() {
        let h = apply(&[recover()], boxed(explode));
        let res = h.call(Request::fake(Method::GET, "/", "")).await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
