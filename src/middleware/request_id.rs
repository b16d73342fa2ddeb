use std::sync::Arc;

use http::HeaderValue;
use uuid::Uuid;

use super::{Layer, layer_fn};
use crate::handler::boxed;
use crate::request::Request;

/// Header carrying the request id in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Assigns every request an id, reusing a non-empty inbound `x-request-id`
/// and generating a UUID v4 otherwise. The id is visible to handlers through
/// [`Request::request_id`] and echoed on the response.
pub fn request_id() -> Layer {
    layer_fn(|next| {
        boxed(move |mut req: Request| {
            let next = Arc::clone(&next);
            async move {
                let id = req
                    .header(X_REQUEST_ID)
                    .filter(|v| !v.is_empty())
                    .map(str::to_owned)
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                req.set_request_id(id.clone());

                let mut res = next.call(req).await;
                if let Ok(value) = HeaderValue::from_str(&id) {
                    res.headers_mut().insert(X_REQUEST_ID, value);
                }
                res
            }
        })
    })
}
