use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use super::{Layer, layer_fn};
use crate::handler::boxed;
use crate::request::Request;

/// Access log: one `info` event per request, emitted after the response is
/// produced.
pub fn trace() -> Layer {
    layer_fn(|next| {
        boxed(move |req: Request| {
            let next = Arc::clone(&next);
            async move {
                let method = req.method().clone();
                let path = req.path().to_owned();
                let request_id = req.request_id().unwrap_or("-").to_owned();
                let started = Instant::now();

                let res = next.call(req).await;

                info!(
                    %method,
                    %path,
                    status = res.status_code().as_u16(),
                    latency_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
                    request_id = %request_id,
                    "request"
                );
                res
            }
        })
    })
}
