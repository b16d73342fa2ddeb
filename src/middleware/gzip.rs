use std::io::Write;
use std::sync::Arc;

use flate2::Compression;
use flate2::write::GzEncoder;
use http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, VARY};
use http::HeaderValue;
use tracing::warn;

use super::{Layer, layer_fn};
use crate::handler::boxed;
use crate::request::Request;

/// Gzips non-empty response bodies when the client sends
/// `accept-encoding: gzip`. Responses that already carry a
/// `content-encoding` pass through untouched.
pub fn gzip() -> Layer {
    layer_fn(|next| {
        boxed(move |req: Request| {
            let next = Arc::clone(&next);
            async move {
                let wants_gzip = req.header(ACCEPT_ENCODING.as_str()).is_some_and(accepts_gzip);
                let mut res = next.call(req).await;

                if !wants_gzip || res.body().is_empty() || res.headers().contains_key(CONTENT_ENCODING) {
                    return res;
                }

                match compress(res.body()) {
                    Ok(body) => {
                        res.set_body(body);
                        let headers = res.headers_mut();
                        headers.remove(CONTENT_LENGTH);
                        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
                        headers.append(VARY, HeaderValue::from_static("accept-encoding"));
                    }
                    Err(e) => warn!("gzip failed, sending identity body: {e}"),
                }
                res
            }
        })
    })
}

fn compress(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body)?;
    encoder.finish()
}

/// `gzip` listed without `q=0`.
fn accepts_gzip(header: &str) -> bool {
    header.split(',').any(|part| {
        let mut pieces = part.split(';').map(str::trim);
        let coding = pieces.next().unwrap_or("");
        let disabled = pieces.any(|p| p.replace(' ', "") == "q=0");
        coding.eq_ignore_ascii_case("gzip") && !disabled
    })
}
