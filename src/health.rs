//! Health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? |
//! | **Readiness** | `/readyz` | Can it serve traffic? |
//!
//! Turned on with [`Api::health_checks`](crate::Api::health_checks) or
//! `health_checks` in [`Config`](crate::Config). They are plain handlers, so
//! registering them by hand works too:
//!
//! ```rust
//! use http::Method;
//! use usecase::{Api, health};
//!
//! let api = Api::new(8001, 3000).route("/livez", Method::GET, health::liveness);
//! # let _ = api;
//! ```

use crate::{Request, Response};

pub const LIVENESS_PATH: &str = "/healthz";
pub const READINESS_PATH: &str = "/readyz";

/// Always `200 OK` with body `"ok"`. If the process can answer HTTP at all,
/// it is alive.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// `200 OK` with body `"ready"`. Register your own handler on
/// [`READINESS_PATH`] instead if readiness depends on something downstream.
pub async fn readiness(_req: Request) -> Response {
    Response::text("ready")
}
