use bytes::Bytes;
use http_body_util::Full;
use hyper::{StatusCode, header};

use super::Response;


fn plain(status: StatusCode, body: &str) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=UTF-8")
        .body(Full::new(Bytes::copy_from_slice(body.as_bytes())))
        .unwrap()
}

pub(crate) fn service_unavailable() -> Response {
    plain(
        StatusCode::SERVICE_UNAVAILABLE,
        "Server error: service unavailable. Potentially try again later.",
    )
}

pub(crate) fn bad_request(msg: Option<&str>) -> Response {
    plain(StatusCode::BAD_REQUEST, msg.unwrap_or("Bad request"))
}

pub(crate) fn internal_server_error() -> Response {
    plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

pub(crate) fn not_found() -> Response {
    plain(StatusCode::NOT_FOUND, "404 Not found")
}

pub(crate) fn method_not_allowed() -> Response {
    plain(StatusCode::METHOD_NOT_ALLOWED, "405 Method not allowed")
}
