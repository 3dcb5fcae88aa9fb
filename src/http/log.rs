//! Small inline modules so that individual HTTP log messages can be switched
//! on and off with the log filters, e.g. `filters."jotter::http::log::headers"`.

use std::time::Duration;
use hyper::{Method, StatusCode};

use crate::prelude::*;
use super::Request;


pub(crate) mod req {
    use super::*;

    pub(crate) fn log(req: &Request) {
        trace!(
            method = ?req.method(),
            path = req.uri().path_and_query().map_or("", |pq| pq.as_str()),
            "Incoming HTTP request",
        );
    }
}

pub(crate) mod headers {
    use super::*;

    pub(crate) fn log(req: &Request) {
        if tracing::enabled!(tracing::Level::TRACE) {
            let mut out = String::new();
            for (name, value) in req.headers() {
                use std::fmt::Write;
                let _ = write!(out, "\n  {}: {}", name, String::from_utf8_lossy(value.as_bytes()));
            }
            trace!("HTTP Headers: {}", out);
        }
    }
}

pub(crate) mod res {
    use super::*;

    pub(crate) fn log(method: &Method, path: &str, status: StatusCode, duration: Duration) {
        if status.is_server_error() {
            warn!("Responded with {status} to {method} '{path}' after {duration:.2?}");
        } else {
            trace!("Responded with {status} to {method} '{path}' after {duration:.2?}");
        }
    }
}
