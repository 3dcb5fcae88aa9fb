use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, StatusCode, body::Body, header};
use juniper::http::{GraphQLBatchRequest, graphiql::graphiql_source};
use std::{fmt, sync::Arc, time::Instant};

use crate::{api, db::Store, prelude::*};
use super::{Context, Request, Response, log, response};


/// This is the main HTTP entry point, called for each incoming request.
pub(super) async fn handle(req: Request, ctx: Arc<Context>) -> Response {
    let before = Instant::now();
    log::req::log(&req);
    if ctx.config.log.log_http_headers {
        log::headers::log(&req);
    }

    let method = req.method().clone();
    let path = req.uri().path().trim_end_matches('/').to_owned();

    let response = match path.as_str() {
        // The GraphQL endpoint. This is the only path for which POST is
        // allowed.
        "/graphql" if method == Method::POST => handle_api(req, &ctx.api_root, &ctx.store).await,
        "/graphql" => response::method_not_allowed(),

        // From this point on, we only support GET and HEAD requests.
        _ if method != Method::GET && method != Method::HEAD => response::method_not_allowed(),

        // The interactive GraphQL API explorer. It does not expose anything
        // the API itself doesn't.
        "/~graphiql" => Response::builder()
            .header(header::CONTENT_TYPE, "text/html; charset=UTF-8")
            .body(Full::new(Bytes::from(graphiql_source("/graphql", None))))
            .unwrap(),

        _ => {
            debug!("Responding with 404 to {:?} '{}'", method, path);
            response::not_found()
        }
    };

    log::res::log(&method, &path, response.status(), before.elapsed());
    response
}

/// Handles a request to `/graphql`: a single GraphQL request or a batch of
/// them, as JSON. A DB connection is only checked out once the request body
/// is completely read and parsed.
async fn handle_api<B>(req: hyper::Request<B>, api_root: &api::RootNode, store: &Store) -> Response
where
    B: Body,
    B::Error: fmt::Display,
{
    let before = Instant::now();

    let body = match req.into_body().collect().await {
        Ok(body) => body.to_bytes(),
        Err(e) => {
            warn!("Failed to read body of API request: {e}");
            return response::bad_request(Some("failed to read request body"));
        }
    };

    let gql_request = match serde_json::from_slice::<GraphQLBatchRequest>(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!("Received invalid GraphQL request: {e}");
            let msg = format!("invalid GraphQL request: {e}");
            return response::bad_request(Some(&msg));
        }
    };

    let db = match store.handle().await {
        Ok(db) => db,
        Err(response) => return response,
    };

    let api_context = api::Context { db };
    let gql_response = gql_request.execute(api_root, &api_context).await;
    let status = if gql_response.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    let body = match serde_json::to_vec(&gql_response) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to serialize GraphQL response: {e}");
            return response::internal_server_error();
        }
    };

    debug!(
        "Finished /graphql query in {:.2?} (with {} store queries)",
        before.elapsed(),
        api_context.db.num_queries(),
    );

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}


#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use deadpool_postgres::{Config as PoolConfig, Runtime};
    use http_body_util::{BodyExt, Full};
    use hyper::StatusCode;
    use std::sync::Arc;
    use tokio_postgres::NoTls;

    use crate::{api, db::{MemoryStore, Store}};
    use super::{Response, handle_api};


    /// A Postgres store whose connections can never be established.
    fn unreachable_store() -> Store {
        let config = PoolConfig {
            host: Some("127.0.0.1".into()),
            port: Some(1),
            user: Some("jotter".into()),
            dbname: Some("jotter".into()),
            .. PoolConfig::default()
        };
        Store::Postgres(config.create_pool(Some(Runtime::Tokio1), NoTls).unwrap())
    }

    async fn post(store: &Store, body: &'static str) -> (StatusCode, String) {
        let req = hyper::Request::post("/graphql").body(Full::new(Bytes::from(body))).unwrap();
        let response: Response = handle_api(req, &api::root_node(), store).await;
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn invalid_body_is_rejected_before_touching_the_db() {
        let store = unreachable_store();
        for body in ["", "{", r#"{ "variables": {} }"#] {
            let (status, msg) = post(&store, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}: {msg}");
            assert!(msg.starts_with("invalid GraphQL request"), "{msg}");
        }
    }

    #[tokio::test]
    async fn valid_request_needs_a_db_connection() {
        let (status, _) = post(&unreachable_store(), r#"{ "query": "{ getAllUsers { id } }" }"#).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn single_and_batch_requests() {
        let store = Store::Memory(Arc::new(MemoryStore::new()));

        let (status, body) = post(&store, r#"{ "query": "{ getAllUsers { id } }" }"#).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "data": { "getAllUsers": [] } }));

        let (status, body) = post(&store, r#"[
            { "query": "mutation { addUser(username: \"a\", password: \"p\", email: \"e\") { username } }" },
            { "query": "{ getAllUsers { username } }" }
        ]"#).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
        assert_eq!(json[0]["data"]["addUser"], serde_json::json!({ "username": "a" }));
        assert!(json[1]["data"]["getAllUsers"].is_array());

        let (status, _) = post(&store, r#"{ "query": "{ noSuchField }" }"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
