//! linksaver-handler - request dispatcher for the estimates backend
//!
//! Routes the four estimate operations onto an [`EstimateStore`]. The
//! routing layer is independent of DynamoDB so the wire contract can be
//! tested against an in-memory store.

pub mod convert;
pub mod store;

use anyhow::{Context, Result};
use lambda_http::http::header::{self, HeaderValue};
use lambda_http::http::{Method, StatusCode};
use lambda_http::{Body, Request, Response};
use linksaver_common::estimate::validate_estimate;
use linksaver_common::defaults::ESTIMATES_PATH;
use serde_json::Value;
use store::EstimateStore;
use tracing::error;

/// Methods advertised in preflight responses
const ALLOWED_METHODS: &str = "GET,POST,DELETE,OPTIONS";

/// Headers advertised in preflight responses
const ALLOWED_HEADERS: &str = "Content-Type,x-api-key";

/// Handle one request, never failing: any routing error becomes a 500 with
/// the message in a JSON body.
pub async fn dispatch<S: EstimateStore>(store: &S, req: Request) -> Response<Body> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match route(store, &method, &path, req.body()).await {
        Ok(response) => response,
        Err(e) => {
            error!(method = %method, path = %path, error = ?e, "Request failed");
            error_response(&e.to_string())
        }
    }
}

async fn route<S: EstimateStore>(
    store: &S,
    method: &Method,
    path: &str,
    body: &Body,
) -> Result<Response<Body>> {
    if method == Method::OPTIONS {
        return preflight();
    }

    match (method, path) {
        (&Method::GET, ESTIMATES_PATH) => {
            let records = store.list().await?;
            let payload = serde_json::to_string(&records).context("Failed to encode records")?;
            respond(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload))
                .context("Failed to build response")
        }
        (&Method::POST, ESTIMATES_PATH) => {
            let parsed: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
            match validate_estimate(&parsed) {
                Ok(record) => {
                    store.put(record).await?;
                    respond(StatusCode::CREATED)
                        .body(Body::from("Estimate saved"))
                        .context("Failed to build response")
                }
                Err(e) => respond(StatusCode::BAD_REQUEST)
                    .body(Body::from(e.to_string()))
                    .context("Failed to build response"),
            }
        }
        (&Method::DELETE, ESTIMATES_PATH) => {
            store.clear().await?;
            respond(StatusCode::NO_CONTENT)
                .body(Body::Empty)
                .context("Failed to build response")
        }
        (&Method::DELETE, _) => match single_estimate_id(path) {
            Some(id) => {
                store.delete(id).await?;
                respond(StatusCode::NO_CONTENT)
                    .body(Body::Empty)
                    .context("Failed to build response")
            }
            None => not_found(),
        },
        _ => not_found(),
    }
}

/// Extract the id from `/estimates/{id}`; exactly one non-empty segment.
fn single_estimate_id(path: &str) -> Option<&str> {
    let id = path.strip_prefix("/estimates/")?;
    (!id.is_empty() && !id.contains('/')).then_some(id)
}

/// Response builder with the permissive CORS header every response carries.
fn respond(status: StatusCode) -> lambda_http::http::response::Builder {
    Response::builder()
        .status(status)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
}

fn not_found() -> Result<Response<Body>> {
    respond(StatusCode::NOT_FOUND)
        .body(Body::from("Not Found"))
        .context("Failed to build response")
}

fn preflight() -> Result<Response<Body>> {
    respond(StatusCode::OK)
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS)
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS)
        .body(Body::Empty)
        .context("Failed to build response")
}

/// Infallible 500 used when routing itself fails.
fn error_response(message: &str) -> Response<Body> {
    let payload = serde_json::json!({ "error": message }).to_string();
    let mut response = Response::new(Body::from(payload));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
