use std::time::Duration;

use common::prelude::FutureTimeout;
use hyper::header::{self, HeaderMap};
use hyper::{Body, Client, Method, Request, StatusCode};
use serde_json::{json, Value};
use serial_test::serial;

use crate::tests::global::{create_session, create_user, mock_api_server, PASSWORD};

async fn send(client: &Client<hyper::client::HttpConnector>, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
	let resp = client
		.request(req)
		.timeout(Duration::from_secs(5))
		.await
		.expect("request timed out")
		.expect("request failed");

	let status = resp.status();
	let headers = resp.headers().clone();
	let body = hyper::body::to_bytes(resp.into_body()).await.expect("failed to read body");

	let body = if body.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&body).expect("body is not json")
	};

	(status, headers, body)
}

fn graphql(port: u16) -> hyper::http::request::Builder {
	Request::builder()
		.method(Method::POST)
		.uri(format!("http://127.0.0.1:{port}/graphql"))
		.header(header::CONTENT_TYPE, "application/json")
}

fn graphql_body(query: &str, variables: Value) -> Body {
	Body::from(json!({ "query": query, "variables": variables }).to_string())
}

#[serial]
#[tokio::test]
async fn test_serial_health_and_not_found() {
	let (global, handler, handle, port) = mock_api_server().await;
	let client = Client::new();

	let (status, headers, body) = send(
		&client,
		Request::get(format!("http://127.0.0.1:{port}/health"))
			.body(Body::empty())
			.expect("failed to build request"),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(
		headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
		Some("application/json")
	);
	assert_eq!(body["status"], "ok");
	assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().expect("missing timestamp")).is_ok());

	let (status, _, body) = send(
		&client,
		Request::get(format!("http://127.0.0.1:{port}/does-not-exist"))
			.body(Body::empty())
			.expect("failed to build request"),
	)
	.await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body, json!({ "success": false, "message": "not found" }));

	// The client uses Keep-Alive, so we need to drop it to release the global context
	drop(client);
	drop(global);

	handler
		.cancel()
		.timeout(Duration::from_secs(1))
		.await
		.expect("failed to cancel context");

	handle
		.timeout(Duration::from_secs(1))
		.await
		.expect("api did not stop")
		.expect("api panicked")
		.expect("api failed");
}

#[serial]
#[tokio::test]
async fn test_serial_cors() {
	let (global, handler, handle, port) = mock_api_server().await;
	let client = Client::new();

	let (status, headers, _) = send(
		&client,
		Request::get(format!("http://127.0.0.1:{port}/health"))
			.header(header::ORIGIN, "http://localhost:3000")
			.body(Body::empty())
			.expect("failed to build request"),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(
		headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).and_then(|v| v.to_str().ok()),
		Some("http://localhost:3000")
	);
	assert_eq!(
		headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).and_then(|v| v.to_str().ok()),
		Some("true")
	);
	assert!(headers.get_all(header::VARY).iter().any(|v| v == "Origin"));

	let (_, headers, _) = send(
		&client,
		Request::get(format!("http://127.0.0.1:{port}/health"))
			.header(header::ORIGIN, "https://evil.example.com")
			.body(Body::empty())
			.expect("failed to build request"),
	)
	.await;
	assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

	let (status, headers, _) = send(
		&client,
		Request::builder()
			.method(Method::OPTIONS)
			.uri(format!("http://127.0.0.1:{port}/graphql"))
			.header(header::ORIGIN, "http://localhost:5173")
			.header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
			.body(Body::empty())
			.expect("failed to build request"),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(
		headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).and_then(|v| v.to_str().ok()),
		Some("http://localhost:5173")
	);
	assert_eq!(
		headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).and_then(|v| v.to_str().ok()),
		Some("GET, POST, OPTIONS")
	);

	drop(client);
	drop(global);

	handler
		.cancel()
		.timeout(Duration::from_secs(1))
		.await
		.expect("failed to cancel context");

	handle
		.timeout(Duration::from_secs(1))
		.await
		.expect("api did not stop")
		.expect("api panicked")
		.expect("api failed");
}

#[serial]
#[tokio::test]
async fn test_serial_graphql_over_http_auth() {
	let (global, handler, handle, port) = mock_api_server().await;
	let client = Client::new();

	let user = create_user(&global, "alice").await;
	let (_, token) = create_session(&global, &user).await;

	let me = "{ me { username } }";

	let (status, _, body) = send(
		&client,
		graphql(port)
			.header(header::AUTHORIZATION, format!("Bearer {token}"))
			.body(graphql_body(me, json!({})))
			.expect("failed to build request"),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"], json!({ "me": { "username": "alice" } }));

	let (_, _, body) = send(
		&client,
		graphql(port)
			.header(header::COOKIE, format!("token={token}"))
			.body(graphql_body(me, json!({})))
			.expect("failed to build request"),
	)
	.await;
	assert_eq!(body["data"], json!({ "me": { "username": "alice" } }));

	// A bad token leaves the request anonymous instead of rejecting it.
	let (status, _, body) = send(
		&client,
		graphql(port)
			.header(header::AUTHORIZATION, "Bearer not-a-token")
			.body(graphql_body(me, json!({})))
			.expect("failed to build request"),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["errors"][0]["extensions"]["code"], "UNAUTHENTICATED");

	let (status, _, body) = send(
		&client,
		Request::get(format!("http://127.0.0.1:{port}/graphql?query=%7B%20rooms%20%7B%20name%20%7D%20%7D"))
			.body(Body::empty())
			.expect("failed to build request"),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"], json!({ "rooms": [] }));

	drop(client);
	drop(global);

	handler
		.cancel()
		.timeout(Duration::from_secs(1))
		.await
		.expect("failed to cancel context");

	handle
		.timeout(Duration::from_secs(1))
		.await
		.expect("api did not stop")
		.expect("api panicked")
		.expect("api failed");
}

#[serial]
#[tokio::test]
async fn test_serial_signup_sets_cookie() {
	let (global, handler, handle, port) = mock_api_server().await;
	let client = Client::new();

	let signup = r#"
		mutation signup($input: SignupInput!) {
			signup(input: $input) {
				token
			}
		}
	"#;
	let variables = json!({ "input": { "email": "alice@example.com", "username": "alice", "password": PASSWORD } });

	let (status, headers, body) = send(
		&client,
		graphql(port)
			.body(graphql_body(signup, variables))
			.expect("failed to build request"),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	let token = body["data"]["signup"]["token"].as_str().expect("missing token");

	let cookie = headers
		.get(header::SET_COOKIE)
		.and_then(|v| v.to_str().ok())
		.expect("missing cookie");
	assert!(cookie.starts_with(&format!("token={token};")));
	assert!(cookie.contains("HttpOnly"));
	assert!(cookie.contains("SameSite=Lax"));

	let me = "{ me { username email } }";
	let (_, _, body) = send(
		&client,
		graphql(port)
			.header(header::COOKIE, format!("token={token}"))
			.body(graphql_body(me, json!({})))
			.expect("failed to build request"),
	)
	.await;
	assert_eq!(
		body["data"],
		json!({ "me": { "username": "alice", "email": "alice@example.com" } })
	);

	drop(client);
	drop(global);

	handler
		.cancel()
		.timeout(Duration::from_secs(1))
		.await
		.expect("failed to cancel context");

	handle
		.timeout(Duration::from_secs(1))
		.await
		.expect("api did not stop")
		.expect("api panicked")
		.expect("api failed");
}
