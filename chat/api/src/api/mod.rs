use std::sync::Arc;

use common::http::RouteError;
use common::make_response;
use hyper::server::conn::Http;
use hyper::{Body, Response, StatusCode};
use routerify::{RequestServiceBuilder, Router};
use serde_json::json;
use tokio::net::TcpSocket;
use tokio::select;

use self::error::ApiError;
use crate::config::ApiConfig;
use crate::global::ApiGlobal;

pub mod auth;
pub mod error;
pub mod gql;
pub mod health;
pub mod jwt;
pub mod middleware;
pub mod request_context;

pub fn routes<G: ApiGlobal>(global: &Arc<G>) -> anyhow::Result<Router<Body, RouteError<ApiError>>> {
	let weak = Arc::downgrade(global);
	Router::builder()
		.data(weak)
		.data(gql::schema::<G>())
		.err_handler_with_info(common::http::error_handler::<ApiError>)
		// The auth middleware resolves the session token, if any, into the request
		// context. It never rejects a request for a bad token.
		.middleware(middleware::auth::auth_middleware(global))
		.middleware(middleware::cors::cors_middleware(global))
		// Preflight requests only need the CORS headers added on the way out.
		.options("/*", |_| async move { Ok(Response::new(Body::empty())) })
		.get("/health", health::health)
		.get("/graphql", gql::handlers::graphql_handler::<G>)
		.post("/graphql", gql::handlers::graphql_handler::<G>)
		.any(|_| async move {
			Ok(make_response!(
				StatusCode::NOT_FOUND,
				json!({ "success": false, "message": "not found" })
			))
		})
		.build()
		.map_err(|e| anyhow::anyhow!("failed to build router: {e}"))
}

pub async fn run<G: ApiGlobal>(global: Arc<G>) -> anyhow::Result<()> {
	let config = global.config::<ApiConfig>();
	tracing::info!("API listening on {}", config.bind_address);
	let socket = if config.bind_address.is_ipv6() {
		TcpSocket::new_v6()?
	} else {
		TcpSocket::new_v4()?
	};

	socket.set_reuseaddr(true)?;
	socket.set_reuseport(true)?;
	socket.bind(config.bind_address)?;
	let listener = socket.listen(1024)?;

	// The router only holds a weak reference to the global state, so open
	// keep-alive connections do not keep it alive during shutdown.
	let request_service =
		RequestServiceBuilder::new(routes(&global)?).map_err(|e| anyhow::anyhow!("failed to build request service: {e}"))?;

	loop {
		select! {
			_ = global.ctx().done() => {
				return Ok(());
			},
			r = listener.accept() => {
				let (socket, addr) = r?;

				let service = request_service.build(addr);

				tracing::debug!("Accepted connection from {}", addr);

				tokio::spawn(async move {
					Http::new().serve_connection(
						socket,
						service,
					).with_upgrades().await.ok();
				});
			},
		}
	}
}
