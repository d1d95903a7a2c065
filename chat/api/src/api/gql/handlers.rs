use std::future;
use std::str::FromStr;
use std::sync::Arc;

use async_graphql::http::{WebSocketProtocols, WsMessage};
use async_graphql::Data;
use common::http::ext::*;
use futures_util::{SinkExt, StreamExt};
use hyper::{header, Body, Request, Response, StatusCode};
use hyper_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use hyper_tungstenite::tungstenite::protocol::CloseFrame;
use hyper_tungstenite::tungstenite::Message;
use hyper_tungstenite::HyperWebsocket;
use routerify::prelude::RequestExt;
use serde_json::json;
use tokio::select;

use super::error::GqlErrorInterface;
use super::ext::RequestExt as _;
use super::MySchema;
use crate::api::auth::{token_from_connection_params, AuthData};
use crate::api::error::Result;
use crate::api::jwt::{AuthJwtPayload, JwtState};
use crate::api::request_context::RequestContext;
use crate::dataloader::LoaderCaches;
use crate::global::ApiGlobal;

async fn websocket_handler<G: ApiGlobal>(
	ws: HyperWebsocket,
	schema: MySchema<G>,
	global: Arc<G>,
	protocol: WebSocketProtocols,
	request_context: RequestContext,
) {
	let ws = match ws.await {
		Ok(ws) => ws,
		Err(e) => {
			tracing::error!(err = %e, "failed to upgrade websocket request");
			return;
		}
	};

	let (mut tx, rx) = ws.split();

	let input = rx
		.take_while(|res| future::ready(res.is_ok()))
		.filter_map(|msg| {
			future::ready(match msg {
				Ok(msg @ (Message::Text(_) | Message::Binary(_))) => Some(msg.into_data()),
				_ => None,
			})
		});

	request_context.websocket().await;

	let data = Data::default()
		.provide_context(request_context.clone())
		.provide_global(global.clone());

	let stream = {
		let global = global.clone();

		async_graphql::http::WebSocket::new(schema, input, protocol)
			.on_connection_init(|params| async move {
				// A bad token leaves the connection anonymous, the same as on plain HTTP.
				let Some(token) = token_from_connection_params(&params) else {
					return Ok(data);
				};

				let Some(jwt) = AuthJwtPayload::verify(&global, token) else {
					tracing::debug!("ignoring invalid websocket token");
					return Ok(data);
				};

				match AuthData::from_session_id(&global, &LoaderCaches::default(), jwt.session_id).await {
					Ok(auth) if auth.user.id == jwt.user_id => match auth.touch(&global).await {
						Ok(auth) => request_context.set_auth(auth).await,
						Err(err) => return Err(GqlErrorInterface::from(err).into()),
					},
					Ok(_) => tracing::debug!(session_id = %jwt.session_id, "token subject does not own the session"),
					Err(err) if err.is_internal() => return Err(GqlErrorInterface::from(err).into()),
					Err(err) => tracing::debug!(error = %err, "ignoring websocket token"),
				}

				Ok(data)
			})
			.map(|msg| match msg {
				WsMessage::Text(text) => Message::Text(text),
				WsMessage::Close(code, status) => Message::Close(Some(CloseFrame {
					code: code.into(),
					reason: status.into(),
				})),
			})
			.map(Ok)
	};

	select! {
		_ = stream.forward(&mut tx) => {}
		_ = global.ctx().done() => {
			tx.send(Message::Close(Some(CloseFrame { code: CloseCode::Restart, reason: "server is restarting".into() }))).await.ok();
		}
	}
}

pub async fn graphql_handler<G: ApiGlobal>(mut req: Request<Body>) -> Result<Response<Body>> {
	let schema = req
		.data::<MySchema<G>>()
		.map_err_route("failed to get schema")?
		.clone();

	let global = req.get_global::<G>()?;

	let context: RequestContext = req.context().map_err_route("missing request context")?;

	// We need to check if this is a websocket upgrade request.
	// If it is, we need to upgrade the request to a websocket request.
	if hyper_tungstenite::is_upgrade_request(&req) {
		let protocol = req
			.headers()
			.get(header::SEC_WEBSOCKET_PROTOCOL)
			.and_then(|val| val.to_str().ok())
			.and_then(|protocols| protocols.split(',').find_map(|p| WebSocketProtocols::from_str(p.trim()).ok()))
			.map_err_route((StatusCode::BAD_REQUEST, "invalid websocket protocol"))?;

		let (mut response, websocket) =
			hyper_tungstenite::upgrade(&mut req, None).map_err_route((StatusCode::BAD_REQUEST, "failed to upgrade request"))?;

		response.headers_mut().insert(
			header::SEC_WEBSOCKET_PROTOCOL,
			header::HeaderValue::from_static(protocol.sec_websocket_protocol()),
		);

		tokio::spawn(websocket_handler(websocket, schema, global, protocol, context));

		return Ok(response);
	}

	// POST bodies and GET query strings both carry a GraphQL request.
	let request = match *req.method() {
		hyper::Method::POST => {
			let body = hyper::body::to_bytes(req.body_mut())
				.await
				.map_err_route((StatusCode::BAD_REQUEST, "failed to read body"))?;

			let content_type = req.headers().get(header::CONTENT_TYPE).and_then(|val| val.to_str().ok());

			async_graphql::http::receive_body(content_type, &*body, Default::default())
				.await
				.map_err_route((StatusCode::BAD_REQUEST, "failed to parse body"))?
		}
		hyper::Method::GET => {
			let query = req
				.uri()
				.query()
				.map_err_route((StatusCode::BAD_REQUEST, "missing query string"))?;

			async_graphql::http::parse_query_string(query)
				.map_err_route((StatusCode::BAD_REQUEST, "failed to parse query string"))?
		}
		_ => {
			return Err((StatusCode::METHOD_NOT_ALLOWED, "method not allowed").into());
		}
	}
	.provide_global(global)
	.provide_context(context);

	let response = schema.execute(request).await;

	let mut resp = Response::builder()
		.status(StatusCode::OK)
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(
			json!({
				"data": response.data,
				"errors": if response.errors.is_empty() {
					None
				} else {
					Some(&response.errors)
				},
				"extensions": response.extensions,
			})
			.to_string(),
		))
		.map_ignore_err_route("failed to build response")?;

	for (key, value) in response.http_headers.iter() {
		resp.headers_mut().append(key, value.clone());
	}

	Ok(resp)
}
