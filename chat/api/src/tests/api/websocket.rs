use std::time::Duration;

use common::prelude::FutureTimeout;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use serial_test::serial;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::tests::global::{create_room, create_session, create_user, mock_api_server};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(port: u16) -> Socket {
	let mut request = format!("ws://127.0.0.1:{port}/graphql")
		.into_client_request()
		.expect("failed to build request");

	request
		.headers_mut()
		.insert("Sec-WebSocket-Protocol", HeaderValue::from_static("graphql-transport-ws"));

	let (socket, response) = tokio_tungstenite::connect_async(request)
		.timeout(Duration::from_secs(5))
		.await
		.expect("connect timed out")
		.expect("failed to connect");

	assert_eq!(
		response
			.headers()
			.get("Sec-WebSocket-Protocol")
			.and_then(|v| v.to_str().ok()),
		Some("graphql-transport-ws")
	);

	socket
}

async fn send_json(socket: &mut Socket, value: Value) {
	socket
		.send(Message::Text(value.to_string()))
		.await
		.expect("failed to send message");
}

async fn next_json(socket: &mut Socket) -> Value {
	loop {
		let msg = socket
			.next()
			.timeout(Duration::from_secs(2))
			.await
			.expect("timed out waiting for message")
			.expect("socket closed")
			.expect("failed to read message");

		if let Message::Text(text) = msg {
			return serde_json::from_str(&text).expect("message is not json");
		}
	}
}

#[serial]
#[tokio::test]
async fn test_serial_websocket_subscription() {
	let (global, handler, handle, port) = mock_api_server().await;

	let alice = create_user(&global, "alice").await;
	let room = create_room(&global, &alice, "private", true).await;
	let (_, token) = create_session(&global, &alice).await;

	let mut socket = connect(port).await;

	send_json(
		&mut socket,
		json!({ "type": "connection_init", "payload": { "authorization": format!("Bearer {token}") } }),
	)
	.await;
	assert_eq!(next_json(&mut socket).await["type"], "connection_ack");

	send_json(
		&mut socket,
		json!({
			"id": "1",
			"type": "subscribe",
			"payload": {
				"query": "subscription messageAdded($roomId: ID!) { messageAdded(roomId: $roomId) { content user { username } } }",
				"variables": { "roomId": room.id.to_string() },
			},
		}),
	)
	.await;

	// Give the subscription time to register before anything is published.
	tokio::time::sleep(Duration::from_millis(200)).await;

	send_json(
		&mut socket,
		json!({
			"id": "2",
			"type": "subscribe",
			"payload": {
				"query": "mutation send($roomId: ID!) { sendMessage(input: { roomId: $roomId, content: \"over the socket\" }) { message { id } } }",
				"variables": { "roomId": room.id.to_string() },
			},
		}),
	)
	.await;

	let mut event = None;
	let mut mutation = None;
	while event.is_none() || mutation.is_none() {
		let msg = next_json(&mut socket).await;
		match (msg["type"].as_str(), msg["id"].as_str()) {
			(Some("next"), Some("1")) => event = Some(msg),
			(Some("next"), Some("2")) => mutation = Some(msg),
			_ => {}
		}
	}

	let mutation = mutation.expect("missing mutation response");
	assert!(mutation["payload"]["errors"].is_null(), "{mutation}");

	let event = event.expect("missing subscription event");
	assert_eq!(
		event["payload"]["data"],
		json!({ "messageAdded": { "content": "over the socket", "user": { "username": "alice" } } })
	);

	send_json(&mut socket, json!({ "id": "1", "type": "complete" })).await;
	socket.close(None).await.ok();
	drop(socket);

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
async fn test_serial_websocket_anonymous() {
	let (global, handler, handle, port) = mock_api_server().await;

	let alice = create_user(&global, "alice").await;
	let room = create_room(&global, &alice, "private", true).await;

	let mut socket = connect(port).await;

	// An unusable token still gets the connection acknowledged, just anonymously.
	send_json(
		&mut socket,
		json!({ "type": "connection_init", "payload": { "token": "not-a-token" } }),
	)
	.await;
	assert_eq!(next_json(&mut socket).await["type"], "connection_ack");

	send_json(
		&mut socket,
		json!({
			"id": "1",
			"type": "subscribe",
			"payload": {
				"query": "subscription messageAdded($roomId: ID!) { messageAdded(roomId: $roomId) { content } }",
				"variables": { "roomId": room.id.to_string() },
			},
		}),
	)
	.await;

	let msg = next_json(&mut socket).await;
	assert_eq!(msg["id"], "1");
	assert!(msg.to_string().contains("UNAUTHENTICATED"), "{msg}");

	socket.close(None).await.ok();
	drop(socket);

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
