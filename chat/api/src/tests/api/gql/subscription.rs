use std::time::Duration;

use chrono::Utc;
use common::database::Ulid;
use common::prelude::FutureTimeout;
use futures_util::StreamExt;
use serde_json::json;
use serial_test::serial;

use crate::api::gql::schema;
use crate::api::request_context::RequestContext;
use crate::database::{self, RoomRole};
use crate::global::ApiState;
use crate::subscription::SubscriptionTopic;
use crate::tests::global::{
	add_member, create_room, create_user, error_code, execute, gql_request, mock_global_state, to_json, user_context,
};
use crate::GlobalState;

const MESSAGE_ADDED: &str = r#"
	subscription messageAdded($roomId: ID!) {
		messageAdded(roomId: $roomId) {
			content
			user {
				username
			}
		}
	}
"#;

const SEND_MESSAGE: &str = r#"
	mutation sendMessage($roomId: ID!, $content: String!) {
		sendMessage(input: { roomId: $roomId, content: $content }) {
			message {
				id
			}
		}
	}
"#;

#[serial]
#[tokio::test]
async fn test_serial_message_added_subscription() {
	let (global, handler) = mock_global_state(Default::default()).await;

	let alice = create_user(&global, "alice").await;
	let general = create_room(&global, &alice, "general", false).await;
	let random = create_room(&global, &alice, "random", false).await;

	let schema = schema::<GlobalState>();

	{
		let mut stream = schema.execute_stream(gql_request(
			&global,
			&RequestContext::default(),
			MESSAGE_ADDED,
			json!({ "roomId": general.id.to_string() }),
		));

		// Drives the subscription until it waits for its first event.
		assert!(stream.next().timeout(Duration::from_millis(200)).await.is_err());

		let context = user_context(&global, &alice).await;
		for (room, content) in [(&random, "elsewhere"), (&general, "hello general")] {
			let res = execute(
				&global,
				&context,
				SEND_MESSAGE,
				json!({ "roomId": room.id.to_string(), "content": content }),
			)
			.await;
			assert!(res.errors.is_empty(), "{:?}", res.errors);
		}

		let res = stream
			.next()
			.timeout(Duration::from_secs(1))
			.await
			.expect("timed out")
			.expect("stream ended");

		assert!(res.errors.is_empty(), "{:?}", res.errors);
		assert_eq!(
			to_json(&res)["data"],
			json!({ "messageAdded": { "content": "hello general", "user": { "username": "alice" } } })
		);

		// An event for another room on this topic is dropped.
		let stray = database::Message {
			id: Ulid::new(),
			content: "stray".to_string(),
			user_id: alice.id,
			room_id: random.id,
			created_at: Utc::now(),
			updated_at: Utc::now(),
		};
		global
			.subscription_manager()
			.publish(
				SubscriptionTopic::RoomMessages(general.id),
				serde_json::to_vec(&stray).expect("failed to encode message"),
			)
			.expect("failed to publish");

		assert!(stream.next().timeout(Duration::from_millis(200)).await.is_err());
	}

	drop(global);

	handler
		.cancel()
		.timeout(Duration::from_secs(1))
		.await
		.expect("failed to cancel context");
}

#[serial]
#[tokio::test]
async fn test_serial_private_room_subscription() {
	let (global, handler) = mock_global_state(Default::default()).await;

	let alice = create_user(&global, "alice").await;
	let bob = create_user(&global, "bob").await;
	let private = create_room(&global, &alice, "private", true).await;

	let schema = schema::<GlobalState>();
	let variables = json!({ "roomId": private.id.to_string() });

	for (context, code) in [
		(RequestContext::default(), "UNAUTHENTICATED"),
		(user_context(&global, &bob).await, "FORBIDDEN"),
	] {
		let res = schema
			.execute_stream(gql_request(&global, &context, MESSAGE_ADDED, variables.clone()))
			.next()
			.timeout(Duration::from_secs(1))
			.await
			.expect("timed out")
			.expect("stream ended");

		assert_eq!(error_code(&res).as_deref(), Some(code));
	}

	let res = schema
		.execute_stream(gql_request(
			&global,
			&RequestContext::default(),
			MESSAGE_ADDED,
			json!({ "roomId": Ulid::new().to_string() }),
		))
		.next()
		.timeout(Duration::from_secs(1))
		.await
		.expect("timed out")
		.expect("stream ended");
	assert_eq!(error_code(&res).as_deref(), Some("NOT_FOUND"));

	drop(global);

	handler
		.cancel()
		.timeout(Duration::from_secs(1))
		.await
		.expect("failed to cancel context");
}

#[serial]
#[tokio::test]
async fn test_serial_room_member_subscriptions() {
	let (global, handler) = mock_global_state(Default::default()).await;

	let alice = create_user(&global, "alice").await;
	let bob = create_user(&global, "bob").await;
	let room = create_room(&global, &alice, "general", false).await;

	let schema = schema::<GlobalState>();
	let alice_context = user_context(&global, &alice).await;
	let variables = json!({ "roomId": room.id.to_string() });

	{
		let mut joined = schema.execute_stream(gql_request(
			&global,
			&alice_context,
			"subscription joined($roomId: ID!) { roomMemberJoined(roomId: $roomId) { role user { username } } }",
			variables.clone(),
		));
		let mut left = schema.execute_stream(gql_request(
			&global,
			&alice_context,
			"subscription left($roomId: ID!) { roomMemberLeft(roomId: $roomId) { role user { username } } }",
			variables.clone(),
		));

		assert!(joined.next().timeout(Duration::from_millis(200)).await.is_err());
		assert!(left.next().timeout(Duration::from_millis(200)).await.is_err());

		let bob_context = user_context(&global, &bob).await;

		let res = execute(
			&global,
			&bob_context,
			"mutation join($roomId: ID!) { joinRoom(input: { roomId: $roomId }) { room { id } } }",
			variables.clone(),
		)
		.await;
		assert!(res.errors.is_empty(), "{:?}", res.errors);

		let res = joined
			.next()
			.timeout(Duration::from_secs(1))
			.await
			.expect("timed out")
			.expect("stream ended");
		assert_eq!(
			to_json(&res)["data"],
			json!({ "roomMemberJoined": { "role": "member", "user": { "username": "bob" } } })
		);

		let res = execute(
			&global,
			&bob_context,
			"mutation leave($roomId: ID!) { leaveRoom(roomId: $roomId) }",
			variables.clone(),
		)
		.await;
		assert!(res.errors.is_empty(), "{:?}", res.errors);

		let res = left
			.next()
			.timeout(Duration::from_secs(1))
			.await
			.expect("timed out")
			.expect("stream ended");
		assert_eq!(
			to_json(&res)["data"],
			json!({ "roomMemberLeft": { "role": "member", "user": { "username": "bob" } } })
		);

		assert!(joined.next().timeout(Duration::from_millis(100)).await.is_err());
	}

	drop(global);

	handler
		.cancel()
		.timeout(Duration::from_secs(1))
		.await
		.expect("failed to cancel context");
}

#[serial]
#[tokio::test]
async fn test_serial_private_subscription_ends_after_leaving() {
	let (global, handler) = mock_global_state(Default::default()).await;

	let alice = create_user(&global, "alice").await;
	let bob = create_user(&global, "bob").await;
	let secret = create_room(&global, &alice, "secret", true).await;
	add_member(&global, &secret, &bob, RoomRole::Member).await;

	let schema = schema::<GlobalState>();
	let alice_context = user_context(&global, &alice).await;
	let bob_context = user_context(&global, &bob).await;
	let variables = json!({ "roomId": secret.id.to_string() });

	{
		let mut stream = schema.execute_stream(gql_request(&global, &bob_context, MESSAGE_ADDED, variables.clone()));
		assert!(stream.next().timeout(Duration::from_millis(200)).await.is_err());

		let res = execute(
			&global,
			&alice_context,
			SEND_MESSAGE,
			json!({ "roomId": secret.id.to_string(), "content": "before-leave" }),
		)
		.await;
		assert!(res.errors.is_empty(), "{:?}", res.errors);

		let res = stream
			.next()
			.timeout(Duration::from_secs(1))
			.await
			.expect("timed out")
			.expect("stream ended");
		assert_eq!(to_json(&res)["data"]["messageAdded"]["content"], "before-leave");

		let res = execute(
			&global,
			&bob_context,
			"mutation leave($roomId: ID!) { leaveRoom(roomId: $roomId) }",
			variables.clone(),
		)
		.await;
		assert_eq!(to_json(&res)["data"], json!({ "leaveRoom": true }));

		let res = execute(
			&global,
			&alice_context,
			SEND_MESSAGE,
			json!({ "roomId": secret.id.to_string(), "content": "after-leave" }),
		)
		.await;
		assert!(res.errors.is_empty(), "{:?}", res.errors);

		let next = stream.next().timeout(Duration::from_secs(1)).await.expect("timed out");
		assert!(next.is_none(), "stream kept delivering: {next:?}");
	}

	drop(global);

	handler
		.cancel()
		.timeout(Duration::from_secs(1))
		.await
		.expect("failed to cancel context");
}
