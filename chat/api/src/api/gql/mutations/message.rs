use async_graphql::{Context, Object};
use chrono::Utc;
use common::database::Ulid;

use crate::api::gql::error::ext::*;
use crate::api::gql::error::Result;
use crate::api::gql::ext::ContextExt;
use crate::api::gql::guards::{require_auth, require_membership};
use crate::api::gql::models::id::parse_id;
use crate::api::gql::models::inputs::SendMessageInput;
use crate::api::gql::models::responses::MessageResponse;
use crate::api::gql::validators;
use crate::database;
use crate::global::ApiGlobal;
use crate::subscription::SubscriptionTopic;

pub struct MessageMutation<G>(std::marker::PhantomData<G>);

impl<G: ApiGlobal> Default for MessageMutation<G> {
	fn default() -> Self {
		Self(std::marker::PhantomData)
	}
}

#[Object]
impl<G: ApiGlobal> MessageMutation<G> {
	/// Send a message to a room the current user is a member of.
	async fn send_message(&self, ctx: &Context<'_>, input: SendMessageInput) -> Result<MessageResponse<G>> {
		let global = ctx.get_global::<G>();
		let auth = require_auth::<G>(ctx).await?;
		let room_id = parse_id("roomId", &input.room_id)?;
		let caches = ctx.get_req_context().loader_caches().await;

		require_membership(global, &caches, room_id, auth.user_id()).await?;

		let content = validators::message_content(&input.content)?;
		let now = Utc::now();

		let mut tx = global.db().begin().await?;

		let message: database::Message = sqlx::query_as(
			"INSERT INTO messages (id, content, user_id, room_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
		)
		.bind(Ulid::new())
		.bind(content)
		.bind(auth.user_id())
		.bind(room_id)
		.bind(now)
		.bind(now)
		.fetch_one(&mut *tx)
		.await?;

		sqlx::query("UPDATE rooms SET updated_at = ? WHERE id = ?")
			.bind(now)
			.bind(room_id)
			.execute(&mut *tx)
			.await?;

		tx.commit().await?;

		caches.message_added(room_id);

		let payload = serde_json::to_vec(&message).map_err_gql("failed to encode message")?;
		global
			.subscription_manager()
			.publish(SubscriptionTopic::RoomMessages(room_id), payload)
			.map_err_gql("failed to publish message")?;

		Ok(MessageResponse { message: message.into() })
	}
}
