use async_graphql::{Context, Object, ID};

use crate::api::gql::error::Result;
use crate::api::gql::ext::ContextExt;
use crate::api::gql::guards::{load_room, require_auth, require_membership};
use crate::api::gql::models::id::parse_id;
use crate::api::gql::models::message::Message;
use crate::api::gql::validators;
use crate::database;
use crate::global::ApiGlobal;

pub struct MessageQuery<G>(std::marker::PhantomData<G>);

impl<G: ApiGlobal> Default for MessageQuery<G> {
	fn default() -> Self {
		Self(std::marker::PhantomData)
	}
}

#[Object]
impl<G: ApiGlobal> MessageQuery<G> {
	/// A page of the messages of a room, oldest first. Only members may read
	/// them.
	async fn messages(
		&self,
		ctx: &Context<'_>,
		#[graphql(desc = "The room to read.")] room_id: ID,
		#[graphql(desc = "How many messages to return, at most 100.", default = 50)] limit: Option<i32>,
		#[graphql(desc = "How many messages to skip.", default = 0)] offset: Option<i32>,
	) -> Result<Vec<Message<G>>> {
		let global = ctx.get_global::<G>();
		let room_id = parse_id("roomId", &room_id)?;
		let (limit, offset) = validators::pagination(
			limit.unwrap_or(validators::MESSAGES_DEFAULT_LIMIT),
			offset.unwrap_or_default(),
		)?;

		let auth = require_auth::<G>(ctx).await?;
		let caches = ctx.get_req_context().loader_caches().await;

		let room = load_room(global, &caches, room_id).await?;
		require_membership(global, &caches, room.id, auth.user_id()).await?;

		let messages: Vec<database::Message> =
			sqlx::query_as("SELECT * FROM messages WHERE room_id = ? ORDER BY created_at, id LIMIT ? OFFSET ?")
				.bind(room.id)
				.bind(limit)
				.bind(offset)
				.fetch_all(global.db())
				.await?;

		Ok(messages.into_iter().map(Into::into).collect())
	}
}
