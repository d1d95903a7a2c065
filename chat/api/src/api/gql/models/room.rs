use std::marker::PhantomData;

use async_graphql::{ComplexObject, Context, SimpleObject, ID};
use common::database::Ulid;

use super::date::DateRFC3339;
use super::id::to_id;
use super::message::Message;
use super::room_member::RoomMember;
use crate::api::gql::error::ext::*;
use crate::api::gql::error::Result;
use crate::api::gql::ext::ContextExt;
use crate::api::gql::guards::{require_auth, require_membership};
use crate::database;
use crate::global::ApiGlobal;

#[derive(SimpleObject)]
#[graphql(complex)]
pub struct Room<G: ApiGlobal> {
	pub id: ID,
	pub name: String,
	pub description: Option<String>,
	pub is_private: bool,
	pub created_at: DateRFC3339,
	pub updated_at: DateRFC3339,

	#[graphql(skip)]
	pub id_: Ulid,
	#[graphql(skip)]
	pub _phantom: PhantomData<G>,
}

#[ComplexObject]
impl<G: ApiGlobal> Room<G> {
	/// Members in the order they joined.
	async fn members(&self, ctx: &Context<'_>) -> Result<Vec<RoomMember<G>>> {
		let global = ctx.get_global::<G>();
		let caches = ctx.get_req_context().loader_caches().await;

		let members = global
			.room_members_by_room_loader()
			.load_with_cache(&caches.room_members_by_room, self.id_)
			.await
			.map_err_ignored_gql("failed to fetch room members")?
			.unwrap_or_default();

		Ok(members.into_iter().map(Into::into).collect())
	}

	/// Every message of the room, oldest first. Only members may read them.
	async fn messages(&self, ctx: &Context<'_>) -> Result<Vec<Message<G>>> {
		let global = ctx.get_global::<G>();
		let auth = require_auth::<G>(ctx).await?;
		let caches = ctx.get_req_context().loader_caches().await;

		require_membership(global, &caches, self.id_, auth.user_id()).await?;

		let messages = global
			.messages_by_room_loader()
			.load_with_cache(&caches.messages_by_room, self.id_)
			.await
			.map_err_ignored_gql("failed to fetch messages")?
			.unwrap_or_default();

		Ok(messages.into_iter().map(Into::into).collect())
	}

	async fn message_count(&self, ctx: &Context<'_>) -> Result<i64> {
		let global = ctx.get_global::<G>();
		let caches = ctx.get_req_context().loader_caches().await;

		Ok(global
			.message_count_by_room_loader()
			.load_with_cache(&caches.message_count_by_room, self.id_)
			.await
			.map_err_ignored_gql("failed to count messages")?
			.unwrap_or_default())
	}
}

impl<G: ApiGlobal> From<database::Room> for Room<G> {
	fn from(value: database::Room) -> Self {
		Self {
			id: to_id(value.id),
			name: value.name,
			description: value.description,
			is_private: value.is_private,
			created_at: value.created_at.into(),
			updated_at: value.updated_at.into(),
			id_: value.id,
			_phantom: PhantomData,
		}
	}
}
