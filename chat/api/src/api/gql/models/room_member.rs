use std::marker::PhantomData;

use async_graphql::{ComplexObject, Context, SimpleObject, ID};
use common::database::Ulid;

use super::date::DateRFC3339;
use super::id::to_id;
use super::room::Room;
use super::user::User;
use crate::api::gql::error::ext::*;
use crate::api::gql::error::{GqlError, Result};
use crate::api::gql::ext::ContextExt;
use crate::api::gql::guards::load_room;
use crate::database;
use crate::global::ApiGlobal;

#[derive(SimpleObject)]
#[graphql(complex)]
pub struct RoomMember<G: ApiGlobal> {
	pub id: ID,
	/// Either `owner` or `member`.
	pub role: String,
	pub joined_at: DateRFC3339,

	#[graphql(skip)]
	pub user_id_: Ulid,
	#[graphql(skip)]
	pub room_id_: Ulid,
	#[graphql(skip)]
	pub _phantom: PhantomData<G>,
}

#[ComplexObject]
impl<G: ApiGlobal> RoomMember<G> {
	async fn user(&self, ctx: &Context<'_>) -> Result<User<G>> {
		let global = ctx.get_global::<G>();
		let caches = ctx.get_req_context().loader_caches().await;

		let user = global
			.user_by_id_loader()
			.load_with_cache(&caches.user_by_id, self.user_id_)
			.await
			.map_err_ignored_gql("failed to fetch user")?
			.map_err_gql(GqlError::NotFound("User"))?;

		Ok(user.into())
	}

	async fn room(&self, ctx: &Context<'_>) -> Result<Room<G>> {
		let caches = ctx.get_req_context().loader_caches().await;

		Ok(load_room(ctx.get_global::<G>(), &caches, self.room_id_).await?.into())
	}
}

impl<G: ApiGlobal> From<database::RoomMember> for RoomMember<G> {
	fn from(value: database::RoomMember) -> Self {
		Self {
			id: to_id(value.id),
			role: value.role.as_str().to_owned(),
			joined_at: value.joined_at.into(),
			user_id_: value.user_id,
			room_id_: value.room_id,
			_phantom: PhantomData,
		}
	}
}
