use async_graphql::{Context, Object, ID};

use crate::api::gql::error::ext::*;
use crate::api::gql::error::Result;
use crate::api::gql::ext::ContextExt;
use crate::api::gql::guards::{readable_room, require_auth};
use crate::api::gql::models::id::parse_id;
use crate::api::gql::models::room::Room;
use crate::database;
use crate::global::ApiGlobal;

pub struct RoomQuery<G>(std::marker::PhantomData<G>);

impl<G: ApiGlobal> Default for RoomQuery<G> {
	fn default() -> Self {
		Self(std::marker::PhantomData)
	}
}

#[Object]
impl<G: ApiGlobal> RoomQuery<G> {
	/// All public rooms, most recently active first.
	async fn rooms(&self, ctx: &Context<'_>) -> Result<Vec<Room<G>>> {
		let global = ctx.get_global::<G>();

		let rooms: Vec<database::Room> =
			sqlx::query_as("SELECT * FROM rooms WHERE is_private = FALSE ORDER BY updated_at DESC, id DESC")
				.fetch_all(global.db())
				.await?;

		Ok(rooms.into_iter().map(Into::into).collect())
	}

	/// A single room. Private rooms are only visible to their members.
	async fn room(&self, ctx: &Context<'_>, #[graphql(desc = "The id of the room.")] id: ID) -> Result<Option<Room<G>>> {
		let id = parse_id("id", &id)?;
		let caches = ctx.get_req_context().loader_caches().await;

		Ok(Some(readable_room::<G>(ctx, &caches, id).await?.into()))
	}

	/// The rooms the current user is a member of.
	async fn my_rooms(&self, ctx: &Context<'_>) -> Result<Vec<Room<G>>> {
		let global = ctx.get_global::<G>();
		let auth = require_auth::<G>(ctx).await?;
		let caches = ctx.get_req_context().loader_caches().await;

		let rooms = global
			.rooms_by_user_loader()
			.load_with_cache(&caches.rooms_by_user, auth.user_id())
			.await
			.map_err_ignored_gql("failed to fetch rooms")?
			.unwrap_or_default();

		Ok(rooms.into_iter().map(Into::into).collect())
	}
}
