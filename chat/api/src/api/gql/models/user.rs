use std::marker::PhantomData;

use async_graphql::{ComplexObject, Context, SimpleObject, ID};
use common::database::Ulid;

use super::date::DateRFC3339;
use super::id::to_id;
use super::room::Room;
use crate::api::gql::error::ext::*;
use crate::api::gql::error::Result;
use crate::api::gql::ext::ContextExt;
use crate::api::gql::guards::auth_guard;
use crate::database;
use crate::global::ApiGlobal;

#[derive(SimpleObject)]
#[graphql(complex)]
pub struct User<G: ApiGlobal> {
	pub id: ID,
	pub username: String,
	pub created_at: DateRFC3339,
	pub updated_at: DateRFC3339,

	// Private fields
	#[graphql(skip)]
	pub id_: Ulid,
	#[graphql(skip)]
	pub email_: String,
	#[graphql(skip)]
	pub _phantom: PhantomData<G>,
}

#[ComplexObject]
impl<G: ApiGlobal> User<G> {
	async fn email(&self, ctx: &Context<'_>) -> Result<&str> {
		auth_guard::<_, G>(ctx, "email", self.email_.as_str(), self.id_).await
	}

	/// Rooms the user is a member of, most recently active first.
	async fn rooms(&self, ctx: &Context<'_>) -> Result<Vec<Room<G>>> {
		auth_guard::<_, G>(ctx, "rooms", (), self.id_).await?;

		let global = ctx.get_global::<G>();
		let caches = ctx.get_req_context().loader_caches().await;

		let rooms = global
			.rooms_by_user_loader()
			.load_with_cache(&caches.rooms_by_user, self.id_)
			.await
			.map_err_ignored_gql("failed to fetch rooms")?
			.unwrap_or_default();

		Ok(rooms.into_iter().map(Into::into).collect())
	}
}

impl<G: ApiGlobal> From<database::User> for User<G> {
	fn from(value: database::User) -> Self {
		Self {
			id: to_id(value.id),
			username: value.username,
			created_at: value.created_at.into(),
			updated_at: value.updated_at.into(),
			id_: value.id,
			email_: value.email,
			_phantom: PhantomData,
		}
	}
}
