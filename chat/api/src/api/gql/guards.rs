use std::sync::Arc;

use async_graphql::Context;
use common::database::Ulid;

use super::error::ext::*;
use super::error::{GqlError, Result};
use super::ext::ContextExt;
use crate::api::auth::{AuthData, AuthError};
use crate::dataloader::LoaderCaches;
use crate::database::{Room, RoomMember};
use crate::global::ApiGlobal;

pub const ACCESS_DENIED: &str = "Access denied to this room";

// async-graphql field guards cannot be generic over the global state, so the
// checks are plain functions called from the resolvers.

/// Only lets the user `user_id` see `field_value`.
pub async fn auth_guard<T, G: ApiGlobal>(
	ctx: &Context<'_>,
	field_name: &'static str,
	field_value: T,
	user_id: Ulid,
) -> Result<T> {
	let auth = require_auth::<G>(ctx).await?;

	if auth.user_id() == user_id {
		return Ok(field_value);
	}

	Err(GqlError::Unauthorized { field: field_name }.into())
}

pub async fn require_auth<G: ApiGlobal>(ctx: &Context<'_>) -> Result<AuthData> {
	let global = ctx.get_global::<G>();

	Ok(ctx.get_req_context().auth_required(global).await?)
}

pub async fn load_room<G: ApiGlobal>(global: &Arc<G>, caches: &LoaderCaches, room_id: Ulid) -> Result<Room> {
	global
		.room_by_id_loader()
		.load_with_cache(&caches.room_by_id, room_id)
		.await
		.map_err_ignored_gql("failed to fetch room")?
		.map_err_gql(GqlError::NotFound("Room"))
}

pub async fn membership<G: ApiGlobal>(
	global: &Arc<G>,
	caches: &LoaderCaches,
	room_id: Ulid,
	user_id: Ulid,
) -> Result<Option<RoomMember>> {
	let members = global
		.room_members_by_room_loader()
		.load_with_cache(&caches.room_members_by_room, room_id)
		.await
		.map_err_ignored_gql("failed to fetch room members")?
		.unwrap_or_default();

	Ok(members.into_iter().find(|member| member.user_id == user_id))
}

/// Loads a room the caller is allowed to read. Public rooms are readable by
/// anyone, private rooms only by their members.
pub async fn readable_room<G: ApiGlobal>(ctx: &Context<'_>, caches: &LoaderCaches, room_id: Ulid) -> Result<Room> {
	let global = ctx.get_global::<G>();
	let room = load_room(global, caches, room_id).await?;

	if !room.is_private {
		return Ok(room);
	}

	let auth = ctx
		.get_req_context()
		.auth(global)
		.await?
		.ok_or(AuthError::NotLoggedIn)?;

	match membership(global, caches, room.id, auth.user_id()).await? {
		Some(_) => Ok(room),
		None => Err(GqlError::Forbidden(ACCESS_DENIED).into()),
	}
}

/// Whether the caller is a member of `room_id` right now, bypassing any cached
/// membership. An expired session counts as not being a member.
pub async fn is_current_member<G: ApiGlobal>(ctx: &Context<'_>, room_id: Ulid) -> Result<bool> {
	let global = ctx.get_global::<G>();

	let auth = match ctx.get_req_context().auth(global).await {
		Ok(Some(auth)) => auth,
		Ok(None) | Err(AuthError::SessionExpired) => return Ok(false),
		Err(err) => return Err(err.into()),
	};

	Ok(membership(global, &LoaderCaches::default(), room_id, auth.user_id())
		.await?
		.is_some())
}

/// The caller's membership of `room_id`, failing when there is none.
pub async fn require_membership<G: ApiGlobal>(
	global: &Arc<G>,
	caches: &LoaderCaches,
	room_id: Ulid,
	user_id: Ulid,
) -> Result<RoomMember> {
	membership(global, caches, room_id, user_id)
		.await?
		.map_err_gql(GqlError::Forbidden(ACCESS_DENIED))
}
