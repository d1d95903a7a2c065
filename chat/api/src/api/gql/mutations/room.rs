use async_graphql::{Context, Object, ID};
use chrono::Utc;
use common::database::Ulid;

use crate::api::gql::error::ext::*;
use crate::api::gql::error::{GqlError, Result};
use crate::api::gql::ext::ContextExt;
use crate::api::gql::guards::{load_room, membership, require_auth};
use crate::api::gql::models::id::parse_id;
use crate::api::gql::models::inputs::{CreateRoomInput, JoinRoomInput};
use crate::api::gql::models::responses::RoomResponse;
use crate::api::gql::validators;
use crate::database::{self, RoomRole};
use crate::global::ApiGlobal;
use crate::subscription::SubscriptionTopic;

const ALREADY_MEMBER: &str = "Already a member of this room";

pub struct RoomMutation<G>(std::marker::PhantomData<G>);

impl<G: ApiGlobal> Default for RoomMutation<G> {
	fn default() -> Self {
		Self(std::marker::PhantomData)
	}
}

fn publish_member<G: ApiGlobal>(global: &G, topic: SubscriptionTopic, member: &database::RoomMember) -> Result<()> {
	let payload = serde_json::to_vec(member).map_err_gql("failed to encode room member")?;

	global
		.subscription_manager()
		.publish(topic, payload)
		.map_err_gql("failed to publish room member event")
}

#[Object]
impl<G: ApiGlobal> RoomMutation<G> {
	/// Create a room owned by the current user.
	async fn create_room(&self, ctx: &Context<'_>, input: CreateRoomInput) -> Result<RoomResponse<G>> {
		let global = ctx.get_global::<G>();
		let auth = require_auth::<G>(ctx).await?;

		let name = validators::room_name(&input.name)?;
		let description = validators::room_description(input.description.as_deref())?;
		let now = Utc::now();

		let mut tx = global.db().begin().await?;

		let room: database::Room = sqlx::query_as(
			"INSERT INTO rooms (id, name, description, is_private, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
		)
		.bind(Ulid::new())
		.bind(name.as_str())
		.bind(description)
		.bind(input.is_private)
		.bind(now)
		.bind(now)
		.fetch_one(&mut *tx)
		.await
		.map_err(|err| {
			if database::is_unique_violation(&err) {
				GqlError::invalid_input(
					"name",
					format!("Room name \"{name}\" is already taken. Please choose a different name."),
				)
			} else {
				err.into()
			}
		})?;

		sqlx::query("INSERT INTO room_members (id, user_id, room_id, role, joined_at) VALUES (?, ?, ?, ?, ?)")
			.bind(Ulid::new())
			.bind(auth.user_id())
			.bind(room.id)
			.bind(RoomRole::Owner)
			.bind(now)
			.execute(&mut *tx)
			.await?;

		tx.commit().await?;

		tracing::debug!(room_id = %room.id, user_id = %auth.user_id(), "room created");

		ctx.get_req_context()
			.loader_caches()
			.await
			.membership_changed(room.id, auth.user_id());

		Ok(RoomResponse { room: room.into() })
	}

	/// Join a room as a regular member.
	async fn join_room(&self, ctx: &Context<'_>, input: JoinRoomInput) -> Result<RoomResponse<G>> {
		let global = ctx.get_global::<G>();
		let auth = require_auth::<G>(ctx).await?;
		let room_id = parse_id("roomId", &input.room_id)?;
		let caches = ctx.get_req_context().loader_caches().await;

		let room = load_room(global, &caches, room_id).await?;

		if membership(global, &caches, room.id, auth.user_id()).await?.is_some() {
			return Err(GqlError::Forbidden(ALREADY_MEMBER).into());
		}

		let member: database::RoomMember = sqlx::query_as(
			"INSERT INTO room_members (id, user_id, room_id, role, joined_at) VALUES (?, ?, ?, ?, ?) RETURNING *",
		)
		.bind(Ulid::new())
		.bind(auth.user_id())
		.bind(room.id)
		.bind(RoomRole::Member)
		.bind(Utc::now())
		.fetch_one(global.db())
		.await
		.map_err(|err| {
			if database::is_unique_violation(&err) {
				GqlError::Forbidden(ALREADY_MEMBER)
			} else {
				err.into()
			}
		})?;

		caches.membership_changed(room.id, auth.user_id());

		publish_member(global.as_ref(), SubscriptionTopic::RoomMemberJoined(room.id), &member)?;

		Ok(RoomResponse { room: room.into() })
	}

	/// Leave a room. Owners cannot leave their own room.
	async fn leave_room(&self, ctx: &Context<'_>, #[graphql(desc = "The room to leave.")] room_id: ID) -> Result<bool> {
		let global = ctx.get_global::<G>();
		let auth = require_auth::<G>(ctx).await?;
		let room_id = parse_id("roomId", &room_id)?;
		let caches = ctx.get_req_context().loader_caches().await;

		let member = membership(global, &caches, room_id, auth.user_id())
			.await?
			.map_err_gql(GqlError::Forbidden("Not a member of this room"))?;

		if member.is_owner() {
			return Err(GqlError::Forbidden("Room owner cannot leave. Transfer ownership first.").into());
		}

		sqlx::query("DELETE FROM room_members WHERE id = ?")
			.bind(member.id)
			.execute(global.db())
			.await?;

		caches.membership_changed(room_id, auth.user_id());

		publish_member(global.as_ref(), SubscriptionTopic::RoomMemberLeft(room_id), &member)?;

		Ok(true)
	}
}
