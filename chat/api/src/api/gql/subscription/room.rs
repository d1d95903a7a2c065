use async_graphql::{Context, Subscription, ID};
use futures_util::{Stream, StreamExt};

use super::room_events;
use crate::api::gql::error::Result;
use crate::api::gql::models::room_member::RoomMember;
use crate::database;
use crate::global::ApiGlobal;
use crate::subscription::SubscriptionTopic;

pub struct RoomSubscription<G: ApiGlobal>(std::marker::PhantomData<G>);

impl<G: ApiGlobal> Default for RoomSubscription<G> {
	fn default() -> Self {
		Self(std::marker::PhantomData)
	}
}

#[Subscription]
impl<G: ApiGlobal> RoomSubscription<G> {
	/// Users joining a room.
	async fn room_member_joined<'ctx>(
		&self,
		ctx: &'ctx Context<'_>,
		#[graphql(desc = "Room to subscribe to.")] room_id: ID,
	) -> Result<impl Stream<Item = Result<RoomMember<G>>> + 'ctx> {
		let events = room_events::<G, database::RoomMember>(ctx, &room_id, SubscriptionTopic::RoomMemberJoined).await?;

		Ok(events.map(|event| event.map(RoomMember::from)))
	}

	/// Users leaving a room.
	async fn room_member_left<'ctx>(
		&self,
		ctx: &'ctx Context<'_>,
		#[graphql(desc = "Room to subscribe to.")] room_id: ID,
	) -> Result<impl Stream<Item = Result<RoomMember<G>>> + 'ctx> {
		let events = room_events::<G, database::RoomMember>(ctx, &room_id, SubscriptionTopic::RoomMemberLeft).await?;

		Ok(events.map(|event| event.map(RoomMember::from)))
	}
}
