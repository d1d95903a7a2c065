use async_graphql::{Context, Subscription, ID};
use futures_util::{Stream, StreamExt};

use super::room_events;
use crate::api::gql::error::Result;
use crate::api::gql::models::message::Message;
use crate::database;
use crate::global::ApiGlobal;
use crate::subscription::SubscriptionTopic;

pub struct MessageSubscription<G: ApiGlobal>(std::marker::PhantomData<G>);

impl<G: ApiGlobal> Default for MessageSubscription<G> {
	fn default() -> Self {
		Self(std::marker::PhantomData)
	}
}

#[Subscription]
impl<G: ApiGlobal> MessageSubscription<G> {
	/// Messages sent to a room from now on.
	async fn message_added<'ctx>(
		&self,
		ctx: &'ctx Context<'_>,
		#[graphql(desc = "Room to subscribe to.")] room_id: ID,
	) -> Result<impl Stream<Item = Result<Message<G>>> + 'ctx> {
		let events = room_events::<G, database::Message>(ctx, &room_id, SubscriptionTopic::RoomMessages).await?;

		Ok(events.map(|event| event.map(Message::from)))
	}
}
