use async_graphql::{Context, MergedSubscription, ID};
use async_stream::stream;
use common::database::Ulid;
use futures_util::Stream;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast::error::RecvError;

use super::error::ext::*;
use super::error::Result;
use super::ext::ContextExt;
use super::guards::{is_current_member, readable_room};
use super::models::id::parse_id;
use crate::database;
use crate::global::ApiGlobal;
use crate::subscription::SubscriptionTopic;

mod message;
mod room;

#[derive(MergedSubscription)]
pub struct Subscription<G: ApiGlobal>(message::MessageSubscription<G>, room::RoomSubscription<G>);

impl<G: ApiGlobal> Default for Subscription<G> {
	fn default() -> Self {
		Self(Default::default(), Default::default())
	}
}

/// An event published to a room topic.
pub trait RoomEvent: DeserializeOwned + Send + 'static {
	fn room_id(&self) -> Ulid;
}

impl RoomEvent for database::Message {
	fn room_id(&self) -> Ulid {
		self.room_id
	}
}

impl RoomEvent for database::RoomMember {
	fn room_id(&self) -> Ulid {
		self.room_id
	}
}

/// Streams the events published to the `topic` of a room the caller may read,
/// dropping any event that belongs to another room. A private room stream ends
/// as soon as the caller stops being a member.
async fn room_events<'ctx, G: ApiGlobal, E: RoomEvent>(
	ctx: &'ctx Context<'_>,
	room_id: &ID,
	topic: fn(Ulid) -> SubscriptionTopic,
) -> Result<impl Stream<Item = Result<E>> + 'ctx> {
	let global = ctx.get_global::<G>();
	let room_id = parse_id("roomId", room_id)?;
	let caches = ctx.get_req_context().loader_caches().await;

	let room = readable_room::<G>(ctx, &caches, room_id).await?;

	let topic = topic(room.id);
	let mut events = global
		.subscription_manager()
		.subscribe(topic)
		.await
		.map_err_gql("failed to subscribe")?;

	Ok(stream!({
		loop {
			let payload = match events.recv().await {
				Ok(payload) => payload,
				Err(RecvError::Lagged(skipped)) => {
					tracing::warn!(%topic, skipped, "subscriber lagged behind");
					continue;
				}
				Err(RecvError::Closed) => break,
			};

			match serde_json::from_slice::<E>(&payload).map_err_gql("failed to decode event") {
				Ok(event) if event.room_id() == room.id => {
					if room.is_private {
						match is_current_member::<G>(ctx, room.id).await {
							Ok(true) => {}
							Ok(false) => {
								tracing::debug!(%topic, "subscriber lost access to the room");
								break;
							}
							Err(err) => {
								yield Err(err);
								break;
							}
						}
					}

					yield Ok(event);
				}
				Ok(_) => {}
				Err(err) => {
					yield Err(err);
				}
			}
		}
	}))
}
