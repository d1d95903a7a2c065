//! In-process publish/subscribe hub backing the GraphQL subscriptions.
//!
//! A single task owns the topic table. Subscribers get a broadcast receiver
//! for their topic, and the topic is torn down once its last receiver is
//! dropped.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use bytes::Bytes;
use common::context::Context;
use common::database::Ulid;
use tokio::select;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tracing::{debug, warn};

const TOPIC_CAPACITY: usize = 64;

#[derive(thiserror::Error, Debug)]
pub enum SubscriptionManagerError {
	#[error("send error: {0}")]
	Send(#[from] mpsc::error::SendError<Event>),
	#[error("receive error: {0}")]
	Receive(#[from] oneshot::error::RecvError),
}

#[derive(Debug)]
pub enum Event {
	Subscribe {
		topic: String,
		tx: oneshot::Sender<broadcast::Receiver<Bytes>>,
	},
	Unsubscribe {
		topic: String,
	},
	Publish {
		topic: String,
		payload: Bytes,
	},
}

pub struct SubscriptionManager {
	events_tx: mpsc::UnboundedSender<Event>,
	events_rx: Mutex<mpsc::UnboundedReceiver<Event>>,
}

impl Default for SubscriptionManager {
	fn default() -> Self {
		// Unbounded so `Drop` and `publish` never have to await.
		let (events_tx, events_rx) = mpsc::unbounded_channel();

		Self {
			events_rx: Mutex::new(events_rx),
			events_tx,
		}
	}
}

pub struct SubscriberReceiver<'a> {
	topic: String,
	rx: broadcast::Receiver<Bytes>,
	manager: &'a SubscriptionManager,
}

impl Deref for SubscriberReceiver<'_> {
	type Target = broadcast::Receiver<Bytes>;

	fn deref(&self) -> &Self::Target {
		&self.rx
	}
}

impl DerefMut for SubscriberReceiver<'_> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.rx
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionTopic {
	RoomMessages(Ulid),
	RoomMemberJoined(Ulid),
	RoomMemberLeft(Ulid),
}

impl std::fmt::Display for SubscriptionTopic {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::RoomMessages(room_id) => write!(f, "room.{room_id}.messages"),
			Self::RoomMemberJoined(room_id) => write!(f, "room.{room_id}.member_joined"),
			Self::RoomMemberLeft(room_id) => write!(f, "room.{room_id}.member_left"),
		}
	}
}

impl SubscriptionManager {
	/// Dispatches events until `ctx` is done. Dropping the topic table on exit
	/// closes every subscriber stream.
	pub async fn run(&self, ctx: Context) -> Result<(), SubscriptionManagerError> {
		let mut topics = HashMap::<String, broadcast::Sender<Bytes>>::new();

		let mut events_rx = self.events_rx.lock().await;

		loop {
			let event = select! {
				event = events_rx.recv() => event,
				_ = ctx.done() => break,
			};

			// `self` holds the sender, so the channel cannot close while we run.
			let Some(event) = event else {
				break;
			};

			match event {
				Event::Subscribe { topic, tx } => {
					let rx = topics
						.entry(topic.clone())
						.or_insert_with(|| {
							debug!(topic = %topic, "creating topic");
							broadcast::channel(TOPIC_CAPACITY).0
						})
						.subscribe();

					if let Err(rx) = tx.send(rx) {
						warn!(topic = %topic, "subscriber went away before receiving its channel");
						drop(rx);

						if topics.get(&topic).is_some_and(|btx| btx.receiver_count() == 0) {
							topics.remove(&topic);
						}
					}
				}
				Event::Unsubscribe { topic } => {
					if topics.get(&topic).is_some_and(|btx| btx.receiver_count() == 0) {
						debug!(topic = %topic, "removing topic");
						topics.remove(&topic);
					}
				}
				Event::Publish { topic, payload } => {
					let Some(btx) = topics.get(&topic) else {
						debug!(topic = %topic, "no subscribers for topic");
						continue;
					};

					if btx.send(payload).is_err() {
						debug!(topic = %topic, "all subscribers left before delivery");
					}
				}
			}
		}

		Ok(())
	}

	/// Queues `payload` for every current subscriber of `topic`.
	pub fn publish(&self, topic: SubscriptionTopic, payload: impl Into<Bytes>) -> Result<(), SubscriptionManagerError> {
		self.events_tx.send(Event::Publish {
			topic: topic.to_string(),
			payload: payload.into(),
		})?;

		Ok(())
	}

	pub async fn subscribe(&self, topic: SubscriptionTopic) -> Result<SubscriberReceiver<'_>, SubscriptionManagerError> {
		let (tx, rx) = oneshot::channel();

		self.events_tx.send(Event::Subscribe {
			topic: topic.to_string(),
			tx,
		})?;

		let rx = rx.await?;

		Ok(SubscriberReceiver {
			topic: topic.to_string(),
			rx,
			manager: self,
		})
	}
}

impl Drop for SubscriberReceiver<'_> {
	fn drop(&mut self) {
		self.manager
			.events_tx
			.send(Event::Unsubscribe {
				topic: self.topic.clone(),
			})
			.ok();
	}
}
