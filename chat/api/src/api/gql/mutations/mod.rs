use async_graphql::MergedObject;

use crate::global::ApiGlobal;

mod auth;
mod message;
mod room;

#[derive(MergedObject)]
/// The root mutation type which contains root level fields.
pub struct Mutation<G: ApiGlobal>(auth::AuthMutation<G>, room::RoomMutation<G>, message::MessageMutation<G>);

impl<G: ApiGlobal> Default for Mutation<G> {
	fn default() -> Self {
		Self(Default::default(), Default::default(), Default::default())
	}
}
