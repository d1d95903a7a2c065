use async_graphql::MergedObject;

use crate::global::ApiGlobal;

mod message;
mod room;
mod user;

#[derive(MergedObject)]
/// The root query type which contains root level fields.
pub struct Query<G: ApiGlobal>(user::UserQuery<G>, room::RoomQuery<G>, message::MessageQuery<G>);

impl<G: ApiGlobal> Default for Query<G> {
	fn default() -> Self {
		Self(Default::default(), Default::default(), Default::default())
	}
}
