use async_graphql::SimpleObject;

use super::message::Message;
use super::room::Room;
use super::user::User;
use crate::global::ApiGlobal;

#[derive(SimpleObject)]
pub struct AuthResponse<G: ApiGlobal> {
	pub user: User<G>,
	/// The session token, also set as the `token` cookie.
	pub token: String,
}

#[derive(SimpleObject)]
pub struct RoomResponse<G: ApiGlobal> {
	pub room: Room<G>,
}

#[derive(SimpleObject)]
pub struct MessageResponse<G: ApiGlobal> {
	pub message: Message<G>,
}
