use async_graphql::{InputObject, ID};

#[derive(InputObject, Debug, Clone)]
pub struct SignupInput {
	pub email: String,
	pub username: String,
	pub password: String,
}

#[derive(InputObject, Debug, Clone)]
pub struct LoginInput {
	pub email: String,
	pub password: String,
}

#[derive(InputObject, Debug, Clone)]
pub struct CreateRoomInput {
	pub name: String,
	pub description: Option<String>,
	#[graphql(default = false)]
	pub is_private: bool,
}

#[derive(InputObject, Debug, Clone)]
pub struct JoinRoomInput {
	pub room_id: ID,
}

#[derive(InputObject, Debug, Clone)]
pub struct SendMessageInput {
	pub room_id: ID,
	pub content: String,
}
