use chrono::{DateTime, Utc};
use common::database::Ulid;

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Room {
	/// The unique identifier for the room.
	pub id: Ulid,
	/// The unique name of the room.
	pub name: String,
	pub description: Option<String>,
	/// Private rooms are hidden from the room list and only readable by members.
	pub is_private: bool,
	pub created_at: DateTime<Utc>,
	/// Bumped whenever a message is sent to the room.
	pub updated_at: DateTime<Utc>,
}
