use chrono::{DateTime, Utc};
use common::database::Ulid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RoomRole {
	Owner,
	#[default]
	Member,
}

impl RoomRole {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Owner => "owner",
			Self::Member => "member",
		}
	}
}

#[derive(Debug, Clone, Default, sqlx::FromRow, serde::Serialize, serde::Deserialize)]
pub struct RoomMember {
	/// The unique identifier for the membership.
	pub id: Ulid,
	pub user_id: Ulid,
	pub room_id: Ulid,
	pub role: RoomRole,
	/// The time the user joined the room.
	pub joined_at: DateTime<Utc>,
}

impl RoomMember {
	pub fn is_owner(&self) -> bool {
		self.role == RoomRole::Owner
	}
}
