use chrono::{DateTime, Utc};
use common::database::Ulid;

#[derive(Debug, Clone, Default, sqlx::FromRow, serde::Serialize, serde::Deserialize)]
pub struct Message {
	/// The unique identifier for the message.
	pub id: Ulid,
	pub content: String,
	/// The user who sent the message.
	pub user_id: Ulid,
	/// The room the message was sent to.
	pub room_id: Ulid,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}
