use chrono::{DateTime, Utc};
use common::database::Ulid;

/// Seconds between two writes of `last_used_at`.
pub const TOUCH_INTERVAL_SECS: i64 = 60;

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Session {
	/// The unique identifier for the session.
	pub id: Ulid,
	/// Foreign key to the user table.
	pub user_id: Ulid,
	/// The time the session expires.
	pub expires_at: DateTime<Utc>,
	/// The time the session was last used.
	pub last_used_at: DateTime<Utc>,
	/// The time the session was created.
	pub created_at: DateTime<Utc>,
}

impl Session {
	pub fn is_valid(&self) -> bool {
		self.expires_at > Utc::now()
	}

	/// Records that the session was used now. Writes at most once per
	/// [`TOUCH_INTERVAL_SECS`].
	pub async fn touch<'c>(self, executor: impl sqlx::SqliteExecutor<'c>) -> Result<Self, sqlx::Error> {
		let now = Utc::now();
		if now - self.last_used_at < chrono::Duration::seconds(TOUCH_INTERVAL_SECS) {
			return Ok(self);
		}

		let session = sqlx::query_as("UPDATE user_sessions SET last_used_at = ? WHERE id = ? RETURNING *")
			.bind(now)
			.bind(self.id)
			.fetch_optional(executor)
			.await?;

		Ok(session.unwrap_or(self))
	}

	/// Opens a session for `user_id` lasting `duration`.
	pub async fn create<'c>(
		executor: impl sqlx::SqliteExecutor<'c>,
		user_id: Ulid,
		duration: chrono::Duration,
	) -> Result<Self, sqlx::Error> {
		let now = Utc::now();

		sqlx::query_as(
			"INSERT INTO user_sessions (id, user_id, expires_at, last_used_at, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *",
		)
		.bind(Ulid::new())
		.bind(user_id)
		.bind(now + duration)
		.bind(now)
		.bind(now)
		.fetch_one(executor)
		.await
	}
}
