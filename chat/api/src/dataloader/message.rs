use std::collections::HashMap;

use common::database::Ulid;
use common::dataloader::{DataLoader, Loader, LoaderOutput};
use sqlx::SqlitePool;

use crate::database::{self, Message};

/// All messages of a room, oldest first.
pub struct MessagesByRoomLoader {
	db: SqlitePool,
}

impl MessagesByRoomLoader {
	pub fn new(db: SqlitePool) -> DataLoader<Self> {
		DataLoader::new(Self { db })
	}
}

impl Loader for MessagesByRoomLoader {
	type Error = ();
	type Key = Ulid;
	type Value = Vec<Message>;

	async fn load(&self, keys: &[Self::Key]) -> LoaderOutput<Self> {
		let results: Vec<Message> = database::select_in("SELECT * FROM messages", "room_id", keys, "ORDER BY created_at, id")
			.build_query_as()
			.fetch_all(&self.db)
			.await
			.map_err(|e| {
				tracing::error!(err = %e, "failed to fetch messages by room");
			})?;

		let mut messages = keys.iter().map(|key| (*key, Vec::new())).collect::<HashMap<_, _>>();
		for message in results {
			messages.entry(message.room_id).or_default().push(message);
		}

		Ok(messages)
	}
}

pub struct MessageCountByRoomLoader {
	db: SqlitePool,
}

impl MessageCountByRoomLoader {
	pub fn new(db: SqlitePool) -> DataLoader<Self> {
		DataLoader::new(Self { db })
	}
}

impl Loader for MessageCountByRoomLoader {
	type Error = ();
	type Key = Ulid;
	type Value = i64;

	async fn load(&self, keys: &[Self::Key]) -> LoaderOutput<Self> {
		let results: Vec<(Ulid, i64)> =
			database::select_in("SELECT room_id, COUNT(*) FROM messages", "room_id", keys, "GROUP BY room_id")
				.build_query_as()
				.fetch_all(&self.db)
				.await
				.map_err(|e| {
					tracing::error!(err = %e, "failed to count messages");
				})?;

		let mut counts = keys.iter().map(|key| (*key, 0)).collect::<HashMap<_, _>>();
		counts.extend(results);

		Ok(counts)
	}
}
