use std::collections::HashMap;

use common::database::Ulid;
use common::dataloader::{DataLoader, Loader, LoaderOutput};
use sqlx::SqlitePool;

use crate::database::{self, Room};

pub struct RoomByIdLoader {
	db: SqlitePool,
}

impl RoomByIdLoader {
	pub fn new(db: SqlitePool) -> DataLoader<Self> {
		DataLoader::new(Self { db })
	}
}

impl Loader for RoomByIdLoader {
	type Error = ();
	type Key = Ulid;
	type Value = Room;

	async fn load(&self, keys: &[Self::Key]) -> LoaderOutput<Self> {
		let results: Vec<Self::Value> = database::select_in("SELECT * FROM rooms", "id", keys, "")
			.build_query_as()
			.fetch_all(&self.db)
			.await
			.map_err(|e| {
				tracing::error!(err = %e, "failed to fetch rooms by id");
			})?;

		Ok(results.into_iter().map(|r| (r.id, r)).collect())
	}
}

#[derive(sqlx::FromRow)]
struct MemberRoom {
	member_user_id: Ulid,
	#[sqlx(flatten)]
	room: Room,
}

/// The rooms a user is a member of, most recently active first.
pub struct RoomsByUserLoader {
	db: SqlitePool,
}

impl RoomsByUserLoader {
	pub fn new(db: SqlitePool) -> DataLoader<Self> {
		DataLoader::new(Self { db })
	}
}

impl Loader for RoomsByUserLoader {
	type Error = ();
	type Key = Ulid;
	type Value = Vec<Room>;

	async fn load(&self, keys: &[Self::Key]) -> LoaderOutput<Self> {
		let results: Vec<MemberRoom> = database::select_in(
			"SELECT rooms.*, room_members.user_id AS member_user_id FROM rooms INNER JOIN room_members ON room_members.room_id = rooms.id",
			"room_members.user_id",
			keys,
			"ORDER BY rooms.updated_at DESC, rooms.id DESC",
		)
		.build_query_as()
		.fetch_all(&self.db)
		.await
		.map_err(|e| {
			tracing::error!(err = %e, "failed to fetch rooms by user");
		})?;

		let mut rooms = keys.iter().map(|key| (*key, Vec::new())).collect::<HashMap<_, _>>();
		for row in results {
			rooms.entry(row.member_user_id).or_default().push(row.room);
		}

		Ok(rooms)
	}
}
