use std::collections::HashMap;

use common::database::Ulid;
use common::dataloader::{DataLoader, Loader, LoaderOutput};
use sqlx::SqlitePool;

use crate::database::{self, RoomMember};

/// Every member of a room, in the order they joined.
pub struct RoomMembersByRoomLoader {
	db: SqlitePool,
}

impl RoomMembersByRoomLoader {
	pub fn new(db: SqlitePool) -> DataLoader<Self> {
		DataLoader::new(Self { db })
	}
}

impl Loader for RoomMembersByRoomLoader {
	type Error = ();
	type Key = Ulid;
	type Value = Vec<RoomMember>;

	async fn load(&self, keys: &[Self::Key]) -> LoaderOutput<Self> {
		let results: Vec<RoomMember> =
			database::select_in("SELECT * FROM room_members", "room_id", keys, "ORDER BY joined_at, id")
				.build_query_as()
				.fetch_all(&self.db)
				.await
				.map_err(|e| {
					tracing::error!(err = %e, "failed to fetch room members");
				})?;

		let mut members = keys.iter().map(|key| (*key, Vec::new())).collect::<HashMap<_, _>>();
		for member in results {
			members.entry(member.room_id).or_default().push(member);
		}

		Ok(members)
	}
}
