use common::database::Ulid;
use common::dataloader::{DataLoader, Loader, LoaderOutput};
use sqlx::SqlitePool;

use crate::database::{self, Session};

pub struct SessionByIdLoader {
	db: SqlitePool,
}

impl SessionByIdLoader {
	pub fn new(db: SqlitePool) -> DataLoader<Self> {
		DataLoader::new(Self { db })
	}
}

impl Loader for SessionByIdLoader {
	type Error = ();
	type Key = Ulid;
	type Value = Session;

	async fn load(&self, keys: &[Self::Key]) -> LoaderOutput<Self> {
		let results: Vec<Self::Value> = database::select_in("SELECT * FROM user_sessions", "id", keys, "")
			.build_query_as()
			.fetch_all(&self.db)
			.await
			.map_err(|e| {
				tracing::error!(err = %e, "failed to fetch sessions");
			})?;

		Ok(results.into_iter().map(|r| (r.id, r)).collect())
	}
}
