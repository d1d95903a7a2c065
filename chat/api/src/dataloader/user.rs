use common::database::Ulid;
use common::dataloader::{DataLoader, Loader, LoaderOutput};
use sqlx::SqlitePool;

use crate::database::{self, User};

pub struct UserByIdLoader {
	db: SqlitePool,
}

impl UserByIdLoader {
	pub fn new(db: SqlitePool) -> DataLoader<Self> {
		DataLoader::new(Self { db })
	}
}

impl Loader for UserByIdLoader {
	type Error = ();
	type Key = Ulid;
	type Value = User;

	async fn load(&self, keys: &[Self::Key]) -> LoaderOutput<Self> {
		let results: Vec<Self::Value> = database::select_in("SELECT * FROM users", "id", keys, "")
			.build_query_as()
			.fetch_all(&self.db)
			.await
			.map_err(|e| {
				tracing::error!(err = %e, "failed to fetch users by id");
			})?;

		Ok(results.into_iter().map(|r| (r.id, r)).collect())
	}
}
