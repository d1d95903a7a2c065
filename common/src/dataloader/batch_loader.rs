use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{RwLock, Semaphore};
use tokio_util::sync::CancellationToken;

use super::{Loader, LoaderOutput};

pub(super) struct BatchLoader<L: Loader> {
	pub id: u64,
	pub loader: Arc<L>,
	pub keys: HashSet<L::Key>,
	pub start: tokio::time::Instant,
	pub result: Arc<RwLock<Option<LoaderOutput<L>>>>,
	pub token: CancellationToken,
}

impl<L: Loader> BatchLoader<L> {
	/// Runs the batch once a permit is available. Waiters are released when
	/// the token is cancelled, which happens even if the load panics.
	pub async fn load(self, semaphore: Arc<Semaphore>) {
		let _permit = semaphore.acquire().await.ok();
		let _drop = self.token.drop_guard();

		let keys = self.keys.into_iter().collect::<Vec<_>>();
		let result = self.loader.load(&keys).await;

		*self.result.write().await = Some(result);
	}
}
