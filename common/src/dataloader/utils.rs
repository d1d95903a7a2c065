use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use super::types::DataLoaderInnerHolder;
use super::Loader;

/// Spawns the task that flushes a batch once it has been open for `duration`.
///
/// A message on `new_batch` means a batch was opened. The task then sleeps
/// until the deadline of whatever batch is active and, if that batch is still
/// the active one, starts loading it.
pub(super) fn new_auto_loader<L: Loader>(
	mut new_batch: mpsc::Receiver<()>,
	duration: Duration,
	inner: DataLoaderInnerHolder<L>,
) -> AbortHandle {
	tokio::spawn(async move {
		while new_batch.recv().await.is_some() {
			let Some((id, start)) = inner.lock().await.active_batch.as_ref().map(|batch| (batch.id, batch.start)) else {
				continue;
			};

			tokio::time::sleep_until(start + duration).await;

			let mut inner = inner.lock().await;
			if inner.active_batch.as_ref().is_some_and(|batch| batch.id == id) {
				if let Some(batch) = inner.active_batch.take() {
					tokio::spawn(batch.load(inner.semaphore.clone()));
				}
			}
		}
	})
	.abort_handle()
}
