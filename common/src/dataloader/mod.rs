//! Batched key lookups.
//!
//! Every call to [`DataLoader::load`] made within a short window (5ms by
//! default) is merged into one call to [`Loader::load`]. Results can
//! additionally be kept in a caller supplied [`Cache`], which is how the API
//! de-duplicates identical lookups within a single request.

mod batch_loader;
mod cache;
mod types;
mod utils;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use batch_loader::BatchLoader;
pub use cache::{Cache, HashMapCache, NoCache, SharedCache};
use tokio::sync::{mpsc, Mutex, RwLock};
pub use types::LoaderOutput;
use types::{BatchState, DataLoaderInner, DataLoaderInnerHolder};

use self::utils::new_auto_loader;

pub trait Loader: Send + Sync + 'static {
	type Key: Eq + std::hash::Hash + Clone + Sync + Send;
	type Value: Clone + Sync + Send;
	type Error: Clone + Sync + Send;

	fn load(&self, keys: &[Self::Key]) -> impl std::future::Future<Output = LoaderOutput<Self>> + Send;
}

pub struct DataLoader<L: Loader> {
	batch_id: AtomicU64,
	loader: Arc<L>,
	max_batch_size: usize,
	inner: DataLoaderInnerHolder<L>,
	new_batch: mpsc::Sender<()>,
	auto_loader: tokio::task::AbortHandle,
}

impl<L: Loader + Default> Default for DataLoader<L> {
	fn default() -> Self {
		Self::new(L::default())
	}
}

impl<L: Loader> Drop for DataLoader<L> {
	fn drop(&mut self) {
		self.auto_loader.abort();
	}
}

impl<L: Loader> DataLoader<L> {
	pub fn new(loader: L) -> Self {
		Self::with_concurrency_limit(loader, 10)
	}

	pub fn with_concurrency_limit(loader: L, concurrency_limit: usize) -> Self {
		let duration = Duration::from_millis(5);

		let (auto_loader_tx, auto_loader_rx) = mpsc::channel(1);

		let inner = Arc::new(Mutex::new(DataLoaderInner {
			active_batch: None,
			semaphore: Arc::new(tokio::sync::Semaphore::new(concurrency_limit)),
		}));

		Self {
			batch_id: AtomicU64::new(0),
			loader: Arc::new(loader),
			max_batch_size: 1000,
			new_batch: auto_loader_tx,
			auto_loader: new_auto_loader(auto_loader_rx, duration, inner.clone()),
			inner,
		}
	}

	pub fn set_max_batch_size(mut self, max_batch_size: usize) -> Self {
		self.max_batch_size = max_batch_size.max(1);
		self
	}

	pub fn set_duration(mut self, duration: Duration) -> Self {
		let (auto_loader_tx, auto_loader_rx) = mpsc::channel(1);

		self.auto_loader.abort();
		self.new_batch = auto_loader_tx;
		self.auto_loader = new_auto_loader(auto_loader_rx, duration, self.inner.clone());

		self
	}

	/// Adds the keys to the active batch, spawning batches as they fill up,
	/// and returns a handle to every batch the keys ended up in.
	async fn extend_loader(&self, keys: impl Iterator<Item = L::Key>) -> Vec<BatchState<L>> {
		let mut inner = self.inner.lock().await;

		let mut batches = HashMap::<u64, BatchState<L>>::new();

		for key in keys {
			let batch = inner.active_batch.get_or_insert_with(|| {
				self.new_batch.try_send(()).ok();

				BatchLoader {
					id: self.batch_id.fetch_add(1, Ordering::SeqCst),
					loader: self.loader.clone(),
					keys: HashSet::new(),
					start: tokio::time::Instant::now(),
					result: Arc::new(RwLock::new(None)),
					token: tokio_util::sync::CancellationToken::new(),
				}
			});

			batch.keys.insert(key);

			batches
				.entry(batch.id)
				.or_insert_with(|| (batch.result.clone(), batch.token.clone().cancelled_owned()));

			if batch.keys.len() >= self.max_batch_size {
				if let Some(batch) = inner.active_batch.take() {
					tokio::spawn(batch.load(inner.semaphore.clone()));
				}
			}
		}

		batches.into_values().collect()
	}

	#[inline(always)]
	pub async fn load_many(&self, keys: impl Iterator<Item = L::Key>) -> LoaderOutput<L> {
		self.load_many_with_cache(NoCache, keys).await
	}

	pub async fn load_many_with_cache<C: Cache<L>>(&self, mut cache: C, keys: impl Iterator<Item = L::Key>) -> LoaderOutput<L> {
		let mut results = HashMap::new();

		let mut key_set = HashSet::new();
		for key in keys {
			if let Some(value) = cache.get(&key) {
				results.insert(key, value);
			} else {
				key_set.insert(key);
			}
		}

		if key_set.is_empty() {
			return Ok(results);
		}

		let batches = self.extend_loader(key_set.iter().cloned()).await;

		for (result, done) in batches {
			done.await;

			// Only one waiter left means we can take the result without cloning it.
			match Arc::try_unwrap(result) {
				Ok(result) => {
					let result = result.into_inner().expect("batch finished without a result")?;
					for (key, value) in result {
						if key_set.contains(&key) {
							cache.insert(&key, &value);
							results.insert(key, value);
						}
					}
				}
				Err(result) => {
					let result = result.read().await;
					let result = result
						.as_ref()
						.expect("batch finished without a result")
						.as_ref()
						.map_err(Clone::clone)?;

					for (key, value) in result.iter().filter(|(key, _)| key_set.contains(*key)) {
						cache.insert(key, value);
						results.insert(key.clone(), value.clone());
					}
				}
			}
		}

		Ok(results)
	}

	#[inline(always)]
	pub async fn load_with_cache<C: Cache<L>>(&self, cache: C, key: L::Key) -> Result<Option<L::Value>, L::Error> {
		Ok(self
			.load_many_with_cache(cache, std::iter::once(key.clone()))
			.await?
			.remove(&key))
	}

	#[inline(always)]
	pub async fn load(&self, key: L::Key) -> Result<Option<L::Value>, L::Error> {
		self.load_with_cache(NoCache, key).await
	}
}
