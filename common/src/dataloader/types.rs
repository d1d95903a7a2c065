use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio_util::sync::WaitForCancellationFutureOwned;

use super::batch_loader::BatchLoader;
use super::Loader;

pub(super) struct DataLoaderInner<L: Loader> {
	pub active_batch: Option<BatchLoader<L>>,
	pub semaphore: Arc<Semaphore>,
}

#[allow(type_alias_bounds)]
pub type LoaderOutput<L: Loader> = Result<HashMap<L::Key, L::Value>, L::Error>;

#[allow(type_alias_bounds)]
pub(super) type BatchState<L: Loader> = (Arc<RwLock<Option<LoaderOutput<L>>>>, WaitForCancellationFutureOwned);

#[allow(type_alias_bounds)]
pub(super) type DataLoaderInnerHolder<L: Loader> = Arc<Mutex<DataLoaderInner<L>>>;
