use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Loader;

pub trait Cache<L: Loader> {
	fn contains_key(&self, key: &L::Key) -> bool;
	fn get(&self, key: &L::Key) -> Option<L::Value>;
	fn insert(&mut self, key: &L::Key, value: &L::Value);
	fn clear(&mut self) {}
	fn len(&self) -> usize;
	fn delete(&mut self, key: &L::Key) -> Option<L::Value>;
	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl<L: Loader, T: Cache<L>> Cache<L> for &mut T {
	#[inline(always)]
	fn contains_key(&self, key: &L::Key) -> bool {
		(**self).contains_key(key)
	}

	#[inline(always)]
	fn get(&self, key: &L::Key) -> Option<L::Value> {
		(**self).get(key)
	}

	#[inline(always)]
	fn insert(&mut self, key: &L::Key, value: &L::Value) {
		(**self).insert(key, value)
	}

	#[inline(always)]
	fn clear(&mut self) {
		(**self).clear()
	}

	#[inline(always)]
	fn len(&self) -> usize {
		(**self).len()
	}

	#[inline(always)]
	fn delete(&mut self, key: &L::Key) -> Option<L::Value> {
		(**self).delete(key)
	}
}

#[derive(Default, Clone, Debug, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoCache;

impl<L: Loader> Cache<L> for NoCache {
	#[inline(always)]
	fn contains_key(&self, _: &L::Key) -> bool {
		false
	}

	#[inline(always)]
	fn get(&self, _: &L::Key) -> Option<L::Value> {
		None
	}

	#[inline(always)]
	fn insert(&mut self, _: &L::Key, _: &L::Value) {}

	#[inline(always)]
	fn len(&self) -> usize {
		0
	}

	#[inline(always)]
	fn delete(&mut self, _: &L::Key) -> Option<L::Value> {
		None
	}
}

pub struct HashMapCache<L: Loader>(HashMap<L::Key, L::Value>);

impl<L: Loader> Default for HashMapCache<L> {
	#[inline(always)]
	fn default() -> Self {
		Self(HashMap::new())
	}
}

impl<L: Loader> Clone for HashMapCache<L> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl<L: Loader> Cache<L> for HashMapCache<L> {
	#[inline(always)]
	fn contains_key(&self, key: &L::Key) -> bool {
		self.0.contains_key(key)
	}

	#[inline(always)]
	fn get(&self, key: &L::Key) -> Option<L::Value> {
		self.0.get(key).cloned()
	}

	#[inline(always)]
	fn insert(&mut self, key: &L::Key, value: &L::Value) {
		self.0.insert(key.clone(), value.clone());
	}

	#[inline(always)]
	fn clear(&mut self) {
		self.0.clear();
	}

	#[inline(always)]
	fn len(&self) -> usize {
		self.0.len()
	}

	#[inline(always)]
	fn delete(&mut self, key: &L::Key) -> Option<L::Value> {
		self.0.remove(key)
	}
}

/// A cache behind a shared lock, cheap to clone and hand to concurrent
/// resolvers. Every clone sees the same entries.
#[derive(Debug)]
pub struct SharedCache<C>(Arc<RwLock<C>>);

impl<C> Clone for SharedCache<C> {
	#[inline(always)]
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl<C: Default> Default for SharedCache<C> {
	#[inline(always)]
	fn default() -> Self {
		Self::new(C::default())
	}
}

impl<C> SharedCache<C> {
	#[inline(always)]
	pub fn new(cache: C) -> Self {
		Self(Arc::new(RwLock::new(cache)))
	}

	fn read(&self) -> RwLockReadGuard<'_, C> {
		self.0.read().unwrap_or_else(PoisonError::into_inner)
	}

	fn write(&self) -> RwLockWriteGuard<'_, C> {
		self.0.write().unwrap_or_else(PoisonError::into_inner)
	}
}

macro_rules! impl_shared_cache {
	($ty:ty) => {
		impl<L: Loader, C: Cache<L>> Cache<L> for $ty {
			#[inline(always)]
			fn contains_key(&self, key: &L::Key) -> bool {
				self.read().contains_key(key)
			}

			#[inline(always)]
			fn get(&self, key: &L::Key) -> Option<L::Value> {
				self.read().get(key)
			}

			#[inline(always)]
			fn insert(&mut self, key: &L::Key, value: &L::Value) {
				self.write().insert(key, value)
			}

			#[inline(always)]
			fn clear(&mut self) {
				self.write().clear()
			}

			#[inline(always)]
			fn len(&self) -> usize {
				self.read().len()
			}

			#[inline(always)]
			fn delete(&mut self, key: &L::Key) -> Option<L::Value> {
				self.write().delete(key)
			}
		}
	};
}

impl_shared_cache!(SharedCache<C>);
impl_shared_cache!(&SharedCache<C>);
