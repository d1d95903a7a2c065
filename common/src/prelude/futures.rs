use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::Timeout;

use crate::context::Context;

pub trait FutureTimeout: Future {
	#[inline(always)]
	fn timeout(self, duration: Duration) -> Timeout<Self>
	where
		Self: Sized,
	{
		tokio::time::timeout(duration, self)
	}
}

impl<F: Future> FutureTimeout for F {}

/// Races a future against a [`Context`], yielding `None` if the context
/// finishes first.
pub trait FutureContext: Future {
	fn with_context(self, ctx: Context) -> Pin<Box<dyn Future<Output = Option<Self::Output>> + Send>>
	where
		Self: Sized + Send + 'static,
		Self::Output: Send + 'static,
	{
		Box::pin(async move {
			tokio::select! {
				output = self => Some(output),
				_ = ctx.done() => None,
			}
		})
	}
}

impl<F: Future> FutureContext for F {}
