use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, oneshot};
use tokio::time::Instant;

struct RawContext {
	_sender: oneshot::Sender<()>,
	deadline: Option<Instant>,
	parent: Option<Context>,
	cancel_receiver: broadcast::Receiver<()>,
}

/// Why a [`Context`] finished.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CancelReason {
	Parent,
	Deadline,
	Cancel,
}

impl Display for CancelReason {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Parent => write!(f, "Parent"),
			Self::Deadline => write!(f, "Deadline"),
			Self::Cancel => write!(f, "Cancel"),
		}
	}
}

impl RawContext {
	#[must_use]
	fn new(parent: Option<Context>, deadline: Option<Instant>) -> (Self, Handler) {
		let (sender, recv) = oneshot::channel();
		let (cancel_sender, cancel_receiver) = broadcast::channel(1);

		(
			Self {
				_sender: sender,
				deadline,
				parent,
				cancel_receiver,
			},
			Handler { recv, cancel_sender },
		)
	}

	fn done(&self) -> Pin<Box<dyn Future<Output = CancelReason> + '_ + Send>> {
		let mut recv = self.cancel_receiver.resubscribe();
		Box::pin(async move {
			let parent = async {
				match &self.parent {
					Some(parent) => {
						parent.done().await;
					}
					None => std::future::pending().await,
				}
			};

			let deadline = async {
				match self.deadline {
					Some(deadline) => tokio::time::sleep_until(deadline).await,
					None => std::future::pending().await,
				}
			};

			tokio::select! {
				_ = parent => CancelReason::Parent,
				_ = deadline => CancelReason::Deadline,
				_ = recv.recv() => CancelReason::Cancel,
			}
		})
	}

	fn is_done(&self) -> bool {
		let mut recv = self.cancel_receiver.resubscribe();

		matches!(recv.try_recv(), Err(TryRecvError::Closed))
			|| self.deadline.is_some_and(|deadline| deadline <= Instant::now())
			|| self.parent.as_ref().is_some_and(Context::is_done)
	}
}

/// The owning side of a [`Context`].
///
/// Dropping or cancelling the handler cancels every clone of the context,
/// `cancel` then waits until all those clones have been dropped.
pub struct Handler {
	recv: oneshot::Receiver<()>,
	cancel_sender: broadcast::Sender<()>,
}

impl Handler {
	/// Resolves once every clone of the context has been dropped.
	pub async fn done(&mut self) {
		let _ = (&mut self.recv).await;
	}

	pub async fn cancel(self) {
		drop(self.cancel_sender);

		let _ = self.recv.await;
	}
}

#[derive(Clone)]
pub struct Context(Arc<RawContext>);

impl From<RawContext> for Context {
	fn from(ctx: RawContext) -> Self {
		Self(Arc::new(ctx))
	}
}

impl Context {
	pub fn new() -> (Self, Handler) {
		let (ctx, handler) = RawContext::new(None, None);
		(ctx.into(), handler)
	}

	pub fn with_deadline(deadline: Instant) -> (Self, Handler) {
		let (ctx, handler) = RawContext::new(None, Some(deadline));
		(ctx.into(), handler)
	}

	pub fn with_timeout(timeout: std::time::Duration) -> (Self, Handler) {
		Self::with_deadline(Instant::now() + timeout)
	}

	pub fn with_parent(parent: Context, deadline: Option<Instant>) -> (Self, Handler) {
		let (ctx, handler) = RawContext::new(Some(parent), deadline);
		(ctx.into(), handler)
	}

	pub async fn done(&self) -> CancelReason {
		self.0.done().await
	}

	/// Non-blocking check of whether [`Context::done`] would resolve immediately.
	pub fn is_done(&self) -> bool {
		self.0.is_done()
	}
}
