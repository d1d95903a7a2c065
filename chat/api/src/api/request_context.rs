use std::ops::Deref;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::auth::{AuthData, AuthError};
use crate::dataloader::LoaderCaches;
use crate::global::ApiGlobal;

#[derive(Default, Clone)]
pub struct ContextData {
	pub auth: Option<AuthData>,
	pub websocket: bool,
	pub caches: LoaderCaches,
}

/// State shared by every resolver of a request, or of a websocket connection.
#[derive(Default, Clone)]
pub struct RequestContext(Arc<RwLock<ContextData>>);

impl RequestContext {
	pub async fn set_auth(&self, data: AuthData) {
		let mut guard = self.0.write().await;
		guard.auth = Some(data);
	}

	pub async fn reset_auth(&self) {
		let mut guard = self.0.write().await;
		guard.auth = None;
	}

	pub async fn websocket(&self) {
		let mut guard = self.0.write().await;
		guard.websocket = true;
	}

	pub async fn is_websocket(&self) -> bool {
		self.0.read().await.websocket
	}

	/// Loader caches to resolve with. A websocket connection lives for many
	/// operations, so it gets empty caches every time.
	pub async fn loader_caches(&self) -> LoaderCaches {
		let guard = self.0.read().await;
		if guard.websocket {
			LoaderCaches::default()
		} else {
			guard.caches.clone()
		}
	}

	pub async fn auth<G: ApiGlobal>(&self, global: &Arc<G>) -> Result<Option<AuthData>, AuthError> {
		let inner = self.0.read().await.deref().clone();
		match inner.auth {
			Some(auth) => {
				if !auth.session.is_valid() {
					Err(AuthError::SessionExpired)
				} else if inner.websocket {
					let auth = match AuthData::from_session_id(global, &LoaderCaches::default(), auth.session.id).await {
						Ok(auth) => auth,
						Err(AuthError::SessionExpired | AuthError::UserNotFound) => {
							self.reset_auth().await;
							return Err(AuthError::SessionExpired);
						}
						Err(err) => return Err(err),
					};

					self.set_auth(auth.clone()).await;
					Ok(Some(auth))
				} else {
					Ok(Some(auth))
				}
			}
			None => Ok(None),
		}
	}

	/// Like [`RequestContext::auth`], but a missing user is an error.
	pub async fn auth_required<G: ApiGlobal>(&self, global: &Arc<G>) -> Result<AuthData, AuthError> {
		self.auth(global).await?.ok_or(AuthError::NotLoggedIn)
	}
}
