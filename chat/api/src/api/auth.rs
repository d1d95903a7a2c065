use std::sync::Arc;

use common::database::Ulid;
use common::global::GlobalDb;
use common::http::RouteError;
use hyper::{header, HeaderMap, StatusCode};

use super::error::ApiError;
use crate::dataloader::LoaderCaches;
use crate::database::{Session, User};
use crate::global::ApiGlobal;

/// Name of the cookie carrying the session token.
pub const TOKEN_COOKIE: &str = "token";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
	#[error("Not authenticated")]
	NotLoggedIn,
	#[error("Invalid credentials")]
	InvalidCredentials,
	#[error("Invalid token")]
	InvalidToken,
	#[error("Session expired")]
	SessionExpired,
	#[error("User not found")]
	UserNotFound,
	#[error("failed to fetch user")]
	FetchUser,
	#[error("failed to fetch session")]
	FetchSession,
	#[error("failed to update session")]
	UpdateSession,
}

impl AuthError {
	/// Whether the failure is ours rather than the caller's.
	pub fn is_internal(&self) -> bool {
		matches!(self, Self::FetchUser | Self::FetchSession | Self::UpdateSession)
	}
}

impl From<AuthError> for RouteError<ApiError> {
	fn from(value: AuthError) -> Self {
		RouteError::from(match &value {
			AuthError::FetchUser => (StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch user"),
			AuthError::FetchSession => (StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch session"),
			AuthError::UpdateSession => (StatusCode::INTERNAL_SERVER_ERROR, "failed to update session"),
			_ => (StatusCode::UNAUTHORIZED, "unauthorized"),
		})
		.with_source(Some(ApiError::Auth(value)))
	}
}

#[derive(Debug, Clone)]
pub struct AuthData {
	pub session: Session,
	pub user: User,
}

impl AuthData {
	pub fn user_id(&self) -> Ulid {
		self.user.id
	}

	/// Resolves a session id to a live session and its user.
	pub async fn from_session_id<G: ApiGlobal>(
		global: &Arc<G>,
		caches: &LoaderCaches,
		session_id: Ulid,
	) -> Result<Self, AuthError> {
		let session = global
			.session_by_id_loader()
			.load_with_cache(&caches.session_by_id, session_id)
			.await
			.map_err(|_| AuthError::FetchSession)?
			.and_then(|s| s.is_valid().then_some(s))
			.ok_or(AuthError::SessionExpired)?;

		let user = global
			.user_by_id_loader()
			.load_with_cache(&caches.user_by_id, session.user_id)
			.await
			.map_err(|_| AuthError::FetchUser)?
			.ok_or(AuthError::UserNotFound)?;

		Ok(Self { session, user })
	}

	/// Marks the session as used.
	pub async fn touch<G: ApiGlobal>(mut self, global: &Arc<G>) -> Result<Self, AuthError> {
		let session_id = self.session.id;
		self.session = self.session.touch(global.db()).await.map_err(|err| {
			tracing::error!(error = %err, %session_id, "failed to update session");
			AuthError::UpdateSession
		})?;

		Ok(self)
	}
}

/// Finds the session token of an HTTP request, preferring the cookie over the
/// `Authorization: Bearer` header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
	let cookie = headers
		.get_all(header::COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find_map(|(name, value)| (name == TOKEN_COOKIE && !value.is_empty()).then_some(value));

	cookie.or_else(|| {
		headers
			.get(header::AUTHORIZATION)?
			.to_str()
			.ok()?
			.strip_prefix("Bearer ")
			.map(str::trim)
			.filter(|token| !token.is_empty())
	})
}

/// Finds the session token in graphql-ws `connectionParams`.
pub fn token_from_connection_params(params: &serde_json::Value) -> Option<&str> {
	let param = |key: &str| params.get(key).and_then(serde_json::Value::as_str);

	let token = param("authorization")
		.map(|value| value.strip_prefix("Bearer ").unwrap_or(value))
		.or_else(|| param("token"))
		.or_else(|| param("Authorization").map(|value| value.strip_prefix("Bearer ").unwrap_or(value)))?
		.trim();

	(!token.is_empty()).then_some(token)
}

/// The `Set-Cookie` value storing `token` for `max_age` seconds.
pub fn session_cookie(token: &str, max_age: u64, secure: bool) -> String {
	let mut cookie = format!("{TOKEN_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}");
	if secure {
		cookie.push_str("; Secure");
	}

	cookie
}

/// The `Set-Cookie` value removing the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
	session_cookie("", 0, secure)
}
