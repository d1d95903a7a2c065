use std::panic::Location;
use std::sync::Arc;

use async_graphql::ErrorExtensions;

use crate::api::auth::AuthError;

pub type Result<T, E = GqlErrorInterface> = std::result::Result<T, E>;

#[derive(Clone)]
pub struct GqlErrorInterface {
	error: GqlError,
	source: Option<String>,
	span: tracing::Span,
	location: &'static Location<'static>,
}

impl GqlErrorInterface {
	fn with_location(self, location: &'static Location<'static>) -> Self {
		Self { location, ..self }
	}

	fn with_source(self, source: Option<String>) -> Self {
		Self { source, ..self }
	}

	pub fn error(&self) -> &GqlError {
		&self.error
	}
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum GqlError {
	/// An internal server error occurred.
	#[error("{0}")]
	InternalServerError(&'static str),
	/// A database error occurred.
	#[error("database error")]
	Sqlx(Arc<sqlx::Error>),
	/// The input was invalid.
	#[error("{message}")]
	InvalidInput { fields: Vec<&'static str>, message: String },
	/// Auth error
	#[error("{0}")]
	Auth(#[from] AuthError),
	/// The caller may not perform this operation.
	#[error("{0}")]
	Forbidden(&'static str),
	/// Unauthorized
	#[error("Not authorized to view field {field}")]
	Unauthorized { field: &'static str },
	/// Not Found
	#[error("{0} not found")]
	NotFound(&'static str),
}

impl From<sqlx::Error> for GqlError {
	fn from(err: sqlx::Error) -> Self {
		Self::Sqlx(Arc::new(err))
	}
}

impl GqlError {
	pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
		Self::InvalidInput {
			fields: vec![field],
			message: message.into(),
		}
	}

	/// The `extensions.code` clients switch on.
	pub fn code(&self) -> &'static str {
		match self {
			GqlError::InternalServerError(_) | GqlError::Sqlx(_) => "INTERNAL_SERVER_ERROR",
			GqlError::Auth(err) if err.is_internal() => "INTERNAL_SERVER_ERROR",
			GqlError::Auth(_) => "UNAUTHENTICATED",
			GqlError::InvalidInput { .. } => "BAD_USER_INPUT",
			GqlError::Forbidden(_) | GqlError::Unauthorized { .. } => "FORBIDDEN",
			GqlError::NotFound(_) => "NOT_FOUND",
		}
	}

	pub fn kind(&self) -> &'static str {
		match self {
			GqlError::InternalServerError(_) => "InternalServerError",
			GqlError::Sqlx(_) => "Sqlx",
			GqlError::InvalidInput { .. } => "InvalidInput",
			GqlError::Auth(AuthError::NotLoggedIn) => "Auth(NotLoggedIn)",
			GqlError::Auth(AuthError::InvalidCredentials) => "Auth(InvalidCredentials)",
			GqlError::Auth(AuthError::InvalidToken) => "Auth(InvalidToken)",
			GqlError::Auth(AuthError::SessionExpired) => "Auth(SessionExpired)",
			GqlError::Auth(AuthError::UserNotFound) => "Auth(UserNotFound)",
			GqlError::Auth(AuthError::FetchUser) => "Auth(FetchUser)",
			GqlError::Auth(AuthError::FetchSession) => "Auth(FetchSession)",
			GqlError::Auth(AuthError::UpdateSession) => "Auth(UpdateSession)",
			GqlError::Forbidden(_) => "Forbidden",
			GqlError::Unauthorized { .. } => "Unauthorized",
			GqlError::NotFound(_) => "NotFound",
		}
	}

	pub fn is_internal(&self) -> bool {
		self.code() == "INTERNAL_SERVER_ERROR"
	}

	pub fn fields(&self) -> Vec<&'static str> {
		match self {
			GqlError::InvalidInput { fields, .. } => fields.to_vec(),
			GqlError::Unauthorized { field } => vec![field],
			_ => Vec::new(),
		}
	}
}

impl ErrorExtensions for GqlErrorInterface {
	fn extend(&self) -> async_graphql::Error {
		let err = async_graphql::Error::new(self.error.to_string()).extend_with(|_, e| {
			e.set("code", self.error.code());
			e.set("kind", self.error.kind());
			e.set("reason", self.error.to_string());
			e.set("fields", self.error.fields());
		});

		self.span.in_scope(|| {
			if self.error.is_internal() {
				tracing::error!(
					error = ?self.error,
					source = self.source.as_deref(),
					location = %self.location,
					"gql error: {}",
					self.error
				);
			} else {
				tracing::debug!(
					error = ?self.error,
					source = self.source.as_deref(),
					location = %self.location,
					"gql error: {}",
					self.error
				);
			}
		});

		err
	}
}

impl<T> From<T> for GqlErrorInterface
where
	GqlError: From<T>,
{
	#[track_caller]
	fn from(value: T) -> Self {
		Self {
			error: GqlError::from(value),
			source: None,
			span: tracing::Span::current(),
			location: Location::caller(),
		}
	}
}

impl From<&'static str> for GqlErrorInterface {
	#[track_caller]
	fn from(msg: &'static str) -> Self {
		Self {
			error: GqlError::InternalServerError(msg),
			source: None,
			span: tracing::Span::current(),
			location: Location::caller(),
		}
	}
}

impl From<GqlErrorInterface> for async_graphql::Error {
	fn from(err: GqlErrorInterface) -> Self {
		err.extend()
	}
}

pub mod ext {
	use super::*;

	pub trait ResultExt<T, E>: Sized {
		/// Replaces the error with `ctx`, logging the original alongside it.
		fn map_err_gql<C>(self, ctx: C) -> Result<T>
		where
			GqlErrorInterface: From<C>;

		fn map_err_ignored_gql<C>(self, ctx: C) -> Result<T>
		where
			GqlErrorInterface: From<C>;
	}

	impl<T, E: std::fmt::Debug> ResultExt<T, E> for std::result::Result<T, E> {
		#[track_caller]
		fn map_err_gql<C>(self, ctx: C) -> Result<T>
		where
			GqlErrorInterface: From<C>,
		{
			let location = Location::caller();
			self.map_err(|err| {
				GqlErrorInterface::from(ctx)
					.with_source(Some(format!("{err:?}")))
					.with_location(location)
			})
		}

		#[track_caller]
		fn map_err_ignored_gql<C>(self, ctx: C) -> Result<T>
		where
			GqlErrorInterface: From<C>,
		{
			let location = Location::caller();
			self.map_err(|_| GqlErrorInterface::from(ctx).with_location(location))
		}
	}

	pub trait OptionExt<T>: Sized {
		fn map_err_gql<C>(self, ctx: C) -> Result<T>
		where
			GqlErrorInterface: From<C>;
	}

	impl<T> OptionExt<T> for Option<T> {
		#[track_caller]
		fn map_err_gql<C>(self, ctx: C) -> Result<T>
		where
			GqlErrorInterface: From<C>,
		{
			let location = Location::caller();
			self.ok_or_else(|| GqlErrorInterface::from(ctx).with_location(location))
		}
	}
}
