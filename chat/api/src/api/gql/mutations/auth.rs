use std::sync::Arc;

use async_graphql::{Context, Object};
use chrono::Utc;
use common::database::Ulid;

use crate::api::auth::{clear_session_cookie, session_cookie, AuthData, AuthError};
use crate::api::gql::error::ext::*;
use crate::api::gql::error::{GqlError, Result};
use crate::api::gql::ext::ContextExt;
use crate::api::gql::models::inputs::{LoginInput, SignupInput};
use crate::api::gql::models::responses::AuthResponse;
use crate::api::gql::validators;
use crate::api::jwt::{AuthJwtPayload, JwtState};
use crate::config::{ApiConfig, JwtConfig};
use crate::database;
use crate::global::ApiGlobal;

const USER_EXISTS: &str = "User with this email or username already exists";

#[derive(Clone)]
pub struct AuthMutation<G>(std::marker::PhantomData<G>);

impl<G: ApiGlobal> Default for AuthMutation<G> {
	fn default() -> Self {
		Self(std::marker::PhantomData)
	}
}

fn session_duration<G: ApiGlobal>(global: &Arc<G>) -> Result<chrono::Duration> {
	let secs = global.config::<JwtConfig>().session_duration;

	chrono::Duration::from_std(std::time::Duration::from_secs(secs)).map_err_gql("session duration out of range")
}

/// Hands the new session to the client as a token and a cookie, and
/// authenticates the rest of the request (or websocket connection) with it.
async fn establish_session<G: ApiGlobal>(
	ctx: &Context<'_>,
	user: database::User,
	session: database::Session,
) -> Result<AuthResponse<G>> {
	let global = ctx.get_global::<G>();

	let token = AuthJwtPayload::from(&session)
		.serialize(global)
		.map_err_gql(GqlError::InternalServerError("failed to serialize JWT"))?;

	ctx.append_http_header(
		"Set-Cookie",
		session_cookie(
			&token,
			global.config::<JwtConfig>().session_duration,
			global.config::<ApiConfig>().secure_cookies,
		),
	);

	ctx.get_req_context()
		.set_auth(AuthData {
			session,
			user: user.clone(),
		})
		.await;

	Ok(AuthResponse {
		user: user.into(),
		token,
	})
}

#[Object]
/// The mutation object for authentication
impl<G: ApiGlobal> AuthMutation<G> {
	/// Create an account and log into it.
	async fn signup(&self, ctx: &Context<'_>, input: SignupInput) -> Result<AuthResponse<G>> {
		let global = ctx.get_global::<G>();

		let email = validators::email(&input.email)?;
		validators::username(&input.username)?;
		validators::password(&input.password)?;

		let existing: Option<database::User> = sqlx::query_as("SELECT * FROM users WHERE email = ? OR username = ?")
			.bind(email.as_str())
			.bind(input.username.as_str())
			.fetch_optional(global.db())
			.await?;

		if existing.is_some() {
			return Err(GqlError::Forbidden(USER_EXISTS).into());
		}

		let password_hash = database::User::hash_password(&input.password).map_err_gql("failed to hash password")?;
		let duration = session_duration(global)?;
		let now = Utc::now();

		let mut tx = global.db().begin().await?;

		let user: database::User = sqlx::query_as(
			"INSERT INTO users (id, email, username, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
		)
		.bind(Ulid::new())
		.bind(email.as_str())
		.bind(input.username.as_str())
		.bind(password_hash)
		.bind(now)
		.bind(now)
		.fetch_one(&mut *tx)
		.await
		.map_err(|err| {
			if database::is_unique_violation(&err) {
				GqlError::Forbidden(USER_EXISTS)
			} else {
				err.into()
			}
		})?;

		let session = database::Session::create(&mut *tx, user.id, duration).await?;

		tx.commit().await?;

		tracing::debug!(user_id = %user.id, "user signed up");

		establish_session(ctx, user, session).await
	}

	/// Login using an email and password. If via websocket this will
	/// authenticate the websocket connection.
	async fn login(&self, ctx: &Context<'_>, input: LoginInput) -> Result<AuthResponse<G>> {
		let global = ctx.get_global::<G>();

		let user: database::User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
			.bind(input.email.trim().to_lowercase())
			.fetch_optional(global.db())
			.await?
			.map_err_gql(AuthError::InvalidCredentials)?;

		if !user.verify_password(&input.password) {
			return Err(AuthError::InvalidCredentials.into());
		}

		let session = database::Session::create(global.db(), user.id, session_duration(global)?).await?;

		establish_session(ctx, user, session).await
	}

	/// End the current session. Always succeeds, even when logged out.
	async fn logout(&self, ctx: &Context<'_>) -> Result<bool> {
		let global = ctx.get_global::<G>();
		let request_context = ctx.get_req_context();

		let auth = match request_context.auth(global).await {
			Ok(auth) => auth,
			Err(AuthError::SessionExpired) => None,
			Err(err) => return Err(err.into()),
		};

		if let Some(auth) = auth {
			sqlx::query("DELETE FROM user_sessions WHERE id = ?")
				.bind(auth.session.id)
				.execute(global.db())
				.await?;

			request_context.loader_caches().await.session_removed(auth.session.id);
		}

		request_context.reset_auth().await;

		ctx.append_http_header(
			"Set-Cookie",
			clear_session_cookie(global.config::<ApiConfig>().secure_cookies),
		);

		Ok(true)
	}
}
