use std::sync::Arc;

use common::http::ext::*;
use common::http::RouteError;
use hyper::Body;
use routerify::prelude::RequestExt;
use routerify::Middleware;

use crate::api::auth::{token_from_headers, AuthData};
use crate::api::error::ApiError;
use crate::api::jwt::{AuthJwtPayload, JwtState};
use crate::api::request_context::RequestContext;
use crate::global::ApiGlobal;

/// Attaches a [`RequestContext`] to every request and authenticates it when a
/// valid session token is present. A missing, invalid or revoked token leaves
/// the request anonymous instead of failing it.
pub fn auth_middleware<G: ApiGlobal>(_: &Arc<G>) -> Middleware<Body, RouteError<ApiError>> {
	Middleware::pre(|req| async move {
		let context = RequestContext::default();
		req.set_context(context.clone());

		let Some(token) = token_from_headers(req.headers()) else {
			return Ok(req);
		};

		let global = req.get_global::<G>()?;

		let Some(jwt) = AuthJwtPayload::verify(&global, token) else {
			tracing::debug!("ignoring invalid token");
			return Ok(req);
		};

		let caches = context.loader_caches().await;
		match AuthData::from_session_id(&global, &caches, jwt.session_id).await {
			Ok(data) if data.user.id == jwt.user_id => context.set_auth(data.touch(&global).await?).await,
			Ok(_) => tracing::debug!(session_id = %jwt.session_id, "token subject does not own the session"),
			Err(err) if err.is_internal() => return Err(err.into()),
			Err(err) => tracing::debug!(error = %err, "ignoring token"),
		}

		Ok(req)
	})
}
