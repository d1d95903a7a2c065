use chrono::Utc;
use common::global::GlobalDb;
use hyper::header::{self, HeaderMap, HeaderValue};
use serde_json::json;
use serial_test::serial;

use crate::api::auth::{
	clear_session_cookie, session_cookie, token_from_connection_params, token_from_headers, AuthData, AuthError,
};
use crate::api::request_context::RequestContext;
use crate::dataloader::LoaderCaches;
use crate::tests::global::{create_session, create_user, mock_global_state, user_context};

fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
	let mut headers = HeaderMap::new();
	for (name, value) in pairs {
		headers.append(name.clone(), HeaderValue::from_static(value));
	}

	headers
}

#[test]
fn test_token_from_headers() {
	assert_eq!(token_from_headers(&HeaderMap::new()), None);

	let only_bearer = headers(&[(header::AUTHORIZATION, "Bearer abc.def")]);
	assert_eq!(token_from_headers(&only_bearer), Some("abc.def"));

	let only_cookie = headers(&[(header::COOKIE, "theme=dark; token=cookie.token; lang=en")]);
	assert_eq!(token_from_headers(&only_cookie), Some("cookie.token"));

	let both = headers(&[
		(header::AUTHORIZATION, "Bearer header.token"),
		(header::COOKIE, "token=cookie.token"),
	]);
	assert_eq!(token_from_headers(&both), Some("cookie.token"));

	let empty_cookie = headers(&[
		(header::COOKIE, "token="),
		(header::AUTHORIZATION, "Bearer header.token"),
	]);
	assert_eq!(token_from_headers(&empty_cookie), Some("header.token"));

	let not_bearer = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
	assert_eq!(token_from_headers(&not_bearer), None);

	let similar_cookie = headers(&[(header::COOKIE, "mytoken=nope")]);
	assert_eq!(token_from_headers(&similar_cookie), None);
}

#[test]
fn test_token_from_connection_params() {
	assert_eq!(token_from_connection_params(&json!({})), None);
	assert_eq!(token_from_connection_params(&json!(null)), None);

	assert_eq!(
		token_from_connection_params(&json!({ "authorization": "Bearer abc" })),
		Some("abc")
	);
	assert_eq!(token_from_connection_params(&json!({ "authorization": "abc" })), Some("abc"));
	assert_eq!(token_from_connection_params(&json!({ "token": "abc" })), Some("abc"));
	assert_eq!(
		token_from_connection_params(&json!({ "Authorization": "Bearer abc" })),
		Some("abc")
	);
	assert_eq!(
		token_from_connection_params(&json!({ "authorization": "Bearer first", "token": "second" })),
		Some("first")
	);
	assert_eq!(token_from_connection_params(&json!({ "token": "  " })), None);
	assert_eq!(token_from_connection_params(&json!({ "token": 42 })), None);
}

#[test]
fn test_session_cookie() {
	assert_eq!(
		session_cookie("abc", 3600, false),
		"token=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=3600"
	);
	assert_eq!(
		session_cookie("abc", 60, true),
		"token=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=60; Secure"
	);
	assert_eq!(clear_session_cookie(false), "token=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
}

#[serial]
#[tokio::test]
async fn test_serial_auth_data_from_session() {
	let (global, _) = mock_global_state(Default::default()).await;

	let user = create_user(&global, "alice").await;
	let (session, _) = create_session(&global, &user).await;

	let auth = AuthData::from_session_id(&global, &LoaderCaches::default(), session.id)
		.await
		.expect("failed to resolve session");
	assert_eq!(auth.user_id(), user.id);
	assert_eq!(auth.session.id, session.id);

	sqlx::query("UPDATE user_sessions SET expires_at = ? WHERE id = ?")
		.bind(Utc::now() - chrono::Duration::seconds(1))
		.bind(session.id)
		.execute(global.db())
		.await
		.expect("failed to expire session");

	let err = AuthData::from_session_id(&global, &LoaderCaches::default(), session.id)
		.await
		.expect_err("expired session accepted");
	assert_eq!(err, AuthError::SessionExpired);

	let err = AuthData::from_session_id(&global, &LoaderCaches::default(), common::database::Ulid::new())
		.await
		.expect_err("unknown session accepted");
	assert_eq!(err, AuthError::SessionExpired);
}

#[serial]
#[tokio::test]
async fn test_serial_request_context_auth() {
	let (global, _) = mock_global_state(Default::default()).await;

	let anonymous = RequestContext::default();
	assert!(anonymous.auth(&global).await.expect("failed to get auth").is_none());
	assert_eq!(
		anonymous.auth_required(&global).await.expect_err("anonymous user accepted"),
		AuthError::NotLoggedIn
	);

	let user = create_user(&global, "alice").await;
	let context = user_context(&global, &user).await;

	let auth = context.auth_required(&global).await.expect("failed to get auth");
	assert_eq!(auth.user_id(), user.id);

	context.reset_auth().await;
	assert!(context.auth(&global).await.expect("failed to get auth").is_none());
}

#[serial]
#[tokio::test]
async fn test_serial_websocket_context_revalidates_session() {
	let (global, _) = mock_global_state(Default::default()).await;

	let user = create_user(&global, "alice").await;
	let context = user_context(&global, &user).await;
	context.websocket().await;
	assert!(context.is_websocket().await);

	let auth = context.auth_required(&global).await.expect("failed to get auth");

	sqlx::query("DELETE FROM user_sessions WHERE id = ?")
		.bind(auth.session.id)
		.execute(global.db())
		.await
		.expect("failed to delete session");

	assert_eq!(
		context.auth(&global).await.expect_err("revoked session accepted"),
		AuthError::SessionExpired
	);

	// The connection falls back to anonymous once its session is gone.
	assert!(context.auth(&global).await.expect("failed to get auth").is_none());
}

#[serial]
#[tokio::test]
async fn test_serial_auth_data_touch() {
	let (global, _) = mock_global_state(Default::default()).await;

	let user = create_user(&global, "alice").await;
	let (session, _) = create_session(&global, &user).await;

	let fresh = AuthData::from_session_id(&global, &LoaderCaches::default(), session.id)
		.await
		.expect("failed to resolve session")
		.touch(&global)
		.await
		.expect("failed to touch session");
	assert_eq!(fresh.session.last_used_at, session.last_used_at);

	let stale_at = Utc::now() - chrono::Duration::hours(2);
	sqlx::query("UPDATE user_sessions SET last_used_at = ? WHERE id = ?")
		.bind(stale_at)
		.bind(session.id)
		.execute(global.db())
		.await
		.expect("failed to age session");

	let before = Utc::now();
	let touched = AuthData::from_session_id(&global, &LoaderCaches::default(), session.id)
		.await
		.expect("failed to resolve session")
		.touch(&global)
		.await
		.expect("failed to touch session");
	assert!(touched.session.last_used_at >= before);

	let (stored,): (chrono::DateTime<Utc>,) = sqlx::query_as("SELECT last_used_at FROM user_sessions WHERE id = ?")
		.bind(session.id)
		.fetch_one(global.db())
		.await
		.expect("failed to read session");
	assert_eq!(stored, touched.session.last_used_at);
}
