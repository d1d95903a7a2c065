use chrono::{Duration, DurationRound, Utc};
use common::database::Ulid;
use serial_test::serial;

use crate::api::jwt::{AuthJwtPayload, JwtState};
use crate::config::{AppConfig, JwtConfig};
use crate::tests::global::{create_session, create_user, mock_global_state};

fn payload() -> AuthJwtPayload {
	let now = Utc::now().duration_trunc(Duration::seconds(1)).expect("failed to truncate");

	AuthJwtPayload {
		user_id: Ulid::new(),
		session_id: Ulid::new(),
		expiration: Some(now + Duration::minutes(5)),
		issued_at: now,
		not_before: None,
		audience: None,
	}
}

#[serial]
#[tokio::test]
async fn test_serial_jwt_round_trip() {
	let (global, _) = mock_global_state(Default::default()).await;

	let payload = payload();
	let token = payload.serialize(&global).expect("failed to serialize token");

	assert_eq!(AuthJwtPayload::verify(&global, &token), Some(payload));
}

#[serial]
#[tokio::test]
async fn test_serial_jwt_from_session() {
	let (global, _) = mock_global_state(Default::default()).await;

	let user = create_user(&global, "alice").await;
	let (session, token) = create_session(&global, &user).await;

	let verified = AuthJwtPayload::verify(&global, &token).expect("failed to verify token");
	assert_eq!(verified.user_id, user.id);
	assert_eq!(verified.session_id, session.id);
	assert_eq!(verified.expiration.map(|e| e.timestamp()), Some(session.expires_at.timestamp()));
}

#[serial]
#[tokio::test]
async fn test_serial_jwt_rejects_foreign_tokens() {
	let (global, _) = mock_global_state(Default::default()).await;
	let (other, _) = mock_global_state(AppConfig {
		jwt: JwtConfig {
			secret: "another secret".to_string(),
			..Default::default()
		},
		..Default::default()
	})
	.await;
	let (other_issuer, _) = mock_global_state(AppConfig {
		jwt: JwtConfig {
			issuer: "someone-else".to_string(),
			..Default::default()
		},
		..Default::default()
	})
	.await;

	let token = payload().serialize(&global).expect("failed to serialize token");

	assert!(AuthJwtPayload::verify(&other, &token).is_none());
	assert!(AuthJwtPayload::verify(&other_issuer, &token).is_none());
	assert!(AuthJwtPayload::verify(&global, "not.a.token").is_none());

	let mut tampered = token.clone();
	tampered.push('x');
	assert!(AuthJwtPayload::verify(&global, &tampered).is_none());
}

#[serial]
#[tokio::test]
async fn test_serial_jwt_time_claims() {
	let (global, _) = mock_global_state(Default::default()).await;

	let expired = AuthJwtPayload {
		expiration: Some(Utc::now() - Duration::minutes(1)),
		..payload()
	};
	let token = expired.serialize(&global).expect("failed to serialize token");
	assert!(AuthJwtPayload::verify(&global, &token).is_none());

	let not_yet = AuthJwtPayload {
		not_before: Some(Utc::now() + Duration::minutes(1)),
		..payload()
	};
	let token = not_yet.serialize(&global).expect("failed to serialize token");
	assert!(AuthJwtPayload::verify(&global, &token).is_none());

	let future = AuthJwtPayload {
		issued_at: Utc::now() + Duration::minutes(1),
		..payload()
	};
	let token = future.serialize(&global).expect("failed to serialize token");
	assert!(AuthJwtPayload::verify(&global, &token).is_none());
}
