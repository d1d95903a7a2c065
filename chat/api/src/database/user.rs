use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use common::database::Ulid;
use rand::rngs::OsRng;

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct User {
	/// The unique identifier for the user.
	pub id: Ulid,
	/// The email of the user, stored lowercase.
	pub email: String,
	/// The username of the user.
	pub username: String,
	/// The hashed password of the user. (argon2)
	pub password_hash: String,
	/// The time the user was created.
	pub created_at: DateTime<Utc>,
	/// The time the user was last updated.
	pub updated_at: DateTime<Utc>,
}

impl User {
	/// Uses argon2 to verify the password hash against the provided password.
	pub fn verify_password(&self, password: &str) -> bool {
		let hash = match PasswordHash::new(&self.password_hash) {
			Ok(hash) => hash,
			Err(err) => {
				tracing::error!("failed to parse password hash: {}", err);
				return false;
			}
		};

		Argon2::default().verify_password(password.as_bytes(), &hash).is_ok()
	}

	/// Hashes the password with argon2 and a random salt.
	pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
		let salt = SaltString::generate(&mut OsRng);

		Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
	}
}
