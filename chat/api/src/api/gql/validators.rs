//! Input checks shared by the mutations. Failures surface as
//! `BAD_USER_INPUT` naming the offending field.

use email_address::EmailAddress;

use super::error::GqlError;

pub const USERNAME_LENGTH: (usize, usize) = (2, 32);
pub const PASSWORD_LENGTH: (usize, usize) = (6, 100);
pub const ROOM_NAME_MAX_LENGTH: usize = 50;
pub const ROOM_DESCRIPTION_MAX_LENGTH: usize = 500;
pub const MESSAGE_MAX_LENGTH: usize = 2000;
pub const MESSAGES_MAX_LIMIT: i32 = 100;
pub const MESSAGES_DEFAULT_LIMIT: i32 = 50;

/// Returns the normalized (trimmed, lowercase) email.
pub fn email(value: &str) -> Result<String, GqlError> {
	let value = value.trim().to_lowercase();

	if !EmailAddress::is_valid(&value) {
		return Err(GqlError::invalid_input("email", "Email must be a valid email address"));
	}

	Ok(value)
}

pub fn username(value: &str) -> Result<(), GqlError> {
	let (min, max) = USERNAME_LENGTH;
	let len = value.chars().count();

	if len < min || len > max {
		return Err(GqlError::invalid_input(
			"username",
			format!("Username must be between {min} and {max} characters long"),
		));
	}

	if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
		return Err(GqlError::invalid_input(
			"username",
			"Username may only contain letters, numbers, underscores and dashes",
		));
	}

	Ok(())
}

pub fn password(value: &str) -> Result<(), GqlError> {
	let (min, max) = PASSWORD_LENGTH;
	let len = value.chars().count();

	if len < min || len > max {
		return Err(GqlError::invalid_input(
			"password",
			format!("Password must be between {min} and {max} characters long"),
		));
	}

	Ok(())
}

/// Returns the trimmed room name.
pub fn room_name(value: &str) -> Result<String, GqlError> {
	let value = value.trim();

	if value.is_empty() {
		return Err(GqlError::invalid_input("name", "Room name cannot be empty"));
	}

	if value.chars().count() > ROOM_NAME_MAX_LENGTH {
		return Err(GqlError::invalid_input(
			"name",
			format!("Room name must be at most {ROOM_NAME_MAX_LENGTH} characters long"),
		));
	}

	Ok(value.to_owned())
}

/// Returns the trimmed description, dropping it when blank.
pub fn room_description(value: Option<&str>) -> Result<Option<String>, GqlError> {
	let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
		return Ok(None);
	};

	if value.chars().count() > ROOM_DESCRIPTION_MAX_LENGTH {
		return Err(GqlError::invalid_input(
			"description",
			format!("Description must be at most {ROOM_DESCRIPTION_MAX_LENGTH} characters long"),
		));
	}

	Ok(Some(value.to_owned()))
}

/// Returns the trimmed message content.
pub fn message_content(value: &str) -> Result<String, GqlError> {
	let value = value.trim();

	if value.is_empty() {
		return Err(GqlError::invalid_input("content", "Message cannot be empty"));
	}

	if value.chars().count() > MESSAGE_MAX_LENGTH {
		return Err(GqlError::invalid_input(
			"content",
			format!("Message must be at most {MESSAGE_MAX_LENGTH} characters long"),
		));
	}

	Ok(value.to_owned())
}

pub fn pagination(limit: i32, offset: i32) -> Result<(i64, i64), GqlError> {
	if !(0..=MESSAGES_MAX_LIMIT).contains(&limit) {
		return Err(GqlError::invalid_input(
			"limit",
			format!("Limit must be between 0 and {MESSAGES_MAX_LIMIT}"),
		));
	}

	if offset < 0 {
		return Err(GqlError::invalid_input("offset", "Offset cannot be negative"));
	}

	Ok((limit.into(), offset.into()))
}
