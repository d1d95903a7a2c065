use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef};
use sqlx::{Decode, Encode, Sqlite, Type};

/// A ULID stored as its 26 character Crockford base32 text form, which keeps
/// ids sortable by creation time inside SQLite.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Ulid(pub ulid::Ulid);

impl Ulid {
	pub fn new() -> Self {
		Self(ulid::Ulid::new())
	}
}

impl Default for Ulid {
	fn default() -> Self {
		Self(ulid::Ulid::nil())
	}
}

impl std::fmt::Display for Ulid {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.0.fmt(f)
	}
}

impl std::fmt::Debug for Ulid {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.0.fmt(f)
	}
}

impl std::str::FromStr for Ulid {
	type Err = ulid::DecodeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ulid::Ulid::from_string(s).map(Self)
	}
}

impl Type<Sqlite> for Ulid {
	fn type_info() -> SqliteTypeInfo {
		<String as Type<Sqlite>>::type_info()
	}

	fn compatible(ty: &SqliteTypeInfo) -> bool {
		<String as Type<Sqlite>>::compatible(ty)
	}
}

impl<'q> Encode<'q, Sqlite> for Ulid {
	fn encode_by_ref(&self, buf: &mut Vec<SqliteArgumentValue<'q>>) -> IsNull {
		<String as Encode<'q, Sqlite>>::encode(self.0.to_string(), buf)
	}
}

impl<'r> Decode<'r, Sqlite> for Ulid {
	fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
		let text = <&str as Decode<'r, Sqlite>>::decode(value)?;
		Ok(Self(ulid::Ulid::from_string(text)?))
	}
}

impl From<Ulid> for ulid::Ulid {
	fn from(id: Ulid) -> Self {
		id.0
	}
}

impl From<ulid::Ulid> for Ulid {
	fn from(id: ulid::Ulid) -> Self {
		Ulid(id)
	}
}
