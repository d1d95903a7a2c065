use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, Value};
use chrono::{DateTime, TimeZone, Utc};

/// A timestamp, serialized as an RFC 3339 string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateRFC3339(pub DateTime<Utc>);

#[Scalar]
impl ScalarType for DateRFC3339 {
	fn parse(value: Value) -> InputValueResult<Self> {
		match value {
			Value::String(s) => match DateTime::parse_from_rfc3339(&s) {
				Ok(dt) => Ok(DateRFC3339(dt.with_timezone(&Utc))),
				Err(e) => Err(InputValueError::custom(e.to_string())),
			},
			Value::Number(n) => n
				.as_i64()
				.and_then(|n| Utc.timestamp_opt(n, 0).single())
				.map(DateRFC3339)
				.ok_or_else(|| InputValueError::custom("Invalid number")),
			_ => Err(InputValueError::expected_type(value)),
		}
	}

	fn to_value(&self) -> Value {
		Value::String(self.0.to_rfc3339())
	}
}

impl From<DateTime<Utc>> for DateRFC3339 {
	fn from(dt: DateTime<Utc>) -> Self {
		DateRFC3339(dt)
	}
}
