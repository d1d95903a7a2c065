use async_graphql::ID;
use common::database::Ulid;

use crate::api::gql::error::GqlError;

pub fn to_id(id: Ulid) -> ID {
	ID(id.to_string())
}

/// Parses an `ID` argument, rejecting anything that is not a ULID.
pub fn parse_id(field: &'static str, id: &ID) -> Result<Ulid, GqlError> {
	id.parse()
		.map_err(|_| GqlError::invalid_input(field, format!("{field} is not a valid id")))
}
