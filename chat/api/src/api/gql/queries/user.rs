use async_graphql::{Context, Object};

use crate::api::gql::error::Result;
use crate::api::gql::guards::require_auth;
use crate::api::gql::models::user::User;
use crate::global::ApiGlobal;

pub struct UserQuery<G>(std::marker::PhantomData<G>);

impl<G: ApiGlobal> Default for UserQuery<G> {
	fn default() -> Self {
		Self(std::marker::PhantomData)
	}
}

#[Object]
impl<G: ApiGlobal> UserQuery<G> {
	/// The currently authenticated user.
	async fn me(&self, ctx: &Context<'_>) -> Result<Option<User<G>>> {
		let auth = require_auth::<G>(ctx).await?;

		Ok(Some(auth.user.into()))
	}
}
