use async_graphql::{extensions, Schema};

use crate::global::ApiGlobal;

pub mod error;
pub mod ext;
pub mod guards;
pub mod handlers;
pub mod models;
pub mod mutations;
pub mod queries;
pub mod subscription;
pub mod validators;

pub type MySchema<G> = Schema<queries::Query<G>, mutations::Mutation<G>, subscription::Subscription<G>>;

pub fn schema<G: ApiGlobal>() -> MySchema<G> {
	Schema::build(
		queries::Query::<G>::default(),
		mutations::Mutation::<G>::default(),
		subscription::Subscription::<G>::default(),
	)
	.extension(extensions::Analyzer)
	.extension(extensions::Tracing)
	.limit_complexity(200) // We don't want to allow too complex queries to be executed
	.finish()
}
