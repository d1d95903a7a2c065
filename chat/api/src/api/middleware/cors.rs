use std::sync::Arc;

use common::http::RouteError;
use hyper::header::{self, HeaderValue};
use hyper::Body;
use routerify::Middleware;

use crate::api::error::ApiError;
use crate::config::ApiConfig;
use crate::global::ApiGlobal;

pub fn cors_middleware<G: ApiGlobal>(global: &Arc<G>) -> Middleware<Body, RouteError<ApiError>> {
	let allowed_origins = global.config::<ApiConfig>().cors_origins.clone();

	Middleware::post_with_info(move |mut resp, info| {
		let allowed = info
			.headers()
			.get(header::ORIGIN)
			.filter(|origin| allowed_origins.iter().any(|allowed| origin.as_bytes() == allowed.as_bytes()))
			.cloned();

		async move {
			let headers = resp.headers_mut();

			if let Some(origin) = allowed {
				headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
				headers.insert(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
			}

			headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, POST, OPTIONS"));
			headers.insert(
				header::ACCESS_CONTROL_ALLOW_HEADERS,
				HeaderValue::from_static("Content-Type, Authorization"),
			);
			headers.append(header::VARY, HeaderValue::from_static("Origin"));

			Ok(resp)
		}
	})
}
