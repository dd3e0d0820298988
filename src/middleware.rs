use axum::{
	extract::{Request, State},
	http::{header, HeaderValue, Method, StatusCode},
	middleware::Next,
	response::{IntoResponse, Response},
};

use crate::error::AppError;

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Authorization, Content-Type";

/// Answers every `OPTIONS` request with an empty `204`, before routing
/// and authentication, so browsers can always complete their preflight.
pub async fn preflight(
	State(origin): State<HeaderValue>,
	request: Request,
	next: Next,
) -> Response {
	if request.method() != Method::OPTIONS {
		return next.run(request).await;
	}

	(
		StatusCode::NO_CONTENT,
		[
			(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin),
			(
				header::ACCESS_CONTROL_ALLOW_METHODS,
				HeaderValue::from_static(ALLOWED_METHODS),
			),
			(
				header::ACCESS_CONTROL_ALLOW_HEADERS,
				HeaderValue::from_static(ALLOWED_HEADERS),
			),
			(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400")),
		],
	)
		.into_response()
}

/// Unknown methods on known paths are reported like unknown paths.
pub async fn method_not_allowed(request: Request, next: Next) -> Response {
	let response = next.run(request).await;

	if response.status() == StatusCode::METHOD_NOT_ALLOWED {
		return AppError::NotFound.into_response();
	}

	response
}
