//! Request extractors. Every input a handler accepts is validated before the
//! handler runs, and rejections use the shared error body.

mod editor;

pub use editor::Editor;

use aide::OperationIo;
use axum::{
	body::Body,
	extract::{FromRequest, FromRequestParts, Request},
	http::{request, Response},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Serialize};
use validator::Validate;

use crate::error::AppError;

/// Runs the `validator` rules of a deserialized input.
fn validated<T: Validate>(input: T) -> Result<T, AppError> {
	if let Err(errors) = input.validate() {
		tracing::debug!(
			fields = ?errors.field_errors().keys().collect::<Vec<_>>(),
			"input failed validation"
		);

		return Err(AppError::Validation(errors));
	}

	Ok(input)
}

/// A JSON request or response body.
///
/// As an input, the body is checked against the JSON schema of `T` and then
/// against its `validator` rules. As an output, `T` is serialized as is and
/// documented with its schema.
///
/// ```rust
/// async fn route(Json(update): Json<UpdatePageInput>) -> Json<UpdatePageOutput> {
///   // ...
/// }
/// ```
#[derive(OperationIo)]
#[aide(
	input_with = "axum_jsonschema::Json<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
	fn into_response(self) -> Response<Body> {
		axum::Json(self.0).into_response()
	}
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
	T: DeserializeOwned + Validate + JsonSchema + 'static,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request(request: Request, state: &S) -> Result<Self, AppError> {
		let axum_jsonschema::Json(input) = axum_jsonschema::Json::<T>::from_request(request, state)
			.await
			.map_err(|rejection| {
				tracing::debug!(?rejection, "request body does not match its schema");
				AppError::from(rejection)
			})?;

		validated(input).map(Self)
	}
}

/// Validated path parameters, such as the page id of `/pages/:id`.
#[derive(OperationIo)]
#[aide(
	input_with = "axum::extract::Path<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Path<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
	T: DeserializeOwned + Validate + Send,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request_parts(parts: &mut request::Parts, state: &S) -> Result<Self, AppError> {
		let axum::extract::Path(input) =
			axum::extract::Path::<T>::from_request_parts(parts, state).await?;

		validated(input).map(Self)
	}
}
