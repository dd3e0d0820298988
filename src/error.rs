use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{content::payload::PayloadError, extract::Json};

pub type Map = serde_json::Map<String, serde_json::Value>;

/// The body of every error response.
///
/// `error` is always human-readable. `details` carries machine-readable
/// context, such as the block ids applied before a reconcile failed.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	pub error: Cow<'a, str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'a, Map>>,
}

impl<'a> Message<'a> {
	pub fn new(error: impl Into<Cow<'a, str>>) -> Self {
		Self {
			error: error.into(),
			details: None,
		}
	}

	/// Adds a single detail entry, creating the map if needed.
	pub fn detail(mut self, key: &str, value: impl Serialize) -> Self {
		let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);

		self.details
			.get_or_insert_with(|| Cow::Owned(Map::new()))
			.to_mut()
			.insert(key.into(), value);

		self
	}
}

/// Describes how a route-specific error is presented to the client.
///
/// The `Display` implementation of the error is only logged, the message
/// returned by [`ErrorShape::into_message`] is what the client sees.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn into_message(self) -> Message<'static>
	where
		Self: Sized,
	{
		Message::new(self.to_string())
	}
}

/// Errors that can occur in any route, independent of its domain.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("invalid request body: {0:?}")]
	Body(axum_jsonschema::JsonSchemaRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("storage error: {0}")]
	Storage(#[from] PayloadError),
	#[error("rate limited: {0}")]
	RateLimit(#[from] tower_governor::GovernorError),
	#[error("not found")]
	NotFound,
}

impl From<axum_jsonschema::JsonSchemaRejection> for AppError {
	fn from(rejection: axum_jsonschema::JsonSchemaRejection) -> Self {
		Self::Body(rejection)
	}
}

impl AppError {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Body(..) | Self::Path(..) => StatusCode::BAD_REQUEST,
			Self::NotFound => StatusCode::NOT_FOUND,
			Self::RateLimit(tower_governor::GovernorError::TooManyRequests { .. }) => {
				StatusCode::TOO_MANY_REQUESTS
			}
			Self::Database(..) | Self::Storage(..) | Self::RateLimit(..) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	fn into_message(self) -> Message<'static> {
		match self {
			Self::Validation(errors) => Message::new(
				errors
					.field_errors()
					.into_iter()
					.flat_map(|(field, errors)| {
						errors.iter().map(move |error| format!("{field}: {error}"))
					})
					.collect::<Vec<_>>()
					.join("; "),
			),
			Self::Body(..) => Message::new("invalid request body"),
			Self::Path(..) => Message::new("invalid path parameter"),
			Self::NotFound => Message::new("not found"),
			Self::RateLimit(tower_governor::GovernorError::TooManyRequests { wait_time, .. }) => {
				Message::new("too many requests").detail("retry_after", wait_time)
			}
			Self::Database(..) | Self::Storage(..) | Self::RateLimit(..) => {
				Message::new("internal server error")
			}
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		let status = self.status();

		if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
		} else {
			tracing::debug!(error = %self, "request rejected");
		}

		(status, Json(self.into_message())).into_response()
	}
}

/// Routes that can only fail with an [`AppError`].
impl ErrorShape for std::convert::Infallible {
	fn status(&self) -> StatusCode {
		match *self {}
	}
}

/// An error returned from a route, either domain-specific or application-wide.
#[derive(Debug)]
pub enum RouteError<E> {
	App(AppError),
	Route(E),
}

impl<E: ErrorShape> From<E> for RouteError<E> {
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

impl<E> From<AppError> for RouteError<E> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

macro_rules! app_error {
	($($ty:ty),* $(,)?) => {
		$(
			impl<E> From<$ty> for RouteError<E> {
				fn from(error: $ty) -> Self {
					Self::App(error.into())
				}
			}
		)*
	};
}

app_error!(
	sqlx::Error,
	PayloadError,
	validator::ValidationErrors,
	rejection::PathRejection,
);

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => {
				let status = error.status();

				if status.is_server_error() {
					tracing::error!(error = %error, "request failed");
				} else {
					tracing::debug!(error = %error, "request rejected");
				}

				(status, Json(error.into_message())).into_response()
			}
		}
	}
}

impl<E> OperationOutput for RouteError<E> {
	type Inner = Message<'static>;
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
	AppError::NotFound
}
