use aide::axum::{routing::post_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication or authorization.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid email or password")]
	InvalidCredentials,
	#[error("missing or invalid bearer token")]
	Unauthenticated,
	#[error("token expired")]
	Expired,
	#[error("administrator access required")]
	Forbidden,
	#[error("password validation error: {0}")]
	Argon(#[from] argon2::Error),
	#[error("could not issue token: {0}")]
	Token(#[from] jsonwebtoken::errors::Error),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route("/", post_with(login, login_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidCredentials | Self::Unauthenticated | Self::Expired => {
				StatusCode::UNAUTHORIZED
			}
			Self::Forbidden => StatusCode::FORBIDDEN,
			Self::Argon(..) | Self::Token(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn into_message(self) -> error::Message<'static> {
		match self {
			Self::Argon(..) | Self::Token(..) => error::Message::new("internal server error"),
			_ => error::Message::new(self.to_string()),
		}
	}
}
