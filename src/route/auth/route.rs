use argon2::Argon2;
use axum::extract::State;
use macros::route;
use uuid::Uuid;

use crate::{content::catalog, extract::Json, openapi::tag, session::Identity, AppState};

use super::{model, Error, RouteError};

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the user's id as a salt.
pub fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Log in
/// Exchanges an email and password for a session token, valid for 24 hours.
#[route(
	tag = tag::AUTH,
	response(status = 200, description = "Logged in successfully.", shape = "Json<model::LoginOutput>"),
	error(status = 401, description = "Unknown email or wrong password.")
)]
pub async fn login(
	State(state): State<AppState>,
	Json(input): Json<model::LoginInput>,
) -> Result<Json<model::LoginOutput>, RouteError> {
	let user = catalog::find_user_by_email(&state.database, &input.email).await?;

	// Hash even for unknown emails, so both failures take the same time.
	let salt = user.as_ref().map_or(Uuid::nil(), |user| user.id);
	let hashed = hash_password(&state.hasher, &input.password, &salt).map_err(Error::Argon)?;

	let Some(user) = user.filter(|user| user.password == hashed) else {
		return Err(Error::InvalidCredentials.into());
	};

	let identity = Identity {
		id: user.id,
		email: user.email,
		is_admin: user.is_admin,
	};

	let token = state.tokens.issue(identity.clone()).map_err(Error::Token)?;

	tracing::info!(user = %identity.id, "editor logged in");

	Ok(Json(model::LoginOutput {
		token,
		user: identity,
	}))
}
