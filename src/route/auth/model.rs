use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::session::Identity;

#[derive(Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 1, max = 128))]
	pub password: String,
}

#[derive(Serialize, JsonSchema)]
pub struct LoginOutput {
	/// A bearer token for the `Authorization` header of editor requests.
	pub token: String,
	/// The identity encoded in the token.
	pub user: Identity,
}
