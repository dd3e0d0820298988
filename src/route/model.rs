use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

/// Identifies a page in a request path.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct PageIdInput {
	/// The unique identifier of the page.
	#[validate(length(min = 1, max = 128))]
	pub id: String,
}
