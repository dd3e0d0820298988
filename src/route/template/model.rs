pub use crate::content::model::Template;

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize, JsonSchema)]
pub struct TemplateWithStructure {
	#[serde(flatten)]
	pub template: Template,
	/// The block layout of the template. Empty if its file is missing or corrupt.
	pub structure: Value,
}

#[derive(Serialize, JsonSchema)]
pub struct TemplateList {
	pub templates: Vec<TemplateWithStructure>,
}
