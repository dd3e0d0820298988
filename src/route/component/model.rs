pub use crate::content::model::ComponentDefinition;

use schemars::JsonSchema;
use serde::Serialize;

#[derive(Serialize, JsonSchema)]
pub struct ComponentList {
	/// Every available block type, ordered by name.
	pub components: Vec<ComponentDefinition>,
}
