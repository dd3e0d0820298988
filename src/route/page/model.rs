pub use crate::{
	content::model::{ContentBlock, Page},
	route::model::PageIdInput,
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::content::reconcile::{DesiredBlock, PageUpdate};

/// Can be removed when [`serde`] supports literal defaults:
/// <https://github.com/serde-rs/serde/issues/368>
#[inline]
fn yes() -> bool {
	true
}

#[derive(Serialize, JsonSchema)]
pub struct PageList {
	/// Every page, most recently updated first.
	pub pages: Vec<Page>,
}

/// A content block together with its payload.
#[derive(Serialize, JsonSchema)]
pub struct BlockWithData {
	#[serde(flatten)]
	pub block: ContentBlock,
	/// The payload of the block. Empty if its file is missing or corrupt.
	pub data: Value,
}

#[derive(Serialize, JsonSchema)]
pub struct PageWithContent {
	pub page: Page,
	/// The blocks of the page in render order.
	pub content: Vec<BlockWithData>,
}

/// One block of the desired content of a page.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DesiredBlockInput {
	/// The id of an existing block to keep. Omit it to create a new block.
	pub id: Option<String>,
	/// The component type of the block.
	#[serde(alias = "section")]
	pub section_id: Option<String>,
	/// The new payload. Omit it to keep the payload of an existing block,
	/// or to start a new block from its component's default content.
	pub data: Option<Value>,
	#[serde(default = "yes")]
	pub is_published: bool,
}

/// The full desired state of a page. Blocks are rendered in list order,
/// and existing blocks missing from `content` are deleted.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct UpdatePageInput {
	#[validate(length(min = 1, max = 256))]
	pub title: String,
	pub description: Option<String>,
	#[validate(length(max = 256))]
	pub meta_title: Option<String>,
	#[validate(length(max = 512))]
	pub meta_description: Option<String>,
	pub is_published: bool,
	/// The version of the page the edit is based on. If it no longer matches,
	/// the update is rejected instead of overwriting someone else's changes.
	pub version: Option<i32>,
	#[validate(length(max = 1000))]
	pub content: Vec<DesiredBlockInput>,
}

#[derive(Serialize, JsonSchema)]
pub struct UpdatePageOutput {
	pub success: bool,
	/// The version of the page after the update.
	pub version: i32,
}

impl UpdatePageInput {
	pub fn into_parts(self) -> (PageUpdate, Vec<DesiredBlock>) {
		let update = PageUpdate {
			title: self.title,
			description: self.description,
			meta_title: self.meta_title,
			meta_description: self.meta_description,
			is_published: self.is_published,
			version: self.version,
		};

		let desired = self
			.content
			.into_iter()
			.map(|block| DesiredBlock {
				id: block.id,
				section_id: block.section_id,
				data: block.data,
				is_published: block.is_published,
			})
			.collect();

		(update, desired)
	}
}

#[cfg(test)]
mod test {
	use serde_json::json;
	use validator::Validate;

	use super::*;

	#[test]
	fn test_section_alias() {
		let input = serde_json::from_value::<DesiredBlockInput>(json!({
			"section": "text",
			"data": { "body": "new" },
		}))
		.unwrap();

		assert_eq!(input.section_id.as_deref(), Some("text"));
		assert!(input.id.is_none());
		assert!(input.is_published);
	}

	#[test]
	fn test_content_length_is_capped() {
		let content = vec![json!({ "section_id": "text" }); 1001];
		let input = serde_json::from_value::<UpdatePageInput>(json!({
			"title": "Home",
			"is_published": true,
			"content": content,
		}))
		.unwrap();

		assert!(input.validate().is_err());
	}

	#[test]
	fn test_title_is_required() {
		let input = serde_json::from_value::<UpdatePageInput>(json!({
			"title": "",
			"is_published": true,
			"content": [],
		}))
		.unwrap();

		assert!(input.validate().is_err());
	}

	#[test]
	fn test_into_parts_keeps_order() {
		let input = serde_json::from_value::<UpdatePageInput>(json!({
			"title": "Home",
			"is_published": false,
			"version": 3,
			"content": [{ "id": "b" }, { "id": "a", "is_published": false }],
		}))
		.unwrap();

		let (update, desired) = input.into_parts();

		assert_eq!(update.version, Some(3));
		assert_eq!(desired[0].id.as_deref(), Some("b"));
		assert_eq!(desired[1].id.as_deref(), Some("a"));
		assert!(!desired[1].is_published);
	}
}
