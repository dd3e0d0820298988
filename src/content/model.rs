use schemars::JsonSchema;
use serde::Serialize;
use uuid::Uuid;

/// An editor account. Only read by the authentication gate.
#[derive(Debug, sqlx::FromRow)]
pub struct User {
	pub id: Uuid,
	pub email: String,
	/// Argon2 output, salted with `id`.
	pub password: Vec<u8>,
	pub is_admin: bool,
}

/// A single site page.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Page {
	/// The unique identifier of the page.
	pub id: String,
	/// The unique, URL-safe name of the page.
	pub slug: String,
	pub title: String,
	pub description: Option<String>,
	pub meta_title: Option<String>,
	pub meta_description: Option<String>,
	pub is_published: bool,
	/// The template the page was created from, if any.
	pub template_id: Option<String>,
	/// Incremented on every update. Send it back with an update to
	/// detect concurrent edits.
	pub version: i32,
	pub created_at: chrono::DateTime<chrono::Utc>,
	pub updated_at: chrono::DateTime<chrono::Utc>,
	/// The editor that last updated the page.
	pub updated_by: Option<Uuid>,
}

/// One positioned unit of page content. The payload lives in the file
/// referenced by `file_path`.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct ContentBlock {
	pub id: String,
	pub page_id: String,
	/// The component type of the block. Not checked against the catalog.
	pub section_id: Option<String>,
	/// Payload path, relative to the content root.
	#[serde(skip)]
	pub file_path: String,
	/// Render order within the page, starting at zero.
	pub position: i32,
	pub is_published: bool,
	pub created_at: chrono::DateTime<chrono::Utc>,
	pub updated_at: chrono::DateTime<chrono::Utc>,
	pub created_by: Option<Uuid>,
	pub updated_by: Option<Uuid>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct SectionRow {
	pub id: String,
	pub name: String,
	pub description: Option<String>,
	pub schema: String,
}

/// An available block type, as shown in the editor's component picker.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ComponentDefinition {
	pub id: String,
	pub name: String,
	pub description: Option<String>,
	/// The parsed JSON schema of the component's content.
	pub schema: serde_json::Value,
	/// Content used for new blocks of this type.
	pub default_content: serde_json::Value,
}

/// A page template. Its structure is stored as a payload file.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Template {
	pub id: String,
	pub name: String,
	pub description: Option<String>,
	#[serde(skip)]
	pub structure_path: String,
	pub created_at: chrono::DateTime<chrono::Utc>,
	pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<SectionRow> for ComponentDefinition {
	fn from(row: SectionRow) -> Self {
		let schema = match serde_json::from_str::<serde_json::Value>(&row.schema) {
			Ok(schema @ serde_json::Value::Object(..)) => schema,
			Ok(..) | Err(..) => {
				tracing::warn!(section = %row.id, "component schema is not a json object");
				serde_json::Value::Object(Default::default())
			}
		};

		let default_content = schema
			.get("default")
			.cloned()
			.unwrap_or_else(|| serde_json::Value::Object(Default::default()));

		Self {
			id: row.id,
			name: row.name,
			description: row.description,
			schema,
			default_content,
		}
	}
}

#[cfg(test)]
mod test {
	use serde_json::json;

	use super::*;

	fn row(schema: &str) -> SectionRow {
		SectionRow {
			id: "hero".into(),
			name: "hero".into(),
			description: None,
			schema: schema.into(),
		}
	}

	#[test]
	fn test_definition_default_content() {
		let definition = ComponentDefinition::from(row(
			r#"{"type":"object","default":{"heading":"Welcome"}}"#,
		));

		assert_eq!(definition.schema["type"], "object");
		assert_eq!(definition.default_content, json!({ "heading": "Welcome" }));
	}

	#[test]
	fn test_definition_without_default() {
		let definition = ComponentDefinition::from(row(r#"{"type":"object"}"#));

		assert_eq!(definition.default_content, json!({}));
	}

	#[test]
	fn test_definition_with_broken_schema() {
		let definition = ComponentDefinition::from(row("{not json"));

		assert_eq!(definition.schema, json!({}));
		assert_eq!(definition.default_content, json!({}));
	}
}
