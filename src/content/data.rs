//! Typed views over block payloads.
//!
//! Payloads are free-form JSON and are never rejected. The shape of the
//! common component types is known, so a payload that fits it is read into
//! its typed form and written back in canonical order. Anything else, an
//! empty object included, is kept as opaque JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Map;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hero {
	pub heading: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subheading: Option<String>,
	#[serde(flatten)]
	pub extra: Map,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
	pub body: String,
	#[serde(flatten)]
	pub extra: Map,
}

/// The content of a block, keyed by its component type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContentData {
	Hero(Hero),
	Text(Text),
	Opaque(Value),
}

impl ContentData {
	/// Interprets `data` according to the block's declared component type,
	/// falling back to [`ContentData::Opaque`] when it does not fit.
	pub fn parse(section: Option<&str>, data: Value) -> Self {
		let typed = match section {
			Some("hero") => Hero::deserialize(&data).map(Self::Hero),
			Some("text") => Text::deserialize(&data).map(Self::Text),
			_ => return Self::Opaque(data),
		};

		typed.unwrap_or_else(|error| {
			tracing::debug!(section, %error, "payload kept as opaque json");
			Self::Opaque(data)
		})
	}

	pub fn into_value(self) -> Value {
		match self {
			Self::Opaque(value) => value,
			typed => serde_json::to_value(typed).unwrap_or(Value::Null),
		}
	}
}

#[cfg(test)]
mod test {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_parse_hero() {
		let data = ContentData::parse(Some("hero"), json!({ "heading": "X", "image": "a.png" }));

		let ContentData::Hero(hero) = &data else {
			panic!("expected hero, got {data:?}");
		};

		assert_eq!(hero.heading, "X");
		assert_eq!(hero.extra["image"], "a.png");
		assert_eq!(
			data.into_value(),
			json!({ "heading": "X", "image": "a.png" })
		);
	}

	#[test]
	fn test_parse_text() {
		let data = ContentData::parse(Some("text"), json!({ "body": "new" }));

		assert!(matches!(data, ContentData::Text(Text { ref body, .. }) if body == "new"));
	}

	#[test]
	fn test_empty_payload_is_kept() {
		for section in ["hero", "text"] {
			let data = ContentData::parse(Some(section), json!({}));

			assert_eq!(data, ContentData::Opaque(json!({})));
			assert_eq!(data.into_value(), json!({}));
		}
	}

	#[test]
	fn test_mismatched_payload_is_kept() {
		let value = json!({ "body": "not a hero", "heading": 3 });
		let data = ContentData::parse(Some("hero"), value.clone());

		assert_eq!(data.into_value(), value);
	}

	#[test]
	fn test_unknown_types_are_opaque() {
		let value = json!(["anything", 1, null]);
		let data = ContentData::parse(Some("carousel"), value.clone());

		assert_eq!(data, ContentData::Opaque(value.clone()));
		assert_eq!(ContentData::parse(None, value.clone()).into_value(), value);
	}
}
