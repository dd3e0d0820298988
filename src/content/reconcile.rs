//! Replaces the full block list of a page with a desired one.
//!
//! The desired list is diffed against the stored blocks into a change set
//! (see [`plan`]), which is then applied one block at a time. Each change
//! writes its payload file immediately before its row, inside a transaction
//! that holds the page row lock for the whole request.
//!
//! Files and rows cannot be committed atomically together:
//!
//! - if a file operation fails, the changes applied so far are committed and
//!   [`Error::Partial`] lists what was and was not applied;
//! - if a row operation fails, the transaction rolls back and the files
//!   created by the request are removed again. Payloads of existing blocks
//!   that were already overwritten keep their new content.

use std::{
	collections::{HashMap, HashSet},
	time::Instant,
};

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{
	catalog,
	data::ContentData,
	model::ContentBlock,
	payload::{PayloadError, PayloadStore},
};
use crate::Database;

/// New values for the page row itself.
#[derive(Debug, Clone)]
pub struct PageUpdate {
	pub title: String,
	pub description: Option<String>,
	pub meta_title: Option<String>,
	pub meta_description: Option<String>,
	pub is_published: bool,
	/// The version the editor loaded. `None` skips the concurrency check.
	pub version: Option<i32>,
}

/// One entry of the desired block list.
#[derive(Debug, Clone, Default)]
pub struct DesiredBlock {
	/// The id of an existing block. Unknown ids are treated as new blocks.
	pub id: Option<String>,
	pub section_id: Option<String>,
	/// New payload. For existing blocks `None` leaves the payload as is.
	pub data: Option<Value>,
	pub is_published: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
	Update {
		id: String,
		file_path: String,
		position: i32,
		section_id: Option<String>,
		data: Option<Value>,
		is_published: bool,
	},
	Create {
		id: String,
		file_path: String,
		position: i32,
		section_id: Option<String>,
		data: Value,
		is_published: bool,
	},
	Remove {
		id: String,
		file_path: String,
	},
}

impl Change {
	pub fn id(&self) -> &str {
		match self {
			Self::Update { id, .. } | Self::Create { id, .. } | Self::Remove { id, .. } => id,
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown page {0}")]
	UnknownPage(String),
	#[error("page {page} is at version {current}, not {expected}")]
	Conflict {
		page: String,
		expected: i32,
		current: i32,
	},
	#[error("block {0} appears more than once")]
	DuplicateBlock(String),
	#[error("applied {} of {} changes: {source}", .applied.len(), .applied.len() + .pending.len())]
	Partial {
		applied: Vec<String>,
		pending: Vec<Pending>,
		#[source]
		source: PayloadError,
	},
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("payload error: {0}")]
	Payload(#[from] PayloadError),
}

/// A change that was not applied because an earlier one failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Pending {
	/// The block id. For a block that would have been created, this id was
	/// allocated by the server and is not known to the client.
	pub id: String,
	/// The index of the block in the desired list. Absent for removals.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub position: Option<i32>,
	/// Whether the block would have been created.
	pub new: bool,
}

impl From<&Change> for Pending {
	fn from(change: &Change) -> Self {
		match change {
			Change::Update { id, position, .. } => Self {
				id: id.clone(),
				position: Some(*position),
				new: false,
			},
			Change::Create { id, position, .. } => Self {
				id: id.clone(),
				position: Some(*position),
				new: true,
			},
			Change::Remove { id, .. } => Self {
				id: id.clone(),
				position: None,
				new: false,
			},
		}
	}
}

/// The result of a successful reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
	/// The page version after the update.
	pub version: i32,
	pub created: usize,
	pub updated: usize,
	pub removed: usize,
}

/// The value to store for a payload of the given component type.
fn normalize(section: Option<&str>, data: Value) -> Value {
	ContentData::parse(section, data).into_value()
}

/// Computes the changes that turn `existing` into `desired`.
///
/// Positions are the indices in `desired`. Creates and updates come first in
/// list order, followed by the removal of every existing block that is no
/// longer referenced. `defaults` maps a component name to the content used
/// for new blocks that come without data.
pub fn plan(
	page_id: &str,
	existing: &[ContentBlock],
	desired: Vec<DesiredBlock>,
	defaults: &HashMap<String, Value>,
	mut allocate: impl FnMut() -> String,
) -> Result<Vec<Change>, Error> {
	let mut seen = HashSet::new();

	for id in desired.iter().filter_map(|block| block.id.as_deref()) {
		if !seen.insert(id) {
			return Err(Error::DuplicateBlock(id.into()));
		}
	}

	let by_id = existing
		.iter()
		.map(|block| (block.id.as_str(), block))
		.collect::<HashMap<_, _>>();

	let mut kept = HashSet::new();
	let mut changes = Vec::with_capacity(desired.len() + existing.len());

	for (index, block) in desired.into_iter().enumerate() {
		let position = i32::try_from(index).unwrap_or(i32::MAX);
		let current = block.id.as_deref().and_then(|id| by_id.get(id));

		let change = if let Some(current) = current {
			kept.insert(current.id.as_str());

			let section = block.section_id.as_deref().or(current.section_id.as_deref());
			let data = block.data.map(|data| normalize(section, data));

			Change::Update {
				id: current.id.clone(),
				file_path: current.file_path.clone(),
				position,
				section_id: block.section_id,
				data,
				is_published: block.is_published,
			}
		} else {
			let id = allocate();
			let data = match block.data {
				Some(data) => data,
				None => block
					.section_id
					.as_ref()
					.and_then(|section| defaults.get(section))
					.cloned()
					.unwrap_or_else(|| Value::Object(Default::default())),
			};

			Change::Create {
				file_path: PayloadStore::block_path(page_id, &id)?,
				data: normalize(block.section_id.as_deref(), data),
				id,
				position,
				section_id: block.section_id,
				is_published: block.is_published,
			}
		};

		changes.push(change);
	}

	changes.extend(
		existing
			.iter()
			.filter(|block| !kept.contains(block.id.as_str()))
			.map(|block| Change::Remove {
				id: block.id.clone(),
				file_path: block.file_path.clone(),
			}),
	);

	Ok(changes)
}

/// Applies a single change: payload file first, then its row.
async fn apply(
	conn: &mut PgConnection,
	payloads: &PayloadStore,
	page_id: &str,
	editor: Uuid,
	change: &Change,
) -> Result<(), Error> {
	match change {
		Change::Update {
			id,
			file_path,
			position,
			section_id,
			data,
			is_published,
		} => {
			if let Some(data) = data {
				payloads.write(file_path, data).await?;
			}

			sqlx::query(
				r#"
					UPDATE page_content
					SET position = $2, section_id = COALESCE($3, section_id), is_published = $4,
						updated_by = $5, updated_at = now()
					WHERE id = $1
				"#,
			)
			.bind(id)
			.bind(position)
			.bind(section_id)
			.bind(is_published)
			.bind(editor)
			.execute(&mut *conn)
			.await?;
		}
		Change::Create {
			id,
			file_path,
			position,
			section_id,
			data,
			is_published,
		} => {
			payloads.write(file_path, data).await?;

			let inserted = sqlx::query(
				r#"
					INSERT INTO page_content
						(id, page_id, section_id, file_path, position, is_published, created_by, updated_by)
					VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
				"#,
			)
			.bind(id)
			.bind(page_id)
			.bind(section_id)
			.bind(file_path)
			.bind(position)
			.bind(is_published)
			.bind(editor)
			.execute(&mut *conn)
			.await;

			if let Err(error) = inserted {
				discard(payloads, [file_path.as_str()]).await;
				return Err(error.into());
			}
		}
		Change::Remove { id, file_path } => {
			payloads.remove(file_path).await?;

			sqlx::query("DELETE FROM page_content WHERE id = $1")
				.bind(id)
				.execute(&mut *conn)
				.await?;
		}
	}

	Ok(())
}

/// Best-effort removal of payload files whose rows were never committed.
async fn discard<'a>(payloads: &PayloadStore, paths: impl IntoIterator<Item = &'a str>) {
	for path in paths {
		if let Err(error) = payloads.remove(path).await {
			tracing::warn!(%error, path, "could not remove orphaned payload");
		}
	}
}

/// Replaces the metadata and block list of a page.
#[tracing::instrument(skip_all, fields(page = %page_id, editor = %editor))]
pub async fn reconcile(
	database: &Database,
	payloads: &PayloadStore,
	page_id: &str,
	update: PageUpdate,
	desired: Vec<DesiredBlock>,
	editor: Uuid,
) -> Result<Outcome, Error> {
	let started = Instant::now();
	let mut tx = database.begin().await?;

	let current =
		sqlx::query_scalar::<_, i32>("SELECT version FROM pages WHERE id = $1 FOR UPDATE")
			.bind(page_id)
			.fetch_optional(&mut *tx)
			.await?
			.ok_or_else(|| Error::UnknownPage(page_id.into()))?;

	if let Some(expected) = update.version {
		if expected != current {
			return Err(Error::Conflict {
				page: page_id.into(),
				expected,
				current,
			});
		}
	}

	let existing = catalog::list_blocks(&mut *tx, page_id).await?;
	let defaults = catalog::list_component_definitions(&mut *tx)
		.await?
		.into_iter()
		.map(|definition| (definition.name, definition.default_content))
		.collect::<HashMap<_, _>>();

	let changes = plan(page_id, &existing, desired, &defaults, || {
		Uuid::new_v4().to_string()
	})?;

	let version = sqlx::query_scalar::<_, i32>(
		r#"
			UPDATE pages
			SET title = $2, description = $3, meta_title = $4, meta_description = $5,
				is_published = $6, updated_by = $7, updated_at = now(), version = version + 1
			WHERE id = $1
			RETURNING version
		"#,
	)
	.bind(page_id)
	.bind(&update.title)
	.bind(&update.description)
	.bind(&update.meta_title)
	.bind(&update.meta_description)
	.bind(update.is_published)
	.bind(editor)
	.fetch_one(&mut *tx)
	.await?;

	let mut outcome = Outcome {
		version,
		created: 0,
		updated: 0,
		removed: 0,
	};
	let mut applied = Vec::with_capacity(changes.len());
	let mut created = Vec::new();

	for (index, change) in changes.iter().enumerate() {
		match apply(&mut tx, payloads, page_id, editor, change).await {
			Ok(()) => {}
			Err(Error::Payload(source)) => {
				let pending = changes[index..].iter().map(Pending::from).collect();

				if let Err(error) = tx.commit().await {
					discard(payloads, created).await;
					return Err(error.into());
				}

				tracing::warn!(applied = applied.len(), %source, "reconcile stopped early");

				return Err(Error::Partial {
					applied,
					pending,
					source,
				});
			}
			Err(error) => {
				drop(tx);
				discard(payloads, created).await;
				return Err(error);
			}
		}

		match change {
			Change::Update { .. } => outcome.updated += 1,
			Change::Create { file_path, .. } => {
				outcome.created += 1;
				created.push(file_path.as_str());
			}
			Change::Remove { .. } => outcome.removed += 1,
		}

		applied.push(change.id().to_owned());
	}

	if let Err(error) = tx.commit().await {
		discard(payloads, created).await;
		return Err(error.into());
	}

	tracing::info!(
		histogram.reconcile_latency_ms = started.elapsed().as_secs_f64() * 1000.0,
		version,
		created = outcome.created,
		updated = outcome.updated,
		removed = outcome.removed,
		"reconciled page"
	);

	Ok(outcome)
}

#[cfg(test)]
mod test {
	use serde_json::json;

	use super::*;

	fn block(id: &str, position: i32, section: &str) -> ContentBlock {
		ContentBlock {
			id: id.into(),
			page_id: "home".into(),
			section_id: Some(section.into()),
			file_path: format!("pages/home/{id}.json"),
			position,
			is_published: true,
			created_at: chrono::Utc::now(),
			updated_at: chrono::Utc::now(),
			created_by: None,
			updated_by: None,
		}
	}

	fn desired(id: Option<&str>, section: &str, data: Option<Value>) -> DesiredBlock {
		DesiredBlock {
			id: id.map(Into::into),
			section_id: Some(section.into()),
			data,
			is_published: true,
		}
	}

	fn counter() -> impl FnMut() -> String {
		let mut next = 0;

		move || {
			next += 1;
			format!("new{next}")
		}
	}

	fn positions(changes: &[Change]) -> Vec<(&str, i32)> {
		changes
			.iter()
			.filter_map(|change| match change {
				Change::Update { id, position, .. } | Change::Create { id, position, .. } => {
					Some((id.as_str(), *position))
				}
				Change::Remove { .. } => None,
			})
			.collect()
	}

	#[test]
	fn test_position_follows_list_order() {
		let existing = [block("a", 0, "x"), block("b", 1, "x"), block("c", 2, "x")];
		let changes = plan(
			"home",
			&existing,
			vec![
				desired(Some("b"), "x", None),
				desired(Some("a"), "x", None),
				desired(Some("c"), "x", None),
			],
			&HashMap::new(),
			counter(),
		)
		.unwrap();

		assert_eq!(positions(&changes), [("b", 0), ("a", 1), ("c", 2)]);
		assert_eq!(changes.len(), 3);
	}

	#[test]
	fn test_home_scenario() {
		let existing = [block("h1", 0, "hero")];
		let changes = plan(
			"home",
			&existing,
			vec![
				desired(Some("h1"), "hero", Some(json!({ "heading": "Y" }))),
				desired(None, "text", Some(json!({ "body": "new" }))),
			],
			&HashMap::new(),
			counter(),
		)
		.unwrap();

		assert_eq!(
			changes,
			[
				Change::Update {
					id: "h1".into(),
					file_path: "pages/home/h1.json".into(),
					position: 0,
					section_id: Some("hero".into()),
					data: Some(json!({ "heading": "Y" })),
					is_published: true,
				},
				Change::Create {
					id: "new1".into(),
					file_path: "pages/home/new1.json".into(),
					position: 1,
					section_id: Some("text".into()),
					data: json!({ "body": "new" }),
					is_published: true,
				},
			]
		);
	}

	#[test]
	fn test_unknown_id_gets_a_fresh_id() {
		let changes = plan(
			"home",
			&[],
			vec![desired(Some("made-up"), "x", Some(json!({})))],
			&HashMap::new(),
			counter(),
		)
		.unwrap();

		assert!(matches!(&changes[0], Change::Create { id, .. } if id == "new1"));
	}

	#[test]
	fn test_omitted_blocks_are_removed_last() {
		let existing = [block("a", 0, "x"), block("b", 1, "x")];
		let changes = plan(
			"home",
			&existing,
			vec![desired(None, "x", None), desired(Some("b"), "x", None)],
			&HashMap::new(),
			counter(),
		)
		.unwrap();

		assert_eq!(positions(&changes), [("new1", 0), ("b", 1)]);
		assert_eq!(
			changes.last(),
			Some(&Change::Remove {
				id: "a".into(),
				file_path: "pages/home/a.json".into(),
			})
		);
	}

	#[test]
	fn test_empty_list_removes_everything() {
		let existing = [block("a", 0, "x"), block("b", 1, "x")];
		let changes = plan("home", &existing, Vec::new(), &HashMap::new(), counter()).unwrap();

		assert_eq!(changes.len(), 2);
		assert!(changes
			.iter()
			.all(|change| matches!(change, Change::Remove { .. })));
	}

	#[test]
	fn test_duplicate_ids_are_rejected() {
		let existing = [block("a", 0, "x")];
		let result = plan(
			"home",
			&existing,
			vec![desired(Some("a"), "x", None), desired(Some("a"), "x", None)],
			&HashMap::new(),
			counter(),
		);

		assert!(matches!(result, Err(Error::DuplicateBlock(id)) if id == "a"));
	}

	#[test]
	fn test_new_blocks_use_component_defaults() {
		let defaults = HashMap::from([("hero".to_owned(), json!({ "heading": "Welcome" }))]);
		let changes = plan(
			"home",
			&[],
			vec![desired(None, "hero", None), desired(None, "gallery", None)],
			&defaults,
			counter(),
		)
		.unwrap();

		assert!(
			matches!(&changes[0], Change::Create { data, .. } if *data == json!({ "heading": "Welcome" }))
		);
		assert!(matches!(&changes[1], Change::Create { data, .. } if *data == json!({})));
	}

	#[test]
	fn test_empty_typed_payloads_are_accepted() {
		let existing = [block("h1", 0, "hero")];
		let changes = plan(
			"home",
			&existing,
			vec![
				desired(Some("h1"), "hero", Some(json!({}))),
				desired(None, "hero", None),
				desired(None, "text", None),
			],
			&HashMap::new(),
			counter(),
		)
		.unwrap();

		assert!(matches!(&changes[0], Change::Update { data: Some(data), .. } if *data == json!({})));
		assert!(matches!(&changes[1], Change::Create { data, .. } if *data == json!({})));
		assert!(matches!(&changes[2], Change::Create { data, .. } if *data == json!({})));
	}

	#[test]
	fn test_mismatched_payload_is_stored_as_given() {
		let existing = [block("h1", 0, "hero")];
		let desired = DesiredBlock {
			id: Some("h1".into()),
			section_id: None,
			data: Some(json!({ "body": "not a hero" })),
			is_published: true,
		};

		let changes = plan("home", &existing, vec![desired], &HashMap::new(), counter()).unwrap();

		assert!(
			matches!(&changes[0], Change::Update { data: Some(data), .. } if *data == json!({ "body": "not a hero" }))
		);
	}

	#[test]
	fn test_pending_changes_keep_their_position() {
		let changes = [
			Change::Update {
				id: "h1".into(),
				file_path: "pages/home/h1.json".into(),
				position: 0,
				section_id: None,
				data: None,
				is_published: true,
			},
			Change::Create {
				id: "new1".into(),
				file_path: "pages/home/new1.json".into(),
				position: 1,
				section_id: None,
				data: json!({}),
				is_published: true,
			},
			Change::Remove {
				id: "old".into(),
				file_path: "pages/home/old.json".into(),
			},
		];

		let pending = changes.iter().map(Pending::from).collect::<Vec<_>>();

		assert_eq!(pending[0].position, Some(0));
		assert!(!pending[0].new);
		assert_eq!(pending[1].position, Some(1));
		assert!(pending[1].new);
		assert_eq!(pending[2].position, None);
		assert_eq!(
			serde_json::to_value(&pending[2]).unwrap(),
			json!({ "id": "old", "new": false })
		);
	}

	#[tokio::test]
	async fn test_discard_removes_created_files() {
		let dir = tempfile::tempdir().unwrap();
		let payloads = PayloadStore::open(dir.path()).await.unwrap();

		payloads.write("pages/home/new1.json", &json!({})).await.unwrap();
		payloads.write("pages/home/new2.json", &json!({})).await.unwrap();
		payloads.write("pages/home/kept.json", &json!({})).await.unwrap();

		discard(
			&payloads,
			["pages/home/new1.json", "pages/home/new2.json", "pages/home/missing.json"],
		)
		.await;

		assert!(!payloads.exists("pages/home/new1.json").await);
		assert!(!payloads.exists("pages/home/new2.json").await);
		assert!(payloads.exists("pages/home/kept.json").await);
	}

	#[test]
	fn test_unsafe_page_id_is_refused() {
		let result = plan(
			"../home",
			&[],
			vec![desired(None, "x", None)],
			&HashMap::new(),
			counter(),
		);

		assert!(matches!(result, Err(Error::Payload(..))));
	}
}
