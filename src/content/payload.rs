//! JSON payload files for content blocks and page templates.
//!
//! Every payload lives at a path derived from the identifiers of the entity
//! that owns it, relative to a single content root:
//!
//! - content blocks: `pages/{page_id}/{block_id}.json`
//! - templates: `templates/{template_id}.json`
//!
//! Reads are tolerant: a missing or corrupt file yields an empty object so a
//! single broken block never takes down a whole page.

use std::{
	io,
	path::{Component, Path, PathBuf},
	sync::Arc,
};

use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
	#[error("io error on {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("invalid identifier {0:?} in payload path")]
	InvalidSegment(String),
	#[error("payload path {0:?} escapes the content root")]
	InvalidPath(String),
	#[error("could not encode payload: {0}")]
	Encode(#[from] serde_json::Error),
}

/// The file-backed half of the content store.
#[derive(Debug, Clone)]
pub struct PayloadStore {
	root: Arc<PathBuf>,
}

/// Identifiers become path segments, so only a conservative alphabet is allowed.
fn segment(id: &str) -> Result<&str, PayloadError> {
	let valid = !id.is_empty()
		&& id
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

	if valid {
		Ok(id)
	} else {
		Err(PayloadError::InvalidSegment(id.into()))
	}
}

fn empty() -> Value {
	Value::Object(Default::default())
}

impl PayloadStore {
	/// Opens the store, creating the content root if it does not exist yet.
	pub async fn open(root: impl AsRef<Path>) -> Result<Self, PayloadError> {
		let root = root.as_ref().to_path_buf();

		fs::create_dir_all(&root)
			.await
			.map_err(|source| PayloadError::Io {
				path: root.clone(),
				source,
			})?;

		tracing::info!(path = %root.display(), "opened payload store");

		Ok(Self {
			root: Arc::new(root),
		})
	}

	/// The relative path of a content block's payload.
	pub fn block_path(page_id: &str, block_id: &str) -> Result<String, PayloadError> {
		Ok(format!(
			"pages/{}/{}.json",
			segment(page_id)?,
			segment(block_id)?
		))
	}

	/// The relative path of a template's structure.
	pub fn template_path(template_id: &str) -> Result<String, PayloadError> {
		Ok(format!("templates/{}.json", segment(template_id)?))
	}

	/// Joins a stored relative path onto the root, refusing anything
	/// that could point outside of it.
	fn resolve(&self, relative: &str) -> Result<PathBuf, PayloadError> {
		let path = Path::new(relative);

		if relative.is_empty()
			|| path
				.components()
				.any(|component| !matches!(component, Component::Normal(..)))
		{
			return Err(PayloadError::InvalidPath(relative.into()));
		}

		Ok(self.root.join(path))
	}

	/// Reads a payload. Never fails: anything unreadable becomes `{}`.
	pub async fn read(&self, relative: &str) -> Value {
		let path = match self.resolve(relative) {
			Ok(path) => path,
			Err(error) => {
				warn!(%error, "refusing to read payload");
				return empty();
			}
		};

		let bytes = match fs::read(&path).await {
			Ok(bytes) => bytes,
			Err(error) => {
				warn!(path = %path.display(), %error, "payload file is unreadable");
				return empty();
			}
		};

		serde_json::from_slice(&bytes).unwrap_or_else(|error| {
			warn!(path = %path.display(), %error, "payload file is not valid json");
			empty()
		})
	}

	/// Writes a payload, replacing any previous content.
	///
	/// The content goes to a sibling temporary file first and is then
	/// renamed over the target, so readers never observe a half-written file.
	pub async fn write(&self, relative: &str, data: &Value) -> Result<(), PayloadError> {
		let path = self.resolve(relative)?;
		let bytes = serde_json::to_vec_pretty(data)?;
		let at = |path: &Path| {
			let path = path.to_path_buf();
			move |source: io::Error| PayloadError::Io { path, source }
		};

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).await.map_err(at(parent))?;
		}

		let staging = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));

		fs::write(&staging, &bytes).await.map_err(at(&staging))?;

		if let Err(source) = fs::rename(&staging, &path).await {
			let _ = fs::remove_file(&staging).await;
			return Err(PayloadError::Io { path, source });
		}

		debug!(path = %path.display(), size = bytes.len(), "wrote payload");

		Ok(())
	}

	/// Removes a payload. Returns `false` if the file was already gone.
	pub async fn remove(&self, relative: &str) -> Result<bool, PayloadError> {
		let path = self.resolve(relative)?;

		match fs::remove_file(&path).await {
			Ok(()) => {
				debug!(path = %path.display(), "removed payload");
				Ok(true)
			}
			Err(error) if error.kind() == io::ErrorKind::NotFound => {
				warn!(path = %path.display(), "payload file was already missing");
				Ok(false)
			}
			Err(source) => Err(PayloadError::Io { path, source }),
		}
	}

	/// Whether a payload file currently exists.
	#[cfg(test)]
	pub async fn exists(&self, relative: &str) -> bool {
		match self.resolve(relative) {
			Ok(path) => fs::try_exists(path).await.unwrap_or(false),
			Err(..) => false,
		}
	}
}
