use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;

use crate::{content::reconcile, error, AppState};

pub mod model;
pub mod route;

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
	#[error("applied {} of {} changes: {reason}", .applied.len(), .applied.len() + .pending.len())]
	PartialFailure {
		applied: Vec<String>,
		pending: Vec<reconcile::Pending>,
		reason: String,
	},
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(list_pages, list_pages_docs))
		.api_route(
			"/:id",
			get_with(get_page, get_page_docs).put_with(update_page, update_page_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPage(..) => StatusCode::NOT_FOUND,
			Self::Conflict { .. } => StatusCode::CONFLICT,
			Self::DuplicateBlock(..) => StatusCode::BAD_REQUEST,
			Self::PartialFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn into_message(self) -> error::Message<'static> {
		match self {
			Self::UnknownPage(ref page) => {
				error::Message::new(self.to_string()).detail("page", page)
			}
			Self::Conflict { current, .. } => error::Message::new(
				"the page was changed by someone else, reload it before saving",
			)
			.detail("version", current),
			Self::DuplicateBlock(ref block) => {
				error::Message::new(self.to_string()).detail("block", block)
			}
			Self::PartialFailure {
				applied, pending, ..
			} => error::Message::new(
				"the page was only partially saved, reload it before retrying",
			)
			.detail("applied", applied)
			.detail("pending", pending),
		}
	}
}

impl From<reconcile::Error> for RouteError {
	fn from(error: reconcile::Error) -> Self {
		match error {
			reconcile::Error::UnknownPage(page) => Error::UnknownPage(page).into(),
			reconcile::Error::Conflict {
				page,
				expected,
				current,
			} => Error::Conflict {
				page,
				expected,
				current,
			}
			.into(),
			reconcile::Error::DuplicateBlock(block) => Error::DuplicateBlock(block).into(),
			reconcile::Error::Partial {
				applied,
				pending,
				source,
			} => Error::PartialFailure {
				applied,
				pending,
				reason: source.to_string(),
			}
			.into(),
			reconcile::Error::Database(error) => error.into(),
			reconcile::Error::Payload(error) => error.into(),
		}
	}
}
