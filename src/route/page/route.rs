use axum::extract::State;
use macros::route;

use crate::{
	content::{catalog, reconcile},
	extract::{Editor, Json, Path},
	openapi::tag,
	AppState, Database,
};

use super::{model, Error, RouteError};

/// List pages
/// Returns every page, most recently updated first.
#[route(
	tag = tag::PAGE,
	response(status = 200, description = "All pages.", shape = "Json<model::PageList>")
)]
pub async fn list_pages(
	State(database): State<Database>,
	_editor: Editor,
) -> Result<Json<model::PageList>, RouteError> {
	let pages = catalog::list_pages(&database).await?;

	Ok(Json(model::PageList { pages }))
}

/// Get page
/// Returns a page with its content blocks in render order. A block whose
/// payload file is missing or unreadable is returned with empty data.
#[route(
	tag = tag::PAGE,
	response(status = 200, description = "The page and its content.", shape = "Json<model::PageWithContent>"),
	error(status = 404, description = "The page does not exist.")
)]
pub async fn get_page(
	State(state): State<AppState>,
	_editor: Editor,
	Path(input): Path<model::PageIdInput>,
) -> Result<Json<model::PageWithContent>, RouteError> {
	let page = catalog::get_page(&state.database, &input.id)
		.await?
		.ok_or_else(|| Error::UnknownPage(input.id.clone()))?;

	let blocks = catalog::list_blocks(&state.database, &page.id).await?;
	let mut content = Vec::with_capacity(blocks.len());

	for block in blocks {
		let data = state.payloads.read(&block.file_path).await;

		content.push(model::BlockWithData { block, data });
	}

	Ok(Json(model::PageWithContent { page, content }))
}

/// Update page
/// Replaces the metadata and the full block list of a page. Blocks are
/// positioned by their index in `content`, blocks without a known id are
/// created, and existing blocks missing from `content` are deleted.
#[route(
	tag = tag::PAGE,
	response(status = 200, description = "The page was saved.", shape = "Json<model::UpdatePageOutput>"),
	error(status = 400, description = "The request is invalid or lists a block twice."),
	error(status = 404, description = "The page does not exist."),
	error(status = 409, description = "The page was changed since `version`."),
	error(status = 500, description = "The page was only partially saved, see `details`.")
)]
pub async fn update_page(
	State(state): State<AppState>,
	editor: Editor,
	Path(input): Path<model::PageIdInput>,
	Json(update): Json<model::UpdatePageInput>,
) -> Result<Json<model::UpdatePageOutput>, RouteError> {
	let (update, desired) = update.into_parts();

	let outcome = reconcile::reconcile(
		&state.database,
		&state.payloads,
		&input.id,
		update,
		desired,
		editor.identity.id,
	)
	.await?;

	tracing::info!(
		page = %input.id,
		editor = %editor.identity.email,
		version = outcome.version,
		created = outcome.created,
		updated = outcome.updated,
		removed = outcome.removed,
		"page saved"
	);

	Ok(Json(model::UpdatePageOutput {
		success: true,
		version: outcome.version,
	}))
}
