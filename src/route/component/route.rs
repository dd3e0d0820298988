use axum::extract::State;
use macros::route;

use crate::{
	content::catalog,
	extract::{Editor, Json},
	openapi::tag,
	Database,
};

use super::{model, RouteError};

/// List components
/// Returns the block types that can be added to a page, with the JSON schema
/// of their content and the content new blocks start with.
#[route(
	tag = tag::COMPONENT,
	response(status = 200, description = "All components.", shape = "Json<model::ComponentList>")
)]
pub async fn list_components(
	State(database): State<Database>,
	_editor: Editor,
) -> Result<Json<model::ComponentList>, RouteError> {
	let components = catalog::list_component_definitions(&database).await?;

	Ok(Json(model::ComponentList { components }))
}
