use axum::extract::State;
use macros::route;

use crate::{
	content::catalog,
	extract::{Editor, Json},
	openapi::tag,
	AppState,
};

use super::{model, RouteError};

/// List templates
/// Returns every page template together with its structure.
#[route(
	tag = tag::TEMPLATE,
	response(status = 200, description = "All templates.", shape = "Json<model::TemplateList>")
)]
pub async fn list_templates(
	State(state): State<AppState>,
	_editor: Editor,
) -> Result<Json<model::TemplateList>, RouteError> {
	let mut templates = Vec::new();

	for template in catalog::list_templates(&state.database).await? {
		let structure = state.payloads.read(&template.structure_path).await;

		templates.push(model::TemplateWithStructure {
			template,
			structure,
		});
	}

	Ok(Json(model::TemplateList { templates }))
}
