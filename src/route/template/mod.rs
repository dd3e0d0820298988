use std::convert::Infallible;

use aide::axum::{routing::get_with, ApiRouter};

use crate::{error, AppState};

pub mod model;
pub mod route;

pub type RouteError = error::RouteError<Infallible>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route("/", get_with(list_templates, list_templates_docs))
}
