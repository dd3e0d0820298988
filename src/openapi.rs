use aide::{
	openapi::{SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json};

pub const SECURITY_SCHEME_BEARER: &str = "Bearer";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const PAGE: &str = "Page";
	pub const COMPONENT: &str = "Component";
	pub const TEMPLATE: &str = "Template";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Editor API")
		.summary("Content API behind the site's visual editor")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::AUTH.into(),
			description: Some("Editor authentication".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::PAGE.into(),
			description: Some("Pages and their content blocks".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::COMPONENT.into(),
			description: Some("Available block types".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::TEMPLATE.into(),
			description: Some("Page templates".into()),
			..Default::default()
		})
		.security_scheme(
			SECURITY_SCHEME_BEARER,
			SecurityScheme::Http {
				scheme: "bearer".into(),
				bearer_format: Some("JWT".into()),
				description: Some("A session token issued by `POST /auth`".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::Message<'static>>, _>(|res| {
			res.example(
				error::Message::new("error message").detail("key", "optional details"),
			)
		})
}
