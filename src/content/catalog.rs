//! Relational half of the content store.

use sqlx::PgExecutor;

use super::model::{ComponentDefinition, ContentBlock, Page, SectionRow, Template, User};

pub async fn find_user_by_email(
	executor: impl PgExecutor<'_>,
	email: &str,
) -> Result<Option<User>, sqlx::Error> {
	sqlx::query_as::<_, User>(
		r#"
			SELECT id, email, password, is_admin FROM users
			WHERE email = $1
		"#,
	)
	.bind(email)
	.fetch_optional(executor)
	.await
}

/// Lists every page, most recently updated first.
pub async fn list_pages(executor: impl PgExecutor<'_>) -> Result<Vec<Page>, sqlx::Error> {
	sqlx::query_as::<_, Page>(
		r#"
			SELECT * FROM pages
			ORDER BY updated_at DESC, id
		"#,
	)
	.fetch_all(executor)
	.await
}

pub async fn get_page(
	executor: impl PgExecutor<'_>,
	page_id: &str,
) -> Result<Option<Page>, sqlx::Error> {
	sqlx::query_as::<_, Page>("SELECT * FROM pages WHERE id = $1")
		.bind(page_id)
		.fetch_optional(executor)
		.await
}

/// Lists the blocks of a page in render order.
pub async fn list_blocks(
	executor: impl PgExecutor<'_>,
	page_id: &str,
) -> Result<Vec<ContentBlock>, sqlx::Error> {
	sqlx::query_as::<_, ContentBlock>(
		r#"
			SELECT * FROM page_content
			WHERE page_id = $1
			ORDER BY position ASC, created_at ASC
		"#,
	)
	.bind(page_id)
	.fetch_all(executor)
	.await
}

pub async fn list_component_definitions(
	executor: impl PgExecutor<'_>,
) -> Result<Vec<ComponentDefinition>, sqlx::Error> {
	let rows = sqlx::query_as::<_, SectionRow>(
		r#"
			SELECT id, name, description, schema FROM sections
			ORDER BY name
		"#,
	)
	.fetch_all(executor)
	.await?;

	Ok(rows.into_iter().map(ComponentDefinition::from).collect())
}

pub async fn list_templates(executor: impl PgExecutor<'_>) -> Result<Vec<Template>, sqlx::Error> {
	sqlx::query_as::<_, Template>(
		r#"
			SELECT id, name, description, structure_path, created_at, updated_at FROM templates
			ORDER BY name
		"#,
	)
	.fetch_all(executor)
	.await
}
