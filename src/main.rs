#![warn(clippy::pedantic)]

mod config;
mod content;
mod error;
mod extract;
mod middleware;
mod openapi;
mod ratelimit;
mod route;
mod session;
mod trace;


use std::{net::SocketAddr, sync::Arc};

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{http::HeaderValue, Extension, Router};
use tower_governor::GovernorLayer;
use tower_http::{
	cors::{AllowOrigin, CorsLayer},
	trace::TraceLayer,
};

use crate::{content::PayloadStore, session::Tokens};

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

/// The shared application state.
///
/// Handlers take the parts they need, e.g. `State<Database>`, since every
/// field can be extracted on its own.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub tokens: Tokens,
	pub payloads: PayloadStore,
}

/// Per-peer rate limits. Requires the peer address, so the router must be
/// served with `into_make_service_with_connect_info`.
pub struct Limits {
	pub login: ratelimit::Config,
	pub editor: ratelimit::Config,
}

/// Builds the full router, including the `OpenAPI` document at `/docs`.
pub fn app(state: State, origin: HeaderValue, limits: Option<Limits>) -> Router {
	aide::gen::extract_schemas(true);

	let mut api = OpenApi::default();

	let mut auth = route::auth::routes();
	let mut editor = ApiRouter::new()
		.nest("/pages", route::page::routes())
		.nest("/components", route::component::routes())
		.nest("/templates", route::template::routes());

	if let Some(limits) = limits {
		auth = auth.layer(GovernorLayer {
			config: limits.login,
		});
		editor = editor.layer(GovernorLayer {
			config: limits.editor,
		});
	}

	let cors = if origin == "*" {
		AllowOrigin::any()
	} else {
		AllowOrigin::exact(origin.clone())
	};

	ApiRouter::new()
		.nest("/auth", auth)
		.merge(editor)
		.nest("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.fallback(error::not_found)
		.layer(Extension(Arc::new(api)))
		.layer(axum::middleware::from_fn(middleware::method_not_allowed))
		.layer(
			CorsLayer::new()
				.allow_origin(cors)
				.allow_methods([
					axum::http::Method::GET,
					axum::http::Method::POST,
					axum::http::Method::PUT,
					axum::http::Method::OPTIONS,
				])
				.allow_headers([
					axum::http::header::AUTHORIZATION,
					axum::http::header::CONTENT_TYPE,
				]),
		)
		.layer(axum::middleware::from_fn_with_state(
			origin,
			middleware::preflight,
		))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let config = config::Config::load()?;
	let _guard = trace::init_tracing_subscriber(config.otlp_endpoint.as_deref())?;

	let database = Database::connect(&config.database_url).await?;

	sqlx::migrate!().run(&database).await?;

	let state = State {
		database,
		hasher: Argon2::default(),
		tokens: Tokens::new(&config.jwt_secret, config.token_ttl()),
		payloads: PayloadStore::open(&config.content_dir).await?,
	};

	let limits = Limits {
		login: ratelimit::login(),
		editor: ratelimit::editor(),
	};

	ratelimit::cleanup_old_limits(&[&limits.login, &limits.editor]);

	let app = app(state, config.origin(), Some(limits));
	let listener = tokio::net::TcpListener::bind((config.host, config.port)).await?;

	tracing::info!(address = %listener.local_addr()?, "listening");

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.await?;

	Ok(())
}
