use std::{net::IpAddr, path::PathBuf};

use axum::http::{header::InvalidHeaderValue, HeaderValue};
use clap::Parser;

use crate::session::MIN_SECRET_LENGTH;

/// Content API behind the site's visual editor.
///
/// Every option can also be set through the environment, or through a `.env`
/// file in the working directory.
#[derive(Parser, Debug, Clone)]
#[command(name = "editor-api", version)]
pub struct Config {
	/// Postgres connection string.
	#[arg(long, env = "DATABASE_URL")]
	pub database_url: String,

	/// Address to listen on.
	#[arg(long, env = "HOST", default_value = "127.0.0.1")]
	pub host: IpAddr,

	/// Port to listen on.
	#[arg(long, env = "PORT", default_value_t = 3000)]
	pub port: u16,

	/// Secret used to sign session tokens. At least 32 characters.
	#[arg(long, env = "JWT_SECRET", hide_env_values = true)]
	pub jwt_secret: String,

	/// How long a session token stays valid, in hours.
	#[arg(long, env = "TOKEN_TTL_HOURS", default_value_t = 24)]
	pub token_ttl_hours: i64,

	/// Directory holding the JSON payload files.
	#[arg(long, env = "CONTENT_DIR", default_value = "content")]
	pub content_dir: PathBuf,

	/// Origin allowed to call the API from a browser. Any origin if unset.
	#[arg(long, env = "CORS_ORIGIN", value_parser = parse_origin)]
	pub cors_origin: Option<HeaderValue>,

	/// OTLP collector endpoint. Traces and metrics are only exported if set.
	#[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
	pub otlp_endpoint: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("JWT_SECRET must be at least {} characters", MIN_SECRET_LENGTH)]
	WeakSecret,
	#[error("TOKEN_TTL_HOURS must be positive")]
	InvalidTtl,
}

fn parse_origin(origin: &str) -> Result<HeaderValue, InvalidHeaderValue> {
	HeaderValue::from_str(origin.trim_end_matches('/'))
}

impl Config {
	/// Loads `.env` (if present), then parses arguments and the environment.
	pub fn load() -> Result<Self, ConfigError> {
		dotenvy::dotenv().ok();

		Self::parse().validated()
	}

	fn validated(self) -> Result<Self, ConfigError> {
		if self.jwt_secret.len() < MIN_SECRET_LENGTH {
			return Err(ConfigError::WeakSecret);
		}

		if self.token_ttl_hours <= 0 {
			return Err(ConfigError::InvalidTtl);
		}

		Ok(self)
	}

	pub fn token_ttl(&self) -> chrono::Duration {
		chrono::Duration::hours(self.token_ttl_hours)
	}

	/// The value of `Access-Control-Allow-Origin`.
	pub fn origin(&self) -> HeaderValue {
		self.cors_origin
			.clone()
			.unwrap_or_else(|| HeaderValue::from_static("*"))
	}
}
