use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
};
use governor::{clock::QuantaInstant, middleware::RateLimitingMiddleware};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::{KeyExtractor, PeerIpKeyExtractor},
	GovernorError,
};

use crate::error::AppError;

pub type Config =
	Arc<GovernorConfig<PeerIpKeyExtractor, governor::middleware::StateInformationMiddleware>>;

/// Limits for the editor routes: 10 requests per second per peer, with room
/// for the burst of loading a page and its components.
pub fn editor() -> Config {
	Arc::new(
		GovernorConfigBuilder::default()
			.per_millisecond(100)
			.burst_size(50)
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.expect("burst size and period are non-zero"),
	)
}

/// Limits for password logins: one attempt per two seconds per peer, with a
/// small burst for typos.
pub fn login() -> Config {
	Arc::new(
		GovernorConfigBuilder::default()
			.per_second(2)
			.burst_size(5)
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.expect("burst size and period are non-zero"),
	)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	AppError::from(error).into_response()
}

/// Periodically drops the state of peers that have not been seen recently.
pub fn cleanup_old_limits<T, M>(configs: &[&Arc<GovernorConfig<T, M>>])
where
	T: KeyExtractor,
	<T as KeyExtractor>::Key: Send + Sync + 'static,
	M: RateLimitingMiddleware<QuantaInstant> + Send + Sync + 'static,
{
	let limiters = configs
		.iter()
		.map(|config| config.limiter().clone())
		.collect::<Vec<_>>();
	let interval = Duration::from_secs(60);

	std::thread::spawn(move || loop {
		std::thread::sleep(interval);

		for limiter in &limiters {
			tracing::debug!(size = limiter.len(), "rate limiting storage size");

			limiter.retain_recent();
		}
	});
}
