use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};

use crate::{
	error::RouteError,
	openapi::SECURITY_SCHEME_BEARER,
	route::auth,
	session::{Identity, TokenError, Tokens},
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// An authenticated administrator, taken from the bearer token of the request.
///
/// Every editor route requires one, so rejecting a request is a matter of
/// listing `Editor` as an argument:
///
/// - no `Authorization` header, a non-bearer scheme, or a token that fails
///   verification is rejected with [`auth::Error::Unauthenticated`];
/// - an expired token is rejected with [`auth::Error::Expired`];
/// - a valid token without the administrator flag is rejected with
///   [`auth::Error::Forbidden`].
///
/// ```rust
/// async fn route(editor: Editor) {
///   println!("{}", editor.identity.email);
/// }
/// ```
#[derive(Debug)]
pub struct Editor {
	pub identity: Identity,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Editor
where
	Tokens: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let token = parts
			.headers
			.get(header::AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.strip_prefix(AUTHORIZATION_PREFIX))
			.map(str::trim)
			.filter(|token| !token.is_empty())
			.ok_or(auth::Error::Unauthenticated)?;

		let identity = Tokens::from_ref(state)
			.verify(token)
			.map_err(|error| match error {
				TokenError::Expired => auth::Error::Expired,
				TokenError::Invalid(error) => {
					tracing::debug!(%error, "rejected bearer token");
					auth::Error::Unauthenticated
				}
			})?;

		if !identity.is_admin {
			return Err(auth::Error::Forbidden.into());
		}

		Ok(Self { identity })
	}
}

impl OperationInput for Editor {
	/// Adds the bearer token requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.push(
			[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		);
	}
}
