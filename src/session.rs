//! Session credentials: signed, time-limited bearer tokens.
//!
//! Tokens are HS256 JWTs. Nothing is stored server-side, so a token is valid
//! exactly as long as its signature checks out and it has not expired.

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_SECRET_LENGTH: usize = 32;

/// The identity carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Identity {
	pub id: Uuid,
	pub email: String,
	#[serde(rename = "isAdmin")]
	pub is_admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
	#[serde(flatten)]
	identity: Identity,
	iat: i64,
	exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
	#[error("token expired")]
	Expired,
	#[error("invalid token: {0}")]
	Invalid(jsonwebtoken::errors::Error),
}

/// Issues and verifies session tokens with a server-held secret.
#[derive(Clone)]
pub struct Tokens {
	encoding: EncodingKey,
	decoding: DecodingKey,
	ttl: chrono::Duration,
}

impl std::fmt::Debug for Tokens {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Tokens").field("ttl", &self.ttl).finish_non_exhaustive()
	}
}

impl Tokens {
	pub fn new(secret: &str, ttl: chrono::Duration) -> Self {
		Self {
			encoding: EncodingKey::from_secret(secret.as_bytes()),
			decoding: DecodingKey::from_secret(secret.as_bytes()),
			ttl,
		}
	}

	/// Issues a token for `identity`, valid for the configured window.
	pub fn issue(&self, identity: Identity) -> Result<String, jsonwebtoken::errors::Error> {
		let now = chrono::Utc::now();
		let claims = Claims {
			identity,
			iat: now.timestamp(),
			exp: (now + self.ttl).timestamp(),
		};

		encode(&Header::default(), &claims, &self.encoding)
	}

	/// Verifies the signature and expiry of a token.
	pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
		decode::<Claims>(token, &self.decoding, &Validation::default())
			.map(|data| data.claims.identity)
			.map_err(|error| match error.kind() {
				ErrorKind::ExpiredSignature => TokenError::Expired,
				_ => TokenError::Invalid(error),
			})
	}
}

#[cfg(test)]
mod test {
	use super::*;

	const SECRET: &str = "test-secret-that-is-at-least-32-characters-long";

	fn identity(is_admin: bool) -> Identity {
		Identity {
			id: Uuid::new_v4(),
			email: "editor@example.com".into(),
			is_admin,
		}
	}

	#[test]
	fn test_issue_and_verify() {
		let tokens = Tokens::new(SECRET, chrono::Duration::hours(24));
		let identity = identity(true);

		let token = tokens.issue(identity.clone()).unwrap();

		assert_eq!(tokens.verify(&token).unwrap(), identity);
	}

	#[test]
	fn test_claims_shape() {
		let claims = Claims {
			identity: identity(false),
			iat: 1,
			exp: 2,
		};
		let json = serde_json::to_value(&claims).unwrap();

		assert_eq!(json["isAdmin"], false);
		assert_eq!(json["email"], "editor@example.com");
		assert!(json["id"].is_string());
	}

	#[test]
	fn test_expired_token() {
		let tokens = Tokens::new(SECRET, chrono::Duration::hours(-2));
		let token = tokens.issue(identity(true)).unwrap();

		assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
	}

	#[test]
	fn test_wrong_secret() {
		let issuer = Tokens::new(SECRET, chrono::Duration::hours(1));
		let verifier = Tokens::new(
			"a-different-secret-that-is-also-long-enough",
			chrono::Duration::hours(1),
		);

		let token = issuer.issue(identity(true)).unwrap();

		assert!(matches!(verifier.verify(&token), Err(TokenError::Invalid(..))));
	}

	#[test]
	fn test_garbage_token() {
		let tokens = Tokens::new(SECRET, chrono::Duration::hours(1));

		assert!(matches!(tokens.verify("not-a-token"), Err(TokenError::Invalid(..))));
	}
}
