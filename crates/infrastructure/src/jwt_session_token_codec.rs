//! HS256 JSON Web Token codec for session cookies.

use aegis_application::SessionTokenCodec;
use aegis_core::{AppError, AppResult, PrincipalId, TokenError};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    iat: u64,
    exp: u64,
}

/// Signs and verifies session tokens with one shared secret.
#[derive(Clone)]
pub struct JwtSessionTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_validation: Validation,
}

impl JwtSessionTokenCodec {
    /// Creates a codec for the given signing secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let mut expiry_validation = validation.clone();
        expiry_validation.insecure_disable_signature_validation();

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry_validation,
        }
    }
}

impl SessionTokenCodec for JwtSessionTokenCodec {
    fn issue(&self, principal_id: PrincipalId, ttl: TimeDelta) -> AppResult<String> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            AppError::Internal(format!("session ttl of {ttl} overflows the token expiry"))
        })?;
        let claims = SessionClaims {
            sub: principal_id.to_string(),
            iat: unix_seconds(now.timestamp()),
            exp: unix_seconds(expires_at.timestamp()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|error| AppError::Internal(format!("failed to sign session token: {error}")))
    }

    fn verify(&self, token: &str) -> Result<PrincipalId, TokenError> {
        // Expiry is decided before the signature: an expired token is `Expired`
        // whoever signed it.
        let unverified =
            decode::<SessionClaims>(token, &self.decoding_key, &self.expiry_validation)
                .map_err(token_error)?;

        // jsonwebtoken accepts exp == now; a session must expire strictly in the future.
        if unverified.claims.exp <= unix_seconds(Utc::now().timestamp()) {
            return Err(TokenError::Expired);
        }

        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(token_error)?;

        data.claims
            .sub
            .parse::<i64>()
            .map(PrincipalId::new)
            .map_err(|_| TokenError::Malformed(format!("subject '{}' is not an id", data.claims.sub)))
    }
}

fn token_error(error: jsonwebtoken::errors::Error) -> TokenError {
    match error.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed(error.to_string()),
    }
}

fn unix_seconds(timestamp: i64) -> u64 {
    u64::try_from(timestamp).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use aegis_application::SessionTokenCodec;
    use aegis_core::{AppError, AppResult, PrincipalId, TokenError};
    use chrono::TimeDelta;
    use proptest::prelude::*;

    use super::JwtSessionTokenCodec;

    fn codec() -> JwtSessionTokenCodec {
        JwtSessionTokenCodec::new("test-secret-with-enough-entropy")
    }

    #[test]
    fn issued_token_verifies_to_same_principal() -> AppResult<()> {
        let token = codec().issue(PrincipalId::new(42), TimeDelta::hours(1))?;

        assert_eq!(codec().verify(&token), Ok(PrincipalId::new(42)));
        Ok(())
    }

    #[test]
    fn negative_ttl_yields_expired_token() -> AppResult<()> {
        let token = codec().issue(PrincipalId::new(42), TimeDelta::seconds(-1))?;

        assert_eq!(codec().verify(&token), Err(TokenError::Expired));
        Ok(())
    }

    #[test]
    fn spliced_payload_fails_signature_check() -> AppResult<()> {
        let victim = codec().issue(PrincipalId::new(1), TimeDelta::hours(1))?;
        let attacker = codec().issue(PrincipalId::new(2), TimeDelta::hours(2))?;

        let victim_parts: Vec<&str> = victim.split('.').collect();
        let attacker_parts: Vec<&str> = attacker.split('.').collect();
        assert_eq!(victim_parts.len(), 3);
        assert_eq!(attacker_parts.len(), 3);

        let forged = format!(
            "{}.{}.{}",
            victim_parts[0], attacker_parts[1], victim_parts[2]
        );

        assert_eq!(codec().verify(&forged), Err(TokenError::InvalidSignature));
        Ok(())
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() -> AppResult<()> {
        let token = JwtSessionTokenCodec::new("another-secret")
            .issue(PrincipalId::new(42), TimeDelta::hours(1))?;

        assert_eq!(codec().verify(&token), Err(TokenError::InvalidSignature));
        Ok(())
    }

    #[test]
    fn expired_token_is_expired_even_with_foreign_signature() -> AppResult<()> {
        let token = JwtSessionTokenCodec::new("another-secret")
            .issue(PrincipalId::new(42), TimeDelta::seconds(-10))?;

        assert_eq!(codec().verify(&token), Err(TokenError::Expired));
        Ok(())
    }

    #[test]
    fn overflowing_ttl_fails_instead_of_panicking() {
        let issued = codec().issue(PrincipalId::new(42), TimeDelta::MAX);

        assert!(matches!(issued, Err(AppError::Internal(_))));
    }

    #[test]
    fn garbage_is_malformed() {
        for token in ["", "not-a-token", "a.b.c"] {
            assert!(matches!(
                codec().verify(token),
                Err(TokenError::Malformed(_))
            ));
        }
    }

    proptest! {
        #[test]
        fn verify_inverts_issue(id in any::<i64>(), minutes in 1_i64..10_000) {
            let token = codec().issue(PrincipalId::new(id), TimeDelta::minutes(minutes));
            prop_assert!(token.is_ok());
            if let Ok(token) = token {
                prop_assert_eq!(codec().verify(&token), Ok(PrincipalId::new(id)));
            }
        }
    }
}
