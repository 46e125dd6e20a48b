//! Stateless cookie sessions: token issuing and per-request resolution.

use std::sync::Arc;

use aegis_core::{AppError, AppResult, Principal, PrincipalId, TokenError};
use chrono::TimeDelta;
use tracing::debug;

use crate::UserRepository;

/// Port for signing and verifying session tokens.
///
/// Implementations hold the shared signing secret; verification must be a
/// pure computation over the token, the secret and the current time.
pub trait SessionTokenCodec: Send + Sync {
    /// Signs a token for `principal_id` that expires `ttl` from now.
    fn issue(&self, principal_id: PrincipalId, ttl: TimeDelta) -> AppResult<String>;

    /// Verifies signature and expiry, returning the embedded principal id.
    fn verify(&self, token: &str) -> Result<PrincipalId, TokenError>;
}

/// Turns session tokens into stored principals.
#[derive(Clone)]
pub struct SessionResolver {
    codec: Arc<dyn SessionTokenCodec>,
    user_repository: Arc<dyn UserRepository>,
    ttl: TimeDelta,
}

impl SessionResolver {
    /// Creates a resolver issuing tokens valid for `ttl`.
    #[must_use]
    pub fn new(
        codec: Arc<dyn SessionTokenCodec>,
        user_repository: Arc<dyn UserRepository>,
        ttl: TimeDelta,
    ) -> Self {
        Self {
            codec,
            user_repository,
            ttl,
        }
    }

    /// Lifetime of newly issued tokens.
    #[must_use]
    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Issues a session token for an authenticated principal.
    pub fn issue(&self, principal: &Principal) -> AppResult<String> {
        self.codec.issue(principal.id(), self.ttl)
    }

    /// Resolves an optional cookie value into the stored principal.
    ///
    /// A missing token, a token the codec rejects, and a token whose subject no
    /// longer exists all fail with the same `Unauthorized` error. Storage
    /// failures are returned unchanged.
    pub async fn resolve_token(&self, token: Option<&str>) -> AppResult<Principal> {
        let token = token
            .filter(|value| !value.is_empty())
            .ok_or_else(AppError::unauthenticated)?;

        let principal_id = self.codec.verify(token).map_err(|error| {
            debug!(%error, "rejected session token");
            AppError::from(error)
        })?;

        self.user_repository
            .find_by_id(principal_id)
            .await?
            .ok_or_else(|| {
                debug!(%principal_id, "session token refers to a missing user");
                AppError::unauthenticated()
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use aegis_core::{AppError, AppResult, Principal, PrincipalId, TokenError};
    use aegis_domain::EmailAddress;
    use async_trait::async_trait;
    use chrono::TimeDelta;
    use tokio::sync::Mutex;

    use crate::{NewUser, UserCredentials, UserRepository};

    use super::{SessionResolver, SessionTokenCodec};

    /// Encodes tokens as `valid:<id>`, `expired:<id>` or anything else.
    struct PrefixCodec;

    impl SessionTokenCodec for PrefixCodec {
        fn issue(&self, principal_id: PrincipalId, ttl: TimeDelta) -> AppResult<String> {
            let prefix = if ttl > TimeDelta::zero() { "valid" } else { "expired" };
            Ok(format!("{prefix}:{principal_id}"))
        }

        fn verify(&self, token: &str) -> Result<PrincipalId, TokenError> {
            match token.split_once(':') {
                Some(("valid", id)) => id
                    .parse::<i64>()
                    .map(PrincipalId::new)
                    .map_err(|error| TokenError::Malformed(error.to_string())),
                Some(("expired", _)) => Err(TokenError::Expired),
                Some(("forged", _)) => Err(TokenError::InvalidSignature),
                _ => Err(TokenError::Malformed("unknown format".to_owned())),
            }
        }
    }

    #[derive(Default)]
    struct FakeUserRepository {
        users: Mutex<HashMap<PrincipalId, Principal>>,
    }

    #[async_trait]
    impl UserRepository for FakeUserRepository {
        async fn find_by_id(&self, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
            Ok(self.users.lock().await.get(&principal_id).cloned())
        }

        async fn find_credentials_by_email(
            &self,
            _email: &EmailAddress,
        ) -> AppResult<Option<UserCredentials>> {
            Ok(None)
        }

        async fn create(&self, _user: NewUser) -> AppResult<Principal> {
            Err(AppError::Internal("not supported".to_owned()))
        }
    }

    async fn resolver_with_user(principal: Principal) -> (SessionResolver, Arc<FakeUserRepository>) {
        let repository = Arc::new(FakeUserRepository::default());
        repository
            .users
            .lock()
            .await
            .insert(principal.id(), principal);
        let resolver = SessionResolver::new(
            Arc::new(PrefixCodec),
            repository.clone(),
            TimeDelta::hours(1),
        );
        (resolver, repository)
    }

    fn is_unauthenticated(result: &AppResult<Principal>) -> bool {
        matches!(result, Err(AppError::Unauthorized(message)) if message == "Unauthorized")
    }

    #[tokio::test]
    async fn issued_token_resolves_to_stored_principal() -> AppResult<()> {
        let principal = Principal::new(PrincipalId::new(42), "ann@corp.example", "Ann");
        let (resolver, _) = resolver_with_user(principal.clone()).await;

        let token = resolver.issue(&principal)?;
        let resolved = resolver.resolve_token(Some(token.as_str())).await?;

        assert_eq!(resolved, principal);
        Ok(())
    }

    #[tokio::test]
    async fn missing_and_empty_tokens_are_unauthenticated() {
        let principal = Principal::new(PrincipalId::new(1), "a@corp.example", "A");
        let (resolver, _) = resolver_with_user(principal).await;

        assert!(is_unauthenticated(&resolver.resolve_token(None).await));
        assert!(is_unauthenticated(&resolver.resolve_token(Some("")).await));
    }

    #[tokio::test]
    async fn codec_failures_are_unauthenticated() {
        let principal = Principal::new(PrincipalId::new(1), "a@corp.example", "A");
        let (resolver, _) = resolver_with_user(principal).await;

        for token in ["expired:1", "forged:1", "garbage", "valid:not-a-number"] {
            assert!(is_unauthenticated(&resolver.resolve_token(Some(token)).await));
        }
    }

    #[tokio::test]
    async fn deleted_user_invalidates_token() -> AppResult<()> {
        let principal = Principal::new(PrincipalId::new(9), "gone@corp.example", "Gone");
        let (resolver, repository) = resolver_with_user(principal.clone()).await;
        let token = resolver.issue(&principal)?;

        repository.users.lock().await.remove(&principal.id());

        assert!(is_unauthenticated(
            &resolver.resolve_token(Some(token.as_str())).await
        ));
        Ok(())
    }
}
