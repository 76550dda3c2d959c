// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod bearer;
mod identity;

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use arbor_env::Environment;
use common::env_const::ARBOR_IDENTITY_URL;
use common::http::RequestHead;

pub use bearer::extract_bearer_token;
pub use identity::{
    HttpIdentityProvider, IdentityProvider, IdentityProviderError, Session, User,
};

/// Per-request identity context.
///
/// Built once per inbound request, immutable afterwards, and passed by
/// reference into every resolver invocation. Never stored in process-wide
/// state.
#[derive(Debug, Clone)]
pub struct RequestContext {
    current_user: Option<User>,
    credential: Option<String>,
}

impl RequestContext {
    pub fn new(current_user: Option<User>, credential: Option<String>) -> Self {
        Self {
            current_user,
            credential,
        }
    }

    pub fn anonymous() -> Self {
        Self::new(None, None)
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }
}

/// Builds a [`RequestContext`] from an inbound request by resolving the
/// extracted credential against the identity provider.
pub struct ContextBuilder {
    provider: Option<Arc<dyn IdentityProvider>>,
}

impl ContextBuilder {
    pub fn new(provider: Option<Arc<dyn IdentityProvider>>) -> Self {
        Self { provider }
    }

    pub fn from_env(env: &dyn Environment) -> Self {
        match HttpIdentityProvider::from_env(env) {
            Ok(provider) => Self::new(Some(Arc::new(provider))),
            Err(err) => {
                warn!("Identity provider not configured ({err}); all requests will be anonymous");
                Self::new(None)
            }
        }
    }

    /// Resolve the inbound request into a context.
    ///
    /// Infallible: every failure mode degrades to an anonymous context (fail
    /// open). Authorization decisions belong to individual resolvers.
    pub async fn build(&self, request_head: &(dyn RequestHead + Send + Sync)) -> RequestContext {
        let Some(credential) = extract_bearer_token(request_head) else {
            return RequestContext::anonymous();
        };

        let Some(provider) = self.provider.as_ref() else {
            warn!("{ARBOR_IDENTITY_URL} is not set; treating authenticated request as anonymous");
            return RequestContext::new(None, Some(credential));
        };

        match provider.resolve_session(&credential).await {
            Ok(Some(session)) if !session.is_expired(Utc::now()) => {
                RequestContext::new(Some(session.user), Some(credential))
            }
            Ok(Some(_)) | Ok(None) => RequestContext::new(None, Some(credential)),
            Err(err) => {
                // Fail open: the request proceeds anonymously.
                warn!("Identity lookup failed, continuing as anonymous: {err}");
                RequestContext::new(None, Some(credential))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use common::http::MemoryRequestHead;

    use super::*;

    struct StubProvider {
        session: Option<Session>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn resolving(session: Option<Session>) -> Self {
            Self {
                session,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                session: None,
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for StubProvider {
        async fn resolve_session(
            &self,
            _credential: &str,
        ) -> Result<Option<Session>, IdentityProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(IdentityProviderError::UnexpectedResponse(
                    "status 503".to_string(),
                ))
            } else {
                Ok(self.session.clone())
            }
        }
    }

    fn user() -> User {
        User {
            id: "user-1".to_string(),
            email: Some("user@example.com".to_string()),
        }
    }

    fn request_head(authorization: Option<&str>) -> MemoryRequestHead {
        let headers = match authorization {
            Some(value) => HashMap::from([(
                "Authorization".to_string(),
                vec![value.to_string()],
            )]),
            None => HashMap::new(),
        };
        MemoryRequestHead::new(headers, http::Method::POST, "/graphql".to_string())
    }

    #[tokio::test]
    async fn no_credential_skips_provider() {
        let provider = Arc::new(StubProvider::resolving(Some(Session {
            user: user(),
            expires_at: None,
        })));
        let builder = ContextBuilder::new(Some(provider.clone()));

        let context = builder.build(&request_head(None)).await;

        assert!(!context.is_authenticated());
        assert_eq!(context.credential(), None);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_session_sets_current_user() {
        let provider = Arc::new(StubProvider::resolving(Some(Session {
            user: user(),
            expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
        })));
        let builder = ContextBuilder::new(Some(provider.clone()));

        let context = builder.build(&request_head(Some("Bearer token"))).await;

        assert_eq!(context.current_user(), Some(&user()));
        assert_eq!(context.credential(), Some("token"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_session_is_anonymous() {
        let provider = Arc::new(StubProvider::resolving(Some(Session {
            user: user(),
            expires_at: Some(Utc::now() - chrono::Duration::seconds(30)),
        })));
        let builder = ContextBuilder::new(Some(provider));

        let context = builder.build(&request_head(Some("Bearer token"))).await;

        assert!(!context.is_authenticated());
    }

    #[tokio::test]
    async fn unknown_credential_is_anonymous() {
        let provider = Arc::new(StubProvider::resolving(None));
        let builder = ContextBuilder::new(Some(provider));

        let context = builder.build(&request_head(Some("Bearer stale"))).await;

        assert!(!context.is_authenticated());
        assert_eq!(context.credential(), Some("stale"));
    }

    #[tokio::test]
    async fn provider_failure_fails_open() {
        let provider = Arc::new(StubProvider::failing());
        let builder = ContextBuilder::new(Some(provider.clone()));

        let context = builder.build(&request_head(Some("Bearer token"))).await;

        assert!(!context.is_authenticated());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_provider_is_anonymous() {
        let builder = ContextBuilder::new(None);

        let context = builder.build(&request_head(Some("Bearer token"))).await;

        assert!(!context.is_authenticated());
        assert_eq!(context.credential(), Some("token"));
    }
}
