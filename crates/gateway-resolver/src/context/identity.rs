// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use arbor_env::Environment;
use common::env_const::{ARBOR_IDENTITY_ANON_KEY, ARBOR_IDENTITY_URL};

/// A user as known to the identity provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
}

/// The session a credential resolves to.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }
}

#[derive(Debug, Error)]
pub enum IdentityProviderError {
    #[error("{ARBOR_IDENTITY_URL} or {ARBOR_IDENTITY_ANON_KEY} is not set")]
    NotConfigured,

    #[error("Identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Identity provider returned an unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// The external system of record for sessions.
///
/// `resolve_session` is idempotent and safe to call repeatedly; callers are
/// expected to handle failures themselves (the gateway degrades to an
/// anonymous context rather than propagating them).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means the provider does not recognize the credential.
    async fn resolve_session(
        &self,
        credential: &str,
    ) -> Result<Option<Session>, IdentityProviderError>;
}

/// GoTrue-style identity provider: resolves a credential by asking the
/// provider's `/auth/v1/user` endpoint who the bearer is.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    user_endpoint: String,
    anon_key: String,
}

impl HttpIdentityProvider {
    pub fn from_env(env: &dyn Environment) -> Result<Self, IdentityProviderError> {
        let base_url = env
            .get(ARBOR_IDENTITY_URL)
            .ok_or(IdentityProviderError::NotConfigured)?;
        let anon_key = env
            .get(ARBOR_IDENTITY_ANON_KEY)
            .ok_or(IdentityProviderError::NotConfigured)?;

        Ok(Self {
            client: reqwest::Client::new(),
            user_endpoint: format!("{}/auth/v1/user", base_url.trim_end_matches('/')),
            anon_key,
        })
    }
}

// The provider reports the user's identity along with the session expiry when
// the access token is short-lived.
#[derive(Deserialize)]
struct UserEndpointResponse {
    id: String,
    email: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn resolve_session(
        &self,
        credential: &str,
    ) -> Result<Option<Session>, IdentityProviderError> {
        let response = self
            .client
            .get(&self.user_endpoint)
            .header("apikey", &self.anon_key)
            .bearer_auth(credential)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let body: UserEndpointResponse = response.json().await.map_err(|err| {
                IdentityProviderError::UnexpectedResponse(format!("malformed user payload: {err}"))
            })?;

            Ok(Some(Session {
                user: User {
                    id: body.id,
                    email: body.email,
                },
                expires_at: body.expires_at,
            }))
        } else if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            // The provider rejected the credential; that is an anonymous
            // caller, not a provider failure.
            Ok(None)
        } else {
            Err(IdentityProviderError::UnexpectedResponse(format!(
                "status {status}"
            )))
        }
    }
}
