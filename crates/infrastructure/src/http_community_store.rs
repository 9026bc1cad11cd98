//! HTTP client for a remote community store speaking the agora API contract.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use agora_application::{FollowRepository, RoleAssignmentRepository};
use agora_core::{AppError, AppResult};
use agora_domain::{
    CommunityId, CommunityRole, FollowMarker, FollowPair, GlobalScope, RankedRole, RoleAssignment,
    ToggleOutcome, UserId, UserRole,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;


const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Connection settings for [`HttpCommunityStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpStoreConfig {
    base_url: Url,
    timeout: Duration,
}

impl HttpStoreConfig {
    /// Creates a config, rejecting URLs that cannot carry path segments and zero timeouts.
    pub fn new(base_url: Url, timeout: Duration) -> AppResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "store URL '{base_url}' cannot be used as a base URL"
            )));
        }

        if timeout.is_zero() {
            return Err(AppError::Validation(
                "store request timeout must be greater than zero".to_owned(),
            ));
        }

        Ok(Self { base_url, timeout })
    }

    /// Loads `AGORA_STORE_URL` and `AGORA_STORE_TIMEOUT_MS` from the environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let raw_url = lookup("AGORA_STORE_URL")
            .ok_or_else(|| AppError::Validation("AGORA_STORE_URL is required".to_owned()))?;
        let base_url = Url::parse(raw_url.trim()).map_err(|error| {
            AppError::Validation(format!("invalid AGORA_STORE_URL value '{raw_url}': {error}"))
        })?;

        let timeout_ms = match lookup("AGORA_STORE_TIMEOUT_MS") {
            Some(value) => value.parse::<u64>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid AGORA_STORE_TIMEOUT_MS value '{value}': {error}"
                ))
            })?,
            None => DEFAULT_TIMEOUT_MS,
        };

        Self::new(base_url, Duration::from_millis(timeout_ms))
    }

    /// Returns the store base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[derive(Debug, Deserialize)]
struct RolesResponse {
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FollowStatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ToggleFollowResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Community store adapter backed by a remote agora API.
#[derive(Clone)]
pub struct HttpCommunityStore {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpCommunityStore {
    /// Builds a store client with the configured timeout.
    pub fn new(config: HttpStoreConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build store HTTP client: {error}"))
            })?;

        Ok(Self {
            http_client,
            base_url: config.base_url,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Internal(format!("store URL '{}' cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> AppResult<T> {
        let response = request.send().await.map_err(|error| {
            AppError::Unavailable(format!("failed to call store for {operation}: {error}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.message)
                .unwrap_or_else(|_| "<body unavailable>".to_owned());
            return Err(status_error(status, operation, message));
        }

        response.json::<T>().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to parse store response for {operation}: {error}"
            ))
        })
    }

    fn decode_roles<R: RankedRole>(
        roles: Vec<String>,
        subject_id: &UserId,
        scope: &R::Scope,
    ) -> AppResult<Vec<RoleAssignment<R>>> {
        roles
            .iter()
            .map(|role| {
                let role = R::from_str(role).map_err(|error| {
                    AppError::Internal(format!(
                        "store returned an unknown role for subject '{subject_id}': {error}"
                    ))
                })?;
                Ok(RoleAssignment {
                    subject_id: subject_id.clone(),
                    scope: scope.clone(),
                    role,
                })
            })
            .collect()
    }
}

fn status_error(status: StatusCode, operation: &str, message: String) -> AppError {
    let detail = format!("store returned status {} for {operation}: {message}", status.as_u16());
    match status {
        StatusCode::BAD_REQUEST => AppError::Validation(detail),
        StatusCode::NOT_FOUND => AppError::NotFound(detail),
        StatusCode::CONFLICT => AppError::Conflict(detail),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            AppError::Unavailable(detail)
        }
        _ => AppError::Internal(detail),
    }
}

#[async_trait]
impl RoleAssignmentRepository<UserRole> for HttpCommunityStore {
    async fn list_role_assignments(
        &self,
        subject_id: &UserId,
        scope: &GlobalScope,
    ) -> AppResult<Vec<RoleAssignment<UserRole>>> {
        let url = self.endpoint(&["api", "users", subject_id.as_str(), "roles"])?;
        let body: RolesResponse = self
            .read_json(self.http_client.get(url), "user roles")
            .await?;

        Self::decode_roles(body.roles, subject_id, scope)
    }
}

#[async_trait]
impl RoleAssignmentRepository<CommunityRole> for HttpCommunityStore {
    async fn list_role_assignments(
        &self,
        subject_id: &UserId,
        scope: &CommunityId,
    ) -> AppResult<Vec<RoleAssignment<CommunityRole>>> {
        let url = self.endpoint(&[
            "api",
            "communities",
            scope.as_str(),
            "members",
            subject_id.as_str(),
            "roles",
        ])?;
        let body: RolesResponse = self
            .read_json(self.http_client.get(url), "community roles")
            .await?;

        Self::decode_roles(body.roles, subject_id, scope)
    }
}

#[async_trait]
impl FollowRepository for HttpCommunityStore {
    async fn check_follow(&self, pair: &FollowPair) -> AppResult<FollowMarker> {
        let url = self.endpoint(&[
            "api",
            "follows",
            pair.follower_id().as_str(),
            pair.followee_id().as_str(),
        ])?;
        let body: FollowStatusResponse = self
            .read_json(self.http_client.get(url), "follow status")
            .await?;

        Ok(FollowMarker::from_store(body.status.as_str()))
    }

    async fn toggle_follow(&self, pair: &FollowPair) -> AppResult<ToggleOutcome> {
        let url = self.endpoint(&[
            "api",
            "follows",
            pair.follower_id().as_str(),
            pair.followee_id().as_str(),
            "toggle",
        ])?;
        let body: ToggleFollowResponse = self
            .read_json(self.http_client.post(url), "follow toggle")
            .await?;

        ToggleOutcome::from_str(body.result.as_str()).map_err(|error| {
            AppError::Internal(format!("store returned an unknown toggle result: {error}"))
        })
    }
}
