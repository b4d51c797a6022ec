//! Fetch-or-create reconciliation of the logged in user's profile
//!
//! The reconciler owns the single in-memory profile. Every operation records
//! the generation it started in; [`ProfileReconciler::invalidate`] bumps the
//! generation so results that land afterwards are dropped instead of
//! repopulating a page nobody is looking at.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use common::{
    ErrorKind, ProfileError, ProfileResult, ProfileUpdate, UserProfile, config::ApiConfig,
};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::client::ProfileApi;

/// Where the reconciliation of the current profile stands
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileState {
    Idle,
    Fetching,
    Creating,
    Resolved(UserProfile),
    Failed(ErrorKind),
}

impl ProfileState {
    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            ProfileState::Resolved(profile) => Some(profile),
            _ => None,
        }
    }
}

/// Bounded retry for fetches that fail at the network level
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Pause between attempts
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            max_attempts: config.fetch_max_attempts.max(1),
            backoff: config.fetch_retry_backoff(),
        }
    }
}

impl Default for RetryPolicy {
    /// Single attempt
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

/// Profile reconciler
#[derive(Clone)]
pub struct ProfileReconciler {
    api: Arc<dyn ProfileApi>,
    retry: RetryPolicy,
    state: Arc<RwLock<ProfileState>>,
    generation: Arc<AtomicU64>,
}

impl ProfileReconciler {
    /// Create a new reconciler in the `Idle` state
    pub fn new(api: Arc<dyn ProfileApi>, retry: RetryPolicy) -> Self {
        Self {
            api,
            retry,
            state: Arc::new(RwLock::new(ProfileState::Idle)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> ProfileState {
        self.state.read().await.clone()
    }

    /// Drop the current profile and orphan any operation in flight
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        *state = ProfileState::Idle;
        info!("Profile state invalidated");
    }

    /// Fetch the profile for `email`, creating a default one if the API has
    /// none
    ///
    /// Returns the state the operation left behind.
    pub async fn fetch_profile(&self, email: &str) -> ProfileState {
        let generation = self.generation.load(Ordering::SeqCst);
        if !self.transition(generation, ProfileState::Fetching).await {
            return self.state().await;
        }

        info!("Fetching profile for {}", email);

        match self.get_with_retry(generation, email).await {
            Ok(profile) => {
                info!("Profile found for {}", email);
                self.transition(generation, ProfileState::Resolved(profile))
                    .await;
            }
            Err(ProfileError::NotFound(_)) => {
                info!("No profile for {}, creating a default one", email);
                if self.transition(generation, ProfileState::Creating).await {
                    return self.create_profile(generation, email).await;
                }
            }
            Err(err) => {
                error!("Failed to fetch profile for {}: {}", email, err);
                self.transition(generation, ProfileState::Failed(err.kind()))
                    .await;
            }
        }

        self.state().await
    }

    /// Persist a default profile; only reached from a not-found fetch
    async fn create_profile(&self, generation: u64, email: &str) -> ProfileState {
        let profile = UserProfile::new_default(email, Utc::now());

        match self.api.create_profile(&profile).await {
            Ok(created) => {
                info!("Created profile for {}", email);
                self.transition(generation, ProfileState::Resolved(created))
                    .await;
            }
            Err(err) => {
                error!("Failed to create profile for {}: {}", email, err);
                self.transition(generation, ProfileState::Failed(err.kind()))
                    .await;
            }
        }

        self.state().await
    }

    /// Submit an update and adopt the record the API returns
    ///
    /// On failure the previous state is left untouched.
    pub async fn update_profile(
        &self,
        email: &str,
        update: &ProfileUpdate,
    ) -> ProfileResult<UserProfile> {
        let generation = self.generation.load(Ordering::SeqCst);
        info!("Updating profile for {}", email);

        match self.api.update_profile(email, update).await {
            Ok(updated) => {
                self.transition(generation, ProfileState::Resolved(updated.clone()))
                    .await;
                Ok(updated)
            }
            Err(err) => {
                error!("Failed to update profile for {}: {}", email, err);
                Err(err)
            }
        }
    }

    async fn get_with_retry(&self, generation: u64, email: &str) -> ProfileResult<UserProfile> {
        let mut attempt = 1;

        loop {
            match self.api.get_profile(email).await {
                Err(err)
                    if err.is_retryable()
                        && attempt < self.retry.max_attempts
                        && self.is_current(generation) =>
                {
                    debug!(
                        "Fetch attempt {}/{} for {} failed: {}",
                        attempt, self.retry.max_attempts, email, err
                    );
                    attempt += 1;
                    tokio::time::sleep(self.retry.backoff).await;
                }
                result => return result,
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Move to `next` unless the reconciler was invalidated since `generation`
    async fn transition(&self, generation: u64, next: ProfileState) -> bool {
        let mut state = self.state.write().await;
        if !self.is_current(generation) {
            debug!("Discarding stale profile transition to {:?}", next);
            return false;
        }

        *state = next;
        true
    }
}
