//! Login state of the profile page

use common::{ErrorKind, ProfileError, ProfileUpdate, UserProfile};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{
    reconciler::{ProfileReconciler, ProfileState},
    validation::{validate_email, validate_password},
};

/// Who is logged in, if anyone
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn { email: String },
}

/// Everything the page can be showing
#[derive(Debug, Clone, PartialEq)]
pub enum PageState {
    LoggedOut,
    Fetching,
    Creating,
    Resolved(UserProfile),
    Failed(ErrorKind),
}

/// Errors surfaced by the session controller
#[derive(Error, Debug)]
pub enum SessionError {
    /// The login form was rejected
    #[error("Invalid login: {0}")]
    InvalidLogin(String),

    /// The operation needs a logged in user
    #[error("Not logged in")]
    NotLoggedIn,

    /// The profile has not been loaded, so there is nothing to update
    #[error("Profile not loaded")]
    ProfileNotReady,

    /// The profile API call failed
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Session controller
///
/// Logging in starts the profile reconciliation in the background; the
/// result is observed through [`SessionController::page_state`].
pub struct SessionController {
    state: SessionState,
    reconciler: ProfileReconciler,
    in_flight: Option<JoinHandle<ProfileState>>,
}

impl SessionController {
    /// Create a new, logged out, session
    pub fn new(reconciler: ProfileReconciler) -> Self {
        Self {
            state: SessionState::LoggedOut,
            reconciler,
            in_flight: None,
        }
    }

    /// Email of the logged in user
    pub fn email(&self) -> Option<&str> {
        match &self.state {
            SessionState::LoggedIn { email } => Some(email),
            SessionState::LoggedOut => None,
        }
    }

    /// Handle a submitted login form
    ///
    /// Returns `true` when this call logged the user in and started the
    /// profile reconciliation, `false` when a session was already active.
    /// The reconciliation is spawned on the current Tokio runtime.
    pub async fn submit_login(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<bool, SessionError> {
        validate_email(email).map_err(SessionError::InvalidLogin)?;
        validate_password(password).map_err(SessionError::InvalidLogin)?;

        if let SessionState::LoggedIn { email } = &self.state {
            info!("Login ignored, {} is already logged in", email);
            return Ok(false);
        }

        let email = email.trim().to_string();
        info!("User {} logged in", email);
        self.state = SessionState::LoggedIn {
            email: email.clone(),
        };

        let reconciler = self.reconciler.clone();
        self.in_flight = Some(tokio::spawn(async move {
            reconciler.fetch_profile(&email).await
        }));

        Ok(true)
    }

    /// Wait for the reconciliation started by the last login to settle
    pub async fn wait_for_profile(&mut self) -> PageState {
        if let Some(task) = self.in_flight.take() {
            match task.await {
                Ok(state) => {
                    if let Some(profile) = state.profile() {
                        info!("Profile ready for {}", profile.email);
                    }
                }
                Err(err) => warn!("Profile reconciliation task ended early: {}", err),
            }
        }

        self.page_state().await
    }

    /// Log out, discarding the profile and anything still in flight
    pub async fn logout(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        self.reconciler.invalidate().await;

        if let SessionState::LoggedIn { email } = &self.state {
            info!("User {} logged out", email);
        }
        self.state = SessionState::LoggedOut;
    }

    /// Send a profile update for the logged in user
    ///
    /// Waits for a pending reconciliation first; only a resolved profile
    /// can be updated.
    pub async fn update_profile(
        &mut self,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, SessionError> {
        match self.wait_for_profile().await {
            PageState::LoggedOut => return Err(SessionError::NotLoggedIn),
            PageState::Resolved(_) => {}
            page => {
                warn!("Update rejected, profile page is {:?}", page);
                return Err(SessionError::ProfileNotReady);
            }
        }

        let email = self.email().ok_or(SessionError::NotLoggedIn)?;
        Ok(self.reconciler.update_profile(email, update).await?)
    }

    /// Combined page state
    pub async fn page_state(&self) -> PageState {
        if self.state == SessionState::LoggedOut {
            return PageState::LoggedOut;
        }

        match self.reconciler.state().await {
            ProfileState::Idle | ProfileState::Fetching => PageState::Fetching,
            ProfileState::Creating => PageState::Creating,
            ProfileState::Resolved(profile) => PageState::Resolved(profile),
            ProfileState::Failed(kind) => PageState::Failed(kind),
        }
    }
}
