//! User profile model and related functionality

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Entry tier every new profile starts on
pub const BASIC_PLAN: &str = "Nebula Nexus Basic";

/// Tier that unlocks the playing time progress bar
pub const ULTIMATE_PLAN: &str = "Nebula Nexus Ultimate";

/// Genre recorded until the user has played anything
pub const DEFAULT_GENRE: &str = "None";

/// Playing hours that fill the progress bar
pub const PLAYING_HOURS_GOAL: f64 = 1000.0;

/// Devices counted for a fresh account (the one logging in)
const DEFAULT_CONNECTED_DEVICES: u32 = 1;

/// Length of the initial plan term
pub fn plan_term() -> Duration {
    Duration::days(30)
}

/// User profile entity, keyed by email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    pub current_plan: String,
    pub playing_hours: f64,
    pub connected_devices: u32,
    pub plan_expiry_date: DateTime<Utc>,
    pub nebula_points: f64,
    pub achievement_progress: f64,
    pub games_completed: u32,
    pub favorite_genre: String,
}

impl UserProfile {
    /// Default record for an email that has no profile yet, as of `now`
    pub fn new_default(email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            email: email.into(),
            current_plan: BASIC_PLAN.to_string(),
            playing_hours: 0.0,
            connected_devices: DEFAULT_CONNECTED_DEVICES,
            plan_expiry_date: now + plan_term(),
            nebula_points: 0.0,
            achievement_progress: 0.0,
            games_completed: 0,
            favorite_genre: DEFAULT_GENRE.to_string(),
        }
    }

    /// Whether the profile is on the Ultimate tier
    pub fn is_ultimate(&self) -> bool {
        self.current_plan == ULTIMATE_PLAN
    }

    /// Playing time progress in percent, only for Ultimate plans
    ///
    /// Hours beyond the goal saturate at 100.
    pub fn playing_progress(&self) -> Option<f64> {
        if !self.is_ultimate() {
            return None;
        }

        Some((self.playing_hours / PLAYING_HOURS_GOAL * 100.0).clamp(0.0, 100.0))
    }
}

/// Profile update payload
///
/// Absent fields are left out of the request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playing_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_devices: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_expiry_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nebula_points: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievement_progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub games_completed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite_genre: Option<String>,
}

impl ProfileUpdate {
    /// True when no field would be sent
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
