//! Plain text rendering of the profile page

use std::fmt::Write;

use common::{UserProfile, profile::PLAYING_HOURS_GOAL};

use crate::session::PageState;

const PROGRESS_BAR_WIDTH: usize = 20;

/// Render the whole page for the given state
pub fn render_page(page: &PageState) -> String {
    match page {
        PageState::LoggedOut => "Login to your Nebula Nexus account to see your profile.\n".to_string(),
        PageState::Fetching => "Loading your Nebula Nexus profile...\n".to_string(),
        PageState::Creating => "Setting up your Nebula Nexus profile...\n".to_string(),
        PageState::Failed(kind) => format!("Could not load your profile: {}.\n", kind),
        PageState::Resolved(profile) => {
            let mut out = String::from("Welcome back, Nebula Gamer!\n\n");
            out.push_str(&render_profile_tab(profile));
            out.push('\n');
            out.push_str(&render_stats_tab(profile));
            out
        }
    }
}

/// The "Profile" tab
pub fn render_profile_tab(profile: &UserProfile) -> String {
    let mut out = String::from("[Profile]\n");
    let _ = writeln!(out, "Playing Time:      {} hours", profile.playing_hours);
    if let Some(progress) = profile.playing_progress() {
        let _ = writeln!(
            out,
            "                   {} {} / {} hours",
            progress_bar(progress),
            profile.playing_hours,
            PLAYING_HOURS_GOAL
        );
    }
    let _ = writeln!(out, "Connected Devices: {}", profile.connected_devices);
    let _ = writeln!(out, "Current Plan:      {}", profile.current_plan);
    let _ = writeln!(
        out,
        "Plan Expiry:       {}",
        profile.plan_expiry_date.format("%Y-%m-%d")
    );
    out
}

/// The "Stats" tab
pub fn render_stats_tab(profile: &UserProfile) -> String {
    let mut out = String::from("[Stats]\n");
    let _ = writeln!(out, "Nebula Points:        {}", profile.nebula_points);
    let _ = writeln!(out, "Achievement Progress: {}%", profile.achievement_progress);
    let _ = writeln!(out, "Games Completed:      {}", profile.games_completed);
    let _ = writeln!(out, "Favorite Genre:       {}", profile.favorite_genre);
    out
}

fn progress_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * PROGRESS_BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(PROGRESS_BAR_WIDTH);
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled)
    )
}
