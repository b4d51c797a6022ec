//! Common library for the Nebula portal
//!
//! This crate provides the pieces shared by every front end of the profile
//! page: the profile model, the error taxonomy of the REST collaborator and
//! the client configuration.

pub mod config;
pub mod error;
pub mod profile;

pub use error::{ErrorKind, ProfileError, ProfileResult};
pub use profile::{ProfileUpdate, UserProfile};
