//! User profile domain
//!
//! The full profile row behind the lightweight view the session tracker
//! keeps: contact and study details, activation and verification flags.

pub mod entity;
pub mod repository;

pub use entity::{LoginProfile, ProfileUpdate, UserProfile};
pub use repository::{ProfileError, ProfileRepository};
