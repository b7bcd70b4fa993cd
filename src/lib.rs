//! Core of the MedAssist health-info and appointment-booking app.
//!
//! The [`gateway::Gateway`] talks to the hosted document database and the
//! identity provider. [`auth::AuthCoordinator`] drives sign-in and keeps
//! the session in the [`prefs::PreferenceStore`]. The [`views`] module holds
//! the screen logic, including the offline fallback to built-in samples.

pub mod auth;
pub mod config;
pub mod db;
pub mod fixtures;
pub mod gateway;
pub mod identity;
pub mod models;
pub mod notifications;
pub mod prefs;
pub mod seeder;
pub mod store;
pub mod views;

pub use config::Config;
pub use gateway::{BookingFallback, Gateway, GatewayError};
pub use prefs::PreferenceStore;
