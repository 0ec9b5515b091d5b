//! Configuration management for the appointment bot
//!
//! This module handles the runtime settings, the persisted booking
//! profile, and the interactive profile setup.

pub mod profile;
pub mod settings;
pub mod setup;

pub use profile::Profile;
pub use settings::Settings;
