//! Concierge Storage crate - SQLite persistence for contacts and appointments.
//!
//! Provides a WAL-mode SQLite database with versioned migrations and
//! repositories for the current user contact and booked calls.

pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::{AppointmentRepository, ContactRepository};
