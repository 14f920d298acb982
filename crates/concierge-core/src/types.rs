//! Domain types shared across Concierge crates.

use std::fmt;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Timestamp
// =============================================================================

/// Seconds since the Unix epoch (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }
}

// =============================================================================
// Contact
// =============================================================================

/// Contact details collected from the user before booking a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Which field of a [`Contact`] a user wants to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    Name,
    Email,
    Phone,
}

impl fmt::Display for ContactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactField::Name => write!(f, "name"),
            ContactField::Email => write!(f, "email"),
            ContactField::Phone => write!(f, "phone"),
        }
    }
}

// =============================================================================
// Appointment
// =============================================================================

/// Lifecycle of a booked call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(format!("Unknown appointment status: {}", s)),
        }
    }
}

/// A booked call, snapshotting the contact details at booking time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub date: NaiveDate,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub status: AppointmentStatus,
    pub created_at: Timestamp,
}

impl Appointment {
    /// Book a new call for `date` with the given contact.
    pub fn new(date: NaiveDate, contact: &Contact) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            status: AppointmentStatus::Scheduled,
            created_at: Timestamp::now(),
        }
    }
}
