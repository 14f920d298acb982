//! Repository implementations for SQLite-backed persistence.

use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use concierge_core::error::ConciergeError;
use concierge_core::types::{Appointment, AppointmentStatus, Contact, Timestamp};

use crate::db::Database;

/// Repository for the user's contact record.
///
/// Only the most recently saved contact is "current"; saving a new one
/// demotes the previous row instead of deleting it.
pub struct ContactRepository {
    db: Arc<Database>,
}

impl ContactRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store `contact` as the current contact.
    pub fn save(&self, contact: &Contact) -> Result<(), ConciergeError> {
        self.db.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| ConciergeError::Storage(e.to_string()))?;
            tx.execute("UPDATE contacts SET is_current = 0 WHERE is_current = 1", [])
                .map_err(|e| ConciergeError::Storage(format!("Failed to demote contact: {}", e)))?;
            tx.execute(
                "INSERT INTO contacts (name, email, phone, is_current, updated_at)
                 VALUES (?1, ?2, ?3, 1, ?4)",
                rusqlite::params![contact.name, contact.email, contact.phone, Timestamp::now().0],
            )
            .map_err(|e| ConciergeError::Storage(format!("Failed to save contact: {}", e)))?;
            tx.commit()
                .map_err(|e| ConciergeError::Storage(e.to_string()))?;
            Ok(())
        })
    }

    /// Fetch the current contact, if any.
    pub fn current(&self) -> Result<Option<Contact>, ConciergeError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT name, email, phone FROM contacts
                 WHERE is_current = 1 ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(Contact {
                        name: row.get(0)?,
                        email: row.get(1)?,
                        phone: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(|e| ConciergeError::Storage(e.to_string()))
        })
    }
}

/// Repository for booked calls.
pub struct AppointmentRepository {
    db: Arc<Database>,
}

impl AppointmentRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Persist a new appointment.
    pub fn save(&self, appt: &Appointment) -> Result<(), ConciergeError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO appointments (id, date, name, email, phone, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    appt.id.to_string(),
                    appt.date.format("%Y-%m-%d").to_string(),
                    appt.name,
                    appt.email,
                    appt.phone,
                    appt.status.to_string(),
                    appt.created_at.0,
                ],
            )
            .map_err(|e| ConciergeError::Storage(format!("Failed to save appointment: {}", e)))?;
            Ok(())
        })
    }

    /// List appointments, optionally filtered by status, in booking order.
    pub fn list(
        &self,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, ConciergeError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, date, name, email, phone, status, created_at
                     FROM appointments
                     WHERE ?1 IS NULL OR status = ?1
                     ORDER BY created_at ASC, rowid ASC",
                )
                .map_err(|e| ConciergeError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![status.map(|s| s.to_string())], |row| {
                    Ok(row_to_appointment(row))
                })
                .map_err(|e| ConciergeError::Storage(e.to_string()))?;

            let mut appts = Vec::new();
            for row in rows {
                let appt = row.map_err(|e| ConciergeError::Storage(e.to_string()))??;
                appts.push(appt);
            }
            Ok(appts)
        })
    }

    /// Cancel the most recently booked appointment that is still scheduled.
    ///
    /// Returns the cancelled appointment, or `None` if nothing was scheduled.
    pub fn cancel_latest(&self) -> Result<Option<Appointment>, ConciergeError> {
        let Some(mut latest) = self.list(Some(AppointmentStatus::Scheduled))?.pop() else {
            return Ok(None);
        };
        self.update_status(latest.id, AppointmentStatus::Cancelled)?;
        latest.status = AppointmentStatus::Cancelled;
        Ok(Some(latest))
    }

    /// Change the status of an appointment.
    pub fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<(), ConciergeError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE appointments SET status = ?1 WHERE id = ?2",
                    rusqlite::params![status.to_string(), id.to_string()],
                )
                .map_err(|e| {
                    ConciergeError::Storage(format!("Failed to update appointment: {}", e))
                })?;
            if changed == 0 {
                return Err(ConciergeError::Storage(format!(
                    "Appointment not found: {}",
                    id
                )));
            }
            Ok(())
        })
    }
}

fn row_to_appointment(row: &rusqlite::Row<'_>) -> Result<Appointment, ConciergeError> {
    let id_str: String = row.get(0).map_err(|e| ConciergeError::Storage(e.to_string()))?;
    let date_str: String = row.get(1).map_err(|e| ConciergeError::Storage(e.to_string()))?;
    let status_str: String = row.get(5).map_err(|e| ConciergeError::Storage(e.to_string()))?;

    Ok(Appointment {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| ConciergeError::Storage(format!("Invalid UUID: {}", e)))?,
        date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
            .map_err(|e| ConciergeError::Storage(format!("Invalid date: {}", e)))?,
        name: row.get(2).map_err(|e| ConciergeError::Storage(e.to_string()))?,
        email: row.get(3).map_err(|e| ConciergeError::Storage(e.to_string()))?,
        phone: row.get(4).map_err(|e| ConciergeError::Storage(e.to_string()))?,
        status: status_str.parse().map_err(ConciergeError::Storage)?,
        created_at: Timestamp(row.get(6).map_err(|e| ConciergeError::Storage(e.to_string()))?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Arc<Database> {
        Arc::new(Database::in_memory().unwrap())
    }

    fn contact(name: &str) -> Contact {
        Contact {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "+977 9818000000".to_string(),
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, d).unwrap()
    }

    #[test]
    fn test_contact_none_initially() {
        let repo = ContactRepository::new(db());
        assert!(repo.current().unwrap().is_none());
    }

    #[test]
    fn test_contact_save_and_current() {
        let repo = ContactRepository::new(db());
        repo.save(&contact("Asha")).unwrap();
        assert_eq!(repo.current().unwrap(), Some(contact("Asha")));
    }

    #[test]
    fn test_contact_newer_replaces_current() {
        let repo = ContactRepository::new(db());
        repo.save(&contact("Asha")).unwrap();
        repo.save(&contact("Bikash")).unwrap();
        assert_eq!(repo.current().unwrap().unwrap().name, "Bikash");
    }

    #[test]
    fn test_appointment_save_and_list() {
        let repo = AppointmentRepository::new(db());
        let a = Appointment::new(date(3), &contact("Asha"));
        let b = Appointment::new(date(5), &contact("Asha"));
        repo.save(&a).unwrap();
        repo.save(&b).unwrap();

        let all = repo.list(None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, a.id);
        assert_eq!(all[1].date, date(5));
    }

    #[test]
    fn test_appointment_list_filters_status() {
        let repo = AppointmentRepository::new(db());
        let a = Appointment::new(date(3), &contact("Asha"));
        repo.save(&a).unwrap();
        repo.update_status(a.id, AppointmentStatus::Cancelled).unwrap();

        assert!(repo.list(Some(AppointmentStatus::Scheduled)).unwrap().is_empty());
        assert_eq!(repo.list(Some(AppointmentStatus::Cancelled)).unwrap().len(), 1);
    }

    #[test]
    fn test_cancel_latest() {
        let repo = AppointmentRepository::new(db());
        let first = Appointment::new(date(3), &contact("Asha"));
        let second = Appointment::new(date(9), &contact("Asha"));
        repo.save(&first).unwrap();
        repo.save(&second).unwrap();

        let cancelled = repo.cancel_latest().unwrap().unwrap();
        assert_eq!(cancelled.id, second.id);
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

        let remaining = repo.list(Some(AppointmentStatus::Scheduled)).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, first.id);
    }

    #[test]
    fn test_cancel_latest_when_empty() {
        let repo = AppointmentRepository::new(db());
        assert!(repo.cancel_latest().unwrap().is_none());
    }

    #[test]
    fn test_update_status_unknown_id() {
        let repo = AppointmentRepository::new(db());
        let err = repo
            .update_status(Uuid::new_v4(), AppointmentStatus::Cancelled)
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
