//! Call scheduling tool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;

use concierge_core::types::{Appointment, AppointmentStatus, Contact};
use concierge_storage::AppointmentRepository;

use crate::date_parser::DateParser;
use crate::error::ToolError;
use crate::tools::contact::ContactTool;
use crate::tools::ToolHandler;

/// Books, lists and cancels calls for the current contact.
pub struct SchedulingTool {
    appointments: Arc<AppointmentRepository>,
    contact: Arc<ContactTool>,
    dates: DateParser,
}

impl SchedulingTool {
    pub fn new(
        appointments: Arc<AppointmentRepository>,
        contact: Arc<ContactTool>,
        dates: DateParser,
    ) -> Self {
        Self {
            appointments,
            contact,
            dates,
        }
    }

    /// Book a call for the date mentioned in `query`, relative to today.
    pub async fn schedule(&self, query: &str) -> Result<String, ToolError> {
        self.schedule_on(query, self.dates.today()).await
    }

    /// Book a call for the date mentioned in `query`, relative to `today`.
    ///
    /// Collects contact details first when none are on file.
    pub async fn schedule_on(&self, query: &str, today: NaiveDate) -> Result<String, ToolError> {
        let contact = match self.contact.current()? {
            Some(contact) => contact,
            None => self.contact.collect().await?,
        };

        let Some(date) = DateParser::parse(query, today) else {
            return Ok("When would you like to schedule the call?".to_string());
        };

        let appointment = Appointment::new(date, &contact);
        self.appointments.save(&appointment)?;
        info!(id = %appointment.id, date = %date, "Call scheduled");

        Ok(confirmation(date, &contact))
    }

    /// Every call still scheduled, in booking order.
    pub fn list(&self) -> Result<String, ToolError> {
        let scheduled = self.appointments.list(Some(AppointmentStatus::Scheduled))?;
        if scheduled.is_empty() {
            return Ok("No scheduled calls at the moment.".to_string());
        }

        let mut out = String::from("Here are your scheduled calls:");
        for appt in &scheduled {
            out.push_str(&format!(
                "\n- Date: {}, Name: {}, Email: {}, Phone: {}",
                appt.date.format("%Y-%m-%d"),
                appt.name,
                appt.email,
                appt.phone
            ));
        }
        Ok(out)
    }

    /// Cancel the most recently booked call that is still scheduled.
    pub fn cancel(&self) -> Result<String, ToolError> {
        match self.appointments.cancel_latest()? {
            Some(appt) => {
                info!(id = %appt.id, "Call cancelled");
                Ok(format!(
                    "Your appointment for {} has been cancelled. Let me know if you'd like to schedule a new one!",
                    appt.date.format("%Y-%m-%d")
                ))
            }
            None => Ok("There's no active appointment to cancel.".to_string()),
        }
    }
}

fn confirmation(date: NaiveDate, contact: &Contact) -> String {
    format!(
        "I've scheduled a call for {} with:\nName: {}\nEmail: {}\nPhone: {}",
        date.format("%Y-%m-%d"),
        contact.name,
        contact.email,
        contact.phone
    )
}

#[async_trait]
impl ToolHandler for SchedulingTool {
    fn name(&self) -> &'static str {
        "Schedule_Appointment"
    }

    fn description(&self) -> &'static str {
        "Use this to schedule appointments and collect user information. Input is the requested date or time in the user's words."
    }

    async fn run(&self, input: &str) -> Result<String, ToolError> {
        self.schedule(input).await
    }
}
