//! Contact collection and update tool.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use concierge_core::types::{Contact, ContactField};
use concierge_storage::ContactRepository;

use crate::error::ToolError;
use crate::prompt::Prompter;
use crate::tools::ToolHandler;
use crate::validate::{is_valid_email, is_valid_phone};

const NAME_PROMPT: &str = "Please enter your name: ";
const EMAIL_PROMPT: &str = "Please enter your email: ";
const PHONE_PROMPT: &str =
    "Please enter your phone number (with country code, e.g., +977 9818000000): ";

/// Collects, stores and updates the user's contact details.
pub struct ContactTool {
    contacts: Arc<ContactRepository>,
    prompter: Arc<dyn Prompter>,
    max_attempts: usize,
}

impl ContactTool {
    pub fn new(
        contacts: Arc<ContactRepository>,
        prompter: Arc<dyn Prompter>,
        max_attempts: usize,
    ) -> Self {
        Self {
            contacts,
            prompter,
            max_attempts: max_attempts.max(1),
        }
    }

    /// The contact on file, if any.
    pub fn current(&self) -> Result<Option<Contact>, ToolError> {
        Ok(self.contacts.current()?)
    }

    /// Prompt for name, email and phone, then save them as the current contact.
    pub async fn collect(&self) -> Result<Contact, ToolError> {
        let name = self
            .ask_until(NAME_PROMPT, "Name cannot be empty. Please try again.", |s| {
                !s.is_empty()
            })
            .await?;
        let email = self
            .ask_until(
                EMAIL_PROMPT,
                "Invalid email format. Please try again.",
                is_valid_email,
            )
            .await?;
        let phone = self
            .ask_until(
                PHONE_PROMPT,
                "Invalid phone number format. Please try again.",
                is_valid_phone,
            )
            .await?;

        let contact = Contact { name, email, phone };
        self.contacts.save(&contact)?;
        info!(name = %contact.name, "Contact saved");
        Ok(contact)
    }

    /// Prompt for a new value of `field` and save it if it validates.
    ///
    /// Returns the reply for the user. An invalid value leaves the stored
    /// contact untouched.
    pub async fn update(&self, field: ContactField) -> Result<String, ToolError> {
        let Some(mut contact) = self.current()? else {
            return Ok(
                "I don't have your contact details yet. Say \"schedule a call\" to get started."
                    .to_string(),
            );
        };

        let reply = match field {
            ContactField::Email => {
                let email = self.prompter.ask("Please enter your new email: ").await?;
                let email = email.trim();
                if !is_valid_email(email) {
                    return Ok("Invalid email format. No changes made.".to_string());
                }
                contact.email = email.to_string();
                format!("Email updated successfully to: {}", email)
            }
            ContactField::Phone => {
                let phone = self
                    .prompter
                    .ask("Please enter your new phone number (with country code, e.g., +977 9818000000): ")
                    .await?;
                let phone = phone.trim();
                if !is_valid_phone(phone) {
                    return Ok("Invalid phone format. No changes made.".to_string());
                }
                contact.phone = phone.to_string();
                format!("Phone number updated successfully to: {}", phone)
            }
            ContactField::Name => {
                let name = self.prompter.ask("Please enter your new name: ").await?;
                let name = name.trim();
                if name.is_empty() {
                    return Ok("Invalid name format. No changes made.".to_string());
                }
                contact.name = name.to_string();
                format!("Name updated successfully to: {}", name)
            }
        };

        self.contacts.save(&contact)?;
        info!(field = %field, "Contact updated");
        Ok(reply)
    }

    async fn ask_until(
        &self,
        question: &str,
        retry_notice: &str,
        valid: impl Fn(&str) -> bool,
    ) -> Result<String, ToolError> {
        for attempt in 1..=self.max_attempts {
            let answer = self.prompter.ask(question).await?;
            let answer = answer.trim();
            if valid(answer) {
                return Ok(answer.to_string());
            }
            warn!(attempt, max = self.max_attempts, "Rejected contact input");
            if attempt < self.max_attempts {
                self.prompter.notify(retry_notice).await?;
            }
        }
        Err(ToolError::Validation(format!(
            "no valid answer to \"{}\" after {} attempts",
            question.trim_end_matches([':', ' ']),
            self.max_attempts
        )))
    }
}

#[async_trait]
impl ToolHandler for ContactTool {
    fn name(&self) -> &'static str {
        "Collect_User_Info"
    }

    fn description(&self) -> &'static str {
        "Use this to collect user's name, email, and phone number"
    }

    async fn run(&self, _input: &str) -> Result<String, ToolError> {
        let contact = self.collect().await?;
        Ok(format!(
            "Contact details saved:\nName: {}\nEmail: {}\nPhone: {}",
            contact.name, contact.email, contact.phone
        ))
    }
}
