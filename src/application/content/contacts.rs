//! Contact submissions and the admin inbox. Contact mutations do not
//! broadcast change events.

use std::sync::Arc;

use alexpetro_api_types::{ContactMessage, ContactStats, ContactSubmitReceipt};

use crate::application::mail::{ContactNotification, MailNotifier};
use crate::application::repos::{ContactQueryFilter, ContactsRepo, CreateContactParams};

use super::validate::{TITLE_MAX, contact_message, contact_name, email_address, require_text};
use super::{ContentError, collect};

#[derive(Debug, Clone, Default)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Clone)]
pub struct ContactsService {
    repo: Arc<dyn ContactsRepo>,
    mail: MailNotifier,
}

impl ContactsService {
    pub fn new(repo: Arc<dyn ContactsRepo>, mail: MailNotifier) -> Self {
        Self { repo, mail }
    }

    /// Insert the message and hand a notification to the mail queue. The
    /// response never waits on delivery.
    pub async fn submit(&self, input: ContactInput) -> Result<ContactSubmitReceipt, ContentError> {
        let mut errors = Vec::new();
        let name = collect(&mut errors, contact_name(&input.name));
        let email = collect(&mut errors, email_address(&input.email));
        let subject = collect(&mut errors, require_text("subject", &input.subject, TITLE_MAX));
        let message = collect(&mut errors, contact_message(&input.message));

        let (Some(name), Some(email), Some(subject), Some(message)) =
            (name, email, subject, message)
        else {
            return Err(ContentError::validation(errors));
        };

        let record = self
            .repo
            .create_contact(CreateContactParams {
                name,
                email,
                subject,
                message,
            })
            .await
            .map_err(ContentError::from_repo)?;

        self.mail.enqueue(ContactNotification {
            id: record.id,
            name: record.name.clone(),
            email: record.email.clone(),
            subject: record.subject.clone(),
            message: record.message.clone(),
            received_at: record.created_at,
        });

        Ok(ContactSubmitReceipt {
            id: record.id,
            submitted_at: record.created_at,
        })
    }

    pub async fn list(
        &self,
        filter: ContactQueryFilter,
    ) -> Result<Vec<ContactMessage>, ContentError> {
        let contacts = self
            .repo
            .list_contacts(&filter)
            .await
            .map_err(ContentError::from_repo)?;
        Ok(contacts.into_iter().map(ContactMessage::from).collect())
    }

    pub async fn get(&self, id: i64) -> Result<ContactMessage, ContentError> {
        let record = self
            .repo
            .find_contact(id)
            .await
            .map_err(ContentError::from_repo)?
            .ok_or(ContentError::NotFound)?;
        Ok(ContactMessage::from(record))
    }

    pub async fn set_replied(
        &self,
        id: i64,
        is_replied: bool,
    ) -> Result<ContactMessage, ContentError> {
        let record = self
            .repo
            .set_contact_replied(id, is_replied)
            .await
            .map_err(ContentError::from_repo)?;
        Ok(ContactMessage::from(record))
    }

    /// Unknown ids report not-found; the admin inbox relies on it.
    pub async fn delete(&self, id: i64) -> Result<(), ContentError> {
        self.repo
            .delete_contact(id)
            .await
            .map_err(ContentError::from_repo)
    }

    pub async fn stats(&self) -> Result<ContactStats, ContentError> {
        self.repo
            .contact_stats()
            .await
            .map_err(ContentError::from_repo)
    }
}
