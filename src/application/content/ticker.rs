//! News ticker CRUD. Ticker edits are admin-only, low-fanout data and do not
//! broadcast change events.

use std::sync::Arc;

use alexpetro_api_types::TickerMessage;

use crate::application::repos::TickerRepo;

use super::validate::{TICKER_MESSAGE_MAX, require_text};
use super::ContentError;

#[derive(Clone)]
pub struct TickerService {
    repo: Arc<dyn TickerRepo>,
}

impl TickerService {
    pub fn new(repo: Arc<dyn TickerRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<TickerMessage>, ContentError> {
        let messages = self
            .repo
            .list_messages()
            .await
            .map_err(ContentError::from_repo)?;
        Ok(messages.into_iter().map(TickerMessage::from).collect())
    }

    pub async fn create(&self, message: String) -> Result<TickerMessage, ContentError> {
        let message = checked(&message)?;
        let record = self
            .repo
            .create_message(message)
            .await
            .map_err(ContentError::from_repo)?;
        Ok(TickerMessage::from(record))
    }

    pub async fn update(&self, id: i64, message: String) -> Result<TickerMessage, ContentError> {
        let message = checked(&message)?;
        let record = self
            .repo
            .update_message(id, message)
            .await
            .map_err(ContentError::from_repo)?;
        Ok(TickerMessage::from(record))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContentError> {
        self.repo
            .delete_message(id)
            .await
            .map_err(ContentError::from_repo)?;
        Ok(())
    }
}

fn checked(message: &str) -> Result<String, ContentError> {
    require_text("message", message, TICKER_MESSAGE_MAX)
        .map_err(|err| ContentError::validation(vec![err]))
}
