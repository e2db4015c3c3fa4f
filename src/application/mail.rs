//! Outbound mail notification for contact submissions.
//!
//! Submissions hand a notification to a bounded queue and return immediately;
//! a spawned worker delivers through the SendGrid HTTP API. Delivery problems
//! are logged on the worker's side and never reach the submitter.

use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc2822;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::MailSettings;

const QUEUE_DEPTH: usize = 64;

#[derive(Debug, Clone)]
pub struct ContactNotification {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub received_at: OffsetDateTime,
}

/// Queue handle given to the contact service.
#[derive(Clone)]
pub struct MailNotifier {
    tx: Option<mpsc::Sender<ContactNotification>>,
}

impl MailNotifier {
    /// Notifier that drops everything; used when mail is unconfigured and in
    /// tests.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Start the delivery worker when an API key is configured.
    pub fn spawn(settings: &MailSettings) -> (Self, Option<JoinHandle<()>>) {
        let Some(api_key) = settings.sendgrid_api_key.clone() else {
            warn!(
                target = "alexpetro::mail",
                "no mail configuration found, contact notifications will not be sent"
            );
            return (Self::disabled(), None);
        };

        let (tx, mut rx) = mpsc::channel::<ContactNotification>(QUEUE_DEPTH);
        let delivery = Delivery {
            client: reqwest::Client::new(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key,
            company_email: settings.company_email.clone(),
            from_address: settings.from_address.clone(),
        };

        let handle = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                let contact_id = notification.id;
                match delivery.send(&notification).await {
                    Ok(()) => {
                        info!(
                            target = "alexpetro::mail",
                            contact_id, "contact notification email sent"
                        );
                    }
                    Err(err) => {
                        error!(
                            target = "alexpetro::mail",
                            contact_id,
                            error = %err,
                            "failed to send contact notification email"
                        );
                    }
                }
            }
        });

        (Self { tx: Some(tx) }, Some(handle))
    }

    /// Non-blocking handoff. A full queue drops the notification with a log
    /// line; the HTTP response does not wait on delivery either way.
    pub fn enqueue(&self, notification: ContactNotification) {
        let Some(tx) = &self.tx else {
            return;
        };
        if let Err(err) = tx.try_send(notification) {
            warn!(
                target = "alexpetro::mail",
                error = %err,
                "mail queue rejected contact notification"
            );
            metrics::counter!("alexpetro_mail_dropped_total").increment(1);
        }
    }
}

struct Delivery {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    company_email: String,
    from_address: String,
}

impl Delivery {
    async fn send(&self, notification: &ContactNotification) -> Result<(), String> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": self.company_email }] }],
            "from": { "email": self.from_address },
            "subject": format!("New Contact Form Message: {}", notification.subject),
            "content": [
                { "type": "text/plain", "value": contact_email_text(notification) },
                { "type": "text/html", "value": contact_email_html(notification) },
            ],
        });

        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| err.to_string())?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("mail provider responded {}", response.status()))
        }
    }
}

fn received_label(at: OffsetDateTime) -> String {
    at.format(&Rfc2822).unwrap_or_else(|_| at.to_string())
}

fn contact_email_text(n: &ContactNotification) -> String {
    format!(
        "New Contact Form Message\n\n\
         From: {} ({})\n\
         Subject: {}\n\
         Received: {}\n\n\
         Message:\n{}\n\n\
         ---\n\
         This message was sent from the Alexandria Petroleum Company contact form.\n\
         Message ID: {}\n",
        n.name,
        n.email,
        n.subject,
        received_label(n.received_at),
        n.message,
        n.id
    )
}

fn contact_email_html(n: &ContactNotification) -> String {
    format!(
        "<html><body>\
         <h1>New Contact Form Message</h1>\
         <p><strong>From:</strong> {} ({})</p>\
         <p><strong>Subject:</strong> {}</p>\
         <p><strong>Received:</strong> {}</p>\
         <p><strong>Message:</strong></p><p>{}</p>\
         <hr><p>Message ID: {}</p>\
         </body></html>",
        escape_html(&n.name),
        escape_html(&n.email),
        escape_html(&n.subject),
        received_label(n.received_at),
        escape_html(&n.message).replace('\n', "<br>"),
        n.id
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample() -> ContactNotification {
        ContactNotification {
            id: 12,
            name: "O'Neil <script>".to_string(),
            email: "oneil@example.com".to_string(),
            subject: "Supply & demand".to_string(),
            message: "line one\nline two".to_string(),
            received_at: datetime!(2025-06-01 09:30 UTC),
        }
    }

    #[test]
    fn html_body_escapes_user_content() {
        let html = contact_email_html(&sample());
        assert!(html.contains("O&#039;Neil &lt;script&gt;"));
        assert!(html.contains("Supply &amp; demand"));
        assert!(html.contains("line one<br>line two"));
    }

    #[test]
    fn text_body_carries_the_message_id() {
        let text = contact_email_text(&sample());
        assert!(text.contains("Message ID: 12"));
        assert!(text.contains("From: O'Neil <script> (oneil@example.com)"));
    }

    #[test]
    fn disabled_notifier_swallows_enqueues() {
        MailNotifier::disabled().enqueue(sample());
    }
}
