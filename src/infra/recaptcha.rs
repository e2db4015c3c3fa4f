//! Outbound reCAPTCHA verification for contact submissions.

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::config::RecaptchaSettings;

#[derive(Debug, Error)]
pub enum RecaptchaError {
    /// The verification service rejected the token; the caller's fault.
    #[error("recaptcha verification failed: {codes:?}")]
    Rejected { codes: Vec<String> },
    /// The verification service could not be reached or answered garbage.
    #[error("recaptcha verification unavailable: {0}")]
    Transport(String),
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Verifier configured from settings; inert unless a secret key is present.
pub struct RecaptchaVerifier {
    secret: Option<String>,
    verify_url: String,
    client: reqwest::Client,
}

impl RecaptchaVerifier {
    pub fn new(settings: &RecaptchaSettings) -> Self {
        Self {
            secret: settings.secret_key.clone(),
            verify_url: settings.verify_url.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Verify a client token. Callers skip this entirely when no secret is
    /// configured or the submission carried no token.
    pub async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<(), RecaptchaError> {
        let Some(secret) = self.secret.as_deref() else {
            return Ok(());
        };

        let mut form = vec![("secret", secret), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let response = self
            .client
            .post(&self.verify_url)
            .form(&form)
            .send()
            .await
            .map_err(|err| RecaptchaError::Transport(err.to_string()))?;

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|err| RecaptchaError::Transport(err.to_string()))?;

        if body.success {
            Ok(())
        } else {
            warn!(
                target = "alexpetro::recaptcha",
                codes = ?body.error_codes,
                "recaptcha verification failed"
            );
            Err(RecaptchaError::Rejected {
                codes: body.error_codes,
            })
        }
    }
}
