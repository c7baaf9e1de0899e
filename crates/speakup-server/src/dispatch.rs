//! Fan-out of one SOS alert to every contact.
//!
//! Each recipient gets its own task. The dispatcher waits for all of them
//! to settle and counts outcomes; one recipient's failure never cancels or
//! taints another's delivery.

use std::sync::Arc;

use speakup_shared::{AlertPayload, DispatchResult};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn, Instrument};

use crate::error::ServerError;
use crate::mailer::{Mailer, OutgoingEmail};
use crate::template::render_alert;

pub struct Dispatcher {
    /// `None` when no email provider is configured.
    mailer: Option<Arc<dyn Mailer>>,
    from: String,
    max_contacts: usize,
}

impl Dispatcher {
    pub fn new(mailer: Option<Arc<dyn Mailer>>, from: String, max_contacts: usize) -> Self {
        Self {
            mailer,
            from,
            max_contacts,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.mailer.is_some()
    }

    /// Deliver `payload` to each contact independently.
    ///
    /// Errors when no attempt can be made at all (an empty or oversized
    /// contact list, or no mailer) and when the fan-out task itself dies.
    /// Otherwise returns the aggregate with
    /// `successful + failed == payload.contacts.len()`.
    pub async fn dispatch(&self, payload: &AlertPayload) -> Result<DispatchResult, ServerError> {
        if payload.contacts.is_empty() {
            return Err(ServerError::NoContacts);
        }
        if payload.contacts.len() > self.max_contacts {
            return Err(ServerError::BadRequest(format!(
                "Too many contacts: {} (max {})",
                payload.contacts.len(),
                self.max_contacts
            )));
        }
        let mailer = self
            .mailer
            .clone()
            .ok_or(ServerError::ServiceUnavailable)?;

        let mut invalid = 0;
        let mut emails = Vec::with_capacity(payload.contacts.len());
        for (index, contact) in payload.contacts.iter().enumerate() {
            if !contact.has_valid_email() {
                warn!(index, "contact has an invalid email address, not attempting delivery");
                invalid += 1;
                continue;
            }

            let alert = render_alert(contact, payload);
            emails.push((
                index,
                OutgoingEmail {
                    from: self.from.clone(),
                    to: contact.email.clone(),
                    subject: alert.subject,
                    html: alert.html,
                    text: alert.text,
                },
            ));
        }

        // The fan-out runs detached so deliveries complete even if the
        // caller stops waiting for the response.
        let fan_out = tokio::spawn(deliver_all(mailer, emails).in_current_span());
        let mut result = fan_out.await.map_err(fan_out_failed)?;
        result.failed += invalid;

        info!(
            successful = result.successful,
            failed = result.failed,
            "SOS dispatch settled"
        );

        Ok(result)
    }
}

/// Send every email on its own task and wait for all of them to settle.
async fn deliver_all(mailer: Arc<dyn Mailer>, emails: Vec<(usize, OutgoingEmail)>) -> DispatchResult {
    let mut result = DispatchResult::default();
    let mut tasks = JoinSet::new();

    for (index, email) in emails {
        let mailer = mailer.clone();
        tasks.spawn(async move { (index, mailer.send(&email).await) }.in_current_span());
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(()))) => {
                debug!(index, "alert delivered");
                result.successful += 1;
            }
            Ok((index, Err(e))) => {
                warn!(index, error = %e, "alert delivery failed");
                result.failed += 1;
            }
            Err(e) => {
                error!(error = %e, "delivery task did not complete");
                result.failed += 1;
            }
        }
    }

    result
}

fn fan_out_failed(e: JoinError) -> ServerError {
    error!(error = %e, "SOS fan-out task did not complete");
    ServerError::Internal(e.to_string())
}
