//! Best-effort SMS notification dispatcher.
//!
//! After a successful pointer append the recipient gets an out-of-band
//! "you have a new message" alert.  The alert is advisory: it runs as a
//! detached task with a bounded timeout, its outcome is never awaited by
//! the request, and every failure is dropped after a dead-letter log line.
//!
//! The destination number is the recipient's encrypted `phoneNumber`
//! profile attribute, resolved inside the vault via the Twilio passthrough.
//! This server never sees a phone number.

use std::time::Duration;

use tracing::{debug, warn};

use sotto_shared::types::UserId;
use sotto_vault::{TwilioCredentials, VaultClient, VaultError};

use crate::config::SmsConfig;

/// Handle to the notification channel.  Constructed once at startup.
pub struct Notifier {
    sms: Option<SmsConfig>,
}

impl Notifier {
    pub fn new(sms: Option<SmsConfig>) -> Self {
        Self { sms }
    }

    /// Fire-and-forget: spawn the notification attempt and return
    /// immediately.  `vault` must hold a credential authorized to message
    /// the recipient -- the sender's delegated client is.
    pub fn dispatch(&self, vault: VaultClient, recipient: UserId, sender: UserId) {
        let Some(sms) = self.sms.clone() else {
            debug!(recipient = %recipient, "SMS not configured, skipping notification");
            return;
        };

        tokio::spawn(async move {
            let deadline = Duration::from_secs(sms.notify_timeout_secs);
            let attempt = send_alert(&vault, &sms, &recipient, &sender);

            match tokio::time::timeout(deadline, attempt).await {
                Ok(Ok(())) => debug!(recipient = %recipient, "notification sent"),
                Ok(Err(e)) => {
                    warn!(recipient = %recipient, error = %e, "notification dropped")
                }
                Err(_) => warn!(
                    recipient = %recipient,
                    timeout_secs = sms.notify_timeout_secs,
                    "notification timed out, dropped"
                ),
            }
        });
    }
}

/// One notification attempt.  Separate from [`Notifier::dispatch`] so the
/// send path can be tested without the detached task around it.
pub(crate) async fn send_alert(
    vault: &VaultClient,
    sms: &SmsConfig,
    recipient: &UserId,
    sender: &UserId,
) -> Result<(), VaultError> {
    // The link points at the web frontend, which redirects into the app.
    let body = format!(
        "You have a new message: {}/conversation/{}",
        sms.conversation_link_base.trim_end_matches('/'),
        sender
    );

    let credentials = TwilioCredentials {
        account_sid: sms.account_sid.clone(),
        key_sid: sms.key_sid.clone(),
        key_secret: sms.key_secret.clone(),
    };

    vault
        .send_sms_twilio(&credentials, recipient, &sms.from_number, &body)
        .await
}
