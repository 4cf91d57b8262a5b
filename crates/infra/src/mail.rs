//! Outbound mail port.
//!
//! Real SMTP delivery lives outside this workspace; `LogMailer` stands in for
//! development and only writes the invitation to the log.

use async_trait::async_trait;
use thiserror::Error;

use warden_auth::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub to: String,
    pub display_name: String,
    pub role: Role,
    pub invited_by: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_invitation(&self, invitation: &Invitation) -> Result<(), MailError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_invitation(&self, invitation: &Invitation) -> Result<(), MailError> {
        tracing::info!(
            to = %invitation.to,
            role = %invitation.role,
            invited_by = %invitation.invited_by,
            "invitation sent (log transport)"
        );
        Ok(())
    }
}
