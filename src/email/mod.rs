use axum::async_trait;
use lettre::{
    transport::smtp::authentication::Credentials, AsyncSmtpTransport, AsyncTransport, Message,
    Tokio1Executor,
};
use tracing::info;

use crate::config::SmtpConfig;

/// Outbound mail seam. Auth flows only ever need "deliver this text to
/// this address"; transport and rendering stay behind the trait.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    from: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(creds)
            .build();
        Ok(Self {
            from: config.from.clone(),
            transport,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .body(body.to_string())?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Used when SMTP is not configured: logs instead of delivering.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        info!(to = %to, subject = %subject, body = %body, "smtp not configured, logging email");
        Ok(())
    }
}

pub fn welcome_body(name: &str, user_type: &str) -> String {
    format!(
        "Hi {name},\nWelcome to HomeService Pro! Your account has been successfully created as a {user_type}.\n\nThank you for joining us!"
    )
}

pub fn otp_body(name: &str, otp: &str) -> String {
    format!(
        "Hi {name},\n\nYour OTP for password reset is: {otp}\n\nThis OTP is valid for 10 minutes.\n\nIf you didn't request this, please ignore this email."
    )
}

pub fn password_changed_body(name: &str) -> String {
    format!(
        "Hi {name},\n\nYour password has been successfully changed.\n\nIf you didn't make this change, please contact our support team immediately."
    )
}
