use async_trait::async_trait;
use chrono::NaiveDateTime;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::Config;
use crate::models::message::DueMessage;
use crate::utils::time::format_timestamp;

/// Outbound email abstraction. Implementations must never panic or raise:
/// any transport or build failure is reported as `false`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, text_body: &str, html_body: &str) -> bool;
}

#[derive(Clone)]
pub struct SmtpMailer {
    server: String,
    port: u16,
    username: String,
    password: String,
    from: String,
    from_name: String,
    starttls: bool,
}

impl SmtpMailer {
    pub fn from_config(config: &Config) -> Self {
        Self {
            server: config.mail_server.clone(),
            port: config.mail_port,
            username: config.mail_username.clone(),
            password: config.mail_password.clone(),
            from: config.mail_from.clone(),
            from_name: config.mail_from_name.clone(),
            starttls: config.mail_starttls,
        }
    }

    async fn try_send(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> anyhow::Result<()> {
        let from: Mailbox = format!("{} <{}>", self.from_name, self.from).parse()?;
        let email = Message::builder()
            .from(from)
            .to(to.parse()?)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                text_body.to_string(),
                html_body.to_string(),
            ))?;

        let builder = if self.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.server)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.server)?
        };
        let mailer = builder
            .port(self.port)
            .credentials(Credentials::new(self.username.clone(), self.password.clone()))
            .build();

        mailer.send(email).await?;
        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, text_body: &str, html_body: &str) -> bool {
        match self.try_send(to, subject, text_body, html_body).await {
            Ok(()) => {
                tracing::info!(to, subject, "Email sent");
                true
            }
            Err(e) => {
                tracing::error!(to, subject, error = %e, "Failed to send email");
                false
            }
        }
    }
}

pub struct EmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// The message itself, sent to the recipient when its delivery time arrives.
pub fn delivery_email(msg: &DueMessage) -> EmailContent {
    let scheduled = format_timestamp(msg.delivery_date);
    EmailContent {
        subject: format!("Your AfterLife Message: {}", msg.title),
        text: msg.content.clone(),
        html: format!(
            "<html>\n  <body>\n    <h2>{}</h2>\n    <p>{}</p>\n    <p>This message was scheduled for delivery on {} UTC</p>\n  </body>\n</html>",
            msg.title, msg.content, scheduled
        ),
    }
}

/// Best-effort confirmation sent after a successful delivery.
pub fn confirmation_email(recipient: &str, title: &str, delivery_date: NaiveDateTime) -> EmailContent {
    let scheduled = format_timestamp(delivery_date);
    EmailContent {
        subject: format!("Your AfterLife Message '{}' has been delivered", title),
        text: format!(
            "Dear {},\n\nYour AfterLife Message \"{}\" has been delivered as scheduled on {}.\n\nBest regards,\nThe AfterLife Team",
            recipient, title, scheduled
        ),
        html: format!(
            "<html>\n  <body>\n    <h2>Message Delivered</h2>\n    <p>Dear {},</p>\n    <p>Your AfterLife Message \"<strong>{}</strong>\" has been delivered as scheduled on {}.</p>\n    <p>Best regards,<br>The AfterLife Team</p>\n  </body>\n</html>",
            recipient, title, scheduled
        ),
    }
}

/// Sent when a message is created or rescheduled, if confirmations are on.
pub fn scheduled_email(recipient: &str, title: &str, delivery_date: NaiveDateTime) -> EmailContent {
    let scheduled = format_timestamp(delivery_date);
    EmailContent {
        subject: format!("Your AfterLife Message '{}' has been scheduled", title),
        text: format!(
            "Dear {},\n\nYour AfterLife Message \"{}\" has been scheduled for delivery on {}.\n\nBest regards,\nThe AfterLife Team",
            recipient, title, scheduled
        ),
        html: format!(
            "<html>\n  <body>\n    <h2>Message Scheduled</h2>\n    <p>Dear {},</p>\n    <p>Your AfterLife Message \"<strong>{}</strong>\" has been scheduled for delivery on {}.</p>\n    <p>Best regards,<br>The AfterLife Team</p>\n  </body>\n</html>",
            recipient, title, scheduled
        ),
    }
}

pub fn test_email() -> EmailContent {
    EmailContent {
        subject: "Test Email from AfterLife Message Platform".to_string(),
        text: "This is a test email to verify the email sending functionality.".to_string(),
        html: "<html>\n  <body>\n    <h2>Test Email</h2>\n    <p>This is a test email to verify the email sending functionality.</p>\n    <p>If you received this email, the email system is working correctly!</p>\n  </body>\n</html>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snapshot() -> DueMessage {
        DueMessage {
            id: 7,
            title: "To my daughter".to_string(),
            content: "Always be kind.".to_string(),
            recipient_email: Some("daughter@example.com".to_string()),
            delivery_date: NaiveDate::from_ymd_opt(2031, 5, 20)
                .unwrap()
                .and_hms_opt(14, 30, 0)
                .unwrap(),
            is_delivered: false,
        }
    }

    #[test]
    fn delivery_email_carries_title_content_and_schedule() {
        let email = delivery_email(&snapshot());
        assert_eq!(email.subject, "Your AfterLife Message: To my daughter");
        assert_eq!(email.text, "Always be kind.");
        assert!(email.html.contains("<h2>To my daughter</h2>"));
        assert!(email.html.contains("2031-05-20 14:30:00"));
    }

    #[test]
    fn confirmation_email_mentions_delivery() {
        let email = confirmation_email("daughter@example.com", "To my daughter", snapshot().delivery_date);
        assert!(email.subject.contains("has been delivered"));
        assert!(email.text.contains("Dear daughter@example.com"));
        assert!(email.html.contains("2031-05-20 14:30:00"));
    }

    #[test]
    fn scheduled_email_mentions_scheduling() {
        let email = scheduled_email("someone@example.com", "Later", snapshot().delivery_date);
        assert!(email.subject.contains("has been scheduled"));
        assert!(email.html.contains("Message Scheduled"));
    }
}
