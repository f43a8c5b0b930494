//! Email delivery service using lettre/SMTP.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::content::ContactNotifier;
use crate::models::ContactSubmission;

const SENDER_NAME: &str = "Electrolyte Solutions Website";

/// Email delivery service.
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    /// Recipient of contact form notifications.
    notify_to: String,
}

impl EmailService {
    /// Create a new email service.
    ///
    /// `encryption` controls the SMTP transport mode:
    /// - `"starttls"` (default): Opportunistic STARTTLS on port 587
    /// - `"tls"`: Implicit TLS (SMTPS) on port 465
    /// - `"none"`: Unencrypted (for local dev only)
    pub fn new(
        smtp_host: &str,
        smtp_port: u16,
        smtp_username: Option<&str>,
        smtp_password: Option<&str>,
        encryption: &str,
        from_email: String,
        notify_to: String,
    ) -> Result<Self> {
        let mut builder = match encryption {
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)
                .context("failed to create SMTP relay transport")?
                .port(smtp_port),
            "none" => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host).port(smtp_port)
            }
            _ => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
                .context("failed to create SMTP STARTTLS transport")?
                .port(smtp_port),
        };

        if let (Some(user), Some(pass)) = (smtp_username, smtp_password) {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(Self {
            transport: builder.build(),
            from_email,
            notify_to,
        })
    }

    fn build_notification(&self, submission: &ContactSubmission) -> Result<Message> {
        let from = Mailbox::new(
            Some(SENDER_NAME.to_string()),
            self.from_email
                .parse()
                .context("invalid from email address")?,
        );

        Message::builder()
            .from(from)
            .to(self
                .notify_to
                .parse()
                .context("invalid recipient email address")?)
            .reply_to(
                submission
                    .email
                    .parse()
                    .context("invalid submitter email address")?,
            )
            .subject(notification_subject(submission))
            .header(ContentType::TEXT_HTML)
            .body(notification_body(submission))
            .context("failed to build email message")
    }
}

#[async_trait]
impl ContactNotifier for EmailService {
    async fn notify(&self, submission: &ContactSubmission) -> Result<()> {
        let email = self.build_notification(submission)?;
        self.transport
            .send(email)
            .await
            .context("failed to send email")?;
        Ok(())
    }
}

/// Subject line for a contact notification.
pub fn notification_subject(submission: &ContactSubmission) -> String {
    format!(
        "New Contact Form: {} - from {}",
        submission.subject.as_deref().unwrap_or("No Subject"),
        submission.full_name()
    )
}

/// HTML body for a contact notification. Submitted values are escaped.
pub fn notification_body(submission: &ContactSubmission) -> String {
    fn or_na(value: Option<&str>) -> String {
        html_escape(value.filter(|v| !v.trim().is_empty()).unwrap_or("N/A"))
    }

    let rows = [
        ("Name", html_escape(&submission.full_name())),
        ("Email", html_escape(&submission.email)),
        ("Phone", or_na(submission.phone.as_deref())),
        ("Company", or_na(submission.company.as_deref())),
        ("Subject", or_na(submission.subject.as_deref())),
        ("Message", html_escape(&submission.message)),
    ];

    let mut html = String::from(
        "<h2>New Contact Form Submission</h2>\n\
         <table style=\"border-collapse:collapse;width:100%;max-width:600px;\">\n",
    );
    for (label, value) in rows {
        html.push_str(&format!(
            "  <tr><td style=\"padding:8px;border:1px solid #ddd;font-weight:bold;\">{label}</td>\
             <td style=\"padding:8px;border:1px solid #ddd;\">{value}</td></tr>\n"
        ));
    }
    html.push_str("</table>\n");
    html.push_str(&format!(
        "<p style=\"color:#888;font-size:12px;margin-top:16px;\">Submitted on {}</p>\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html
}

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
