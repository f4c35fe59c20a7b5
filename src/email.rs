//! Email service for newsletter and order notifications.

use lettre::{
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::path::Path;

use crate::{config::Config, errors::Error};

pub struct EmailService {
    transport: EmailTransport,
    from_email: String,
    from_name: String,
    site_url: String,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl EmailService {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let email_config = &config.email;

        let transport = match &email_config.transport {
            crate::config::EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    tracing::warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let smtp_builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                } else {
                    Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host))
                }
                .map_err(|e| Error::Internal {
                    operation: format!("create SMTP transport: {e}"),
                })?
                .port(*port)
                .credentials(Credentials::new(username.clone(), password.clone()));

                EmailTransport::Smtp(smtp_builder.build())
            }
            crate::config::EmailTransportConfig::File { path } => {
                // File transport for development/testing
                let emails_dir = Path::new(path);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                        operation: format!("create emails directory: {e}"),
                    })?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        Ok(Self {
            transport,
            from_email: email_config.from_email.clone(),
            from_name: email_config.from_name.clone(),
            site_url: config.site_url.clone(),
        })
    }

    pub async fn send_subscription_confirmation(&self, to_email: &str, token: &str) -> Result<(), Error> {
        let confirm_link = format!("{}/api/newsletter/confirm?token={}", self.site_url, token);
        let body = self.create_confirmation_body(&confirm_link);

        self.send_email(to_email, "Confirm your subscription", &body).await
    }

    pub async fn send_order_confirmation(&self, to_email: &str, order_id: &uuid::Uuid, amount: &str, currency: &str) -> Result<(), Error> {
        let body = self.create_order_body(order_id, amount, currency);

        self.send_email(to_email, "Your order is confirmed", &body).await
    }

    /// Send one campaign mail. The caller records the outcome in the send log.
    pub async fn send_campaign_email(&self, to_email: &str, subject: &str, body_html: &str) -> Result<(), Error> {
        self.send_email(to_email, subject, body_html).await
    }

    async fn send_email(&self, to_email: &str, subject: &str, body: &str) -> Result<(), Error> {
        let from = format!("{} <{}>", self.from_name, self.from_email)
            .parse::<Mailbox>()
            .map_err(|e| Error::Internal {
                operation: format!("parse from email: {e}"),
            })?;

        let to = to_email.parse::<Mailbox>().map_err(|e| Error::Internal {
            operation: format!("parse to email: {e}"),
        })?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| Error::Internal {
                operation: format!("build email message: {e}"),
            })?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send file email: {e}"),
                })?;
            }
        }

        Ok(())
    }

    fn create_confirmation_body(&self, confirm_link: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<body>
    <h2>Confirm your subscription</h2>
    <p>Thanks for signing up to the newsletter. Click the link below to confirm:</p>
    <p><a href="{confirm_link}">Confirm subscription</a></p>
    <p>Or copy and paste this link into your browser:</p>
    <p>{confirm_link}</p>
    <p>If you didn't request this, you can safely ignore this email.</p>
</body>
</html>"#
        )
    }

    fn create_order_body(&self, order_id: &uuid::Uuid, amount: &str, currency: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<body>
    <h2>Order confirmed</h2>
    <p>Your payment of {amount} {currency} was received.</p>
    <p>Order reference: {order_id}</p>
    <p>Purchased media is available from your account for the access window shown at checkout.</p>
</body>
</html>"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.email.transport = crate::config::EmailTransportConfig::File {
            path: std::env::temp_dir().join("storefront-test-emails").to_string_lossy().into_owned(),
        };
        config
    }

    #[tokio::test]
    async fn test_email_service_creation() {
        let config = test_config();
        assert!(EmailService::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_confirmation_body_contains_link() {
        let config = test_config();
        let service = EmailService::new(&config).unwrap();

        let body = service.create_confirmation_body("http://localhost:3000/api/newsletter/confirm?token=abc123");

        assert!(body.contains("Confirm subscription"));
        assert!(body.contains("token=abc123"));
    }

    #[tokio::test]
    async fn test_order_body_contains_amount_and_reference() {
        let config = test_config();
        let service = EmailService::new(&config).unwrap();
        let order_id = uuid::Uuid::new_v4();

        let body = service.create_order_body(&order_id, "25.00", "USD");

        assert!(body.contains("25.00 USD"));
        assert!(body.contains(&order_id.to_string()));
    }
}
