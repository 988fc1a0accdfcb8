//! Store request decision emails.
//!
//! Uses SMTP via lettre for delivery with Askama HTML and text templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use cradlix_core::StoreRequestStatus;

use crate::config::EmailConfig;
use crate::models::StoreRequest;

#[derive(Template)]
#[template(path = "email/store_request_approved.html")]
struct ApprovedHtml<'a> {
    applicant_name: &'a str,
    store_name: &'a str,
    note: Option<&'a str>,
    storefront_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/store_request_approved.txt")]
struct ApprovedText<'a> {
    applicant_name: &'a str,
    store_name: &'a str,
    note: Option<&'a str>,
    storefront_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/store_request_rejected.html")]
struct RejectedHtml<'a> {
    applicant_name: &'a str,
    store_name: &'a str,
    note: &'a str,
    storefront_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/store_request_rejected.txt")]
struct RejectedText<'a> {
    applicant_name: &'a str,
    store_name: &'a str,
    note: &'a str,
    storefront_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// The request has not been decided yet.
    #[error("store request {0} is still pending")]
    Undecided(i64),
}

/// Rendered subject and bodies.
#[derive(Debug)]
struct Rendered {
    subject: String,
    text: String,
    html: String,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    storefront_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            storefront_url: config.storefront_url.clone(),
        })
    }

    /// Tell the applicant, at the business email, how their store request
    /// was decided.
    ///
    /// # Errors
    ///
    /// Returns error if the request is undecided, a template fails to
    /// render, or delivery fails.
    pub async fn send_store_request_decision(&self, request: &StoreRequest) -> Result<(), EmailError> {
        let rendered = render_decision(request, &self.storefront_url)?;
        self.send_multipart_email(
            request.business_email.as_str(),
            &rendered.subject,
            &rendered.text,
            &rendered.html,
        )
        .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(subject = %subject, "Email sent successfully");
        Ok(())
    }
}

fn render_decision(request: &StoreRequest, storefront_url: &str) -> Result<Rendered, EmailError> {
    let applicant_name = request.applicant_name.as_str();
    let store_name = request.store_name.as_str();

    match request.status {
        StoreRequestStatus::Approved => {
            let note = request.admin_note.as_deref();
            Ok(Rendered {
                subject: format!("{store_name} is approved to sell on Cradlix"),
                text: ApprovedText { applicant_name, store_name, note, storefront_url }.render()?,
                html: ApprovedHtml { applicant_name, store_name, note, storefront_url }.render()?,
            })
        }
        StoreRequestStatus::Rejected => {
            let note = request.admin_note.as_deref().unwrap_or_default();
            Ok(Rendered {
                subject: format!("Update on your Cradlix store request for {store_name}"),
                text: RejectedText { applicant_name, store_name, note, storefront_url }.render()?,
                html: RejectedHtml { applicant_name, store_name, note, storefront_url }.render()?,
            })
        }
        StoreRequestStatus::Pending => Err(EmailError::Undecided(request.id.as_i64())),
    }
}
