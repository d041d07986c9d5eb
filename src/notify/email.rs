//! Email announcer.
//!
//! Message rendering lives here; delivery goes through an [`EmailSender`]
//! so the transport can be swapped out.

use std::sync::Arc;

use async_trait::async_trait;

use super::Announcer;
use crate::error::Result;
use crate::models::{EmailConfig, EmailProvider, Release};

/// A rendered announcement email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Email transport.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Sends one plain-text email per release.
pub struct EmailAnnouncer {
    sender: Arc<dyn EmailSender>,
    from: String,
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    enabled: bool,
}

impl EmailAnnouncer {
    pub fn new(sender: Arc<dyn EmailSender>, config: &EmailConfig) -> Self {
        Self {
            sender,
            from: config.from.clone(),
            to: config.to.clone(),
            cc: config.cc.clone(),
            bcc: config.bcc.clone(),
            enabled: config.enabled && !config.to.is_empty(),
        }
    }

    pub fn render(&self, release: &Release) -> EmailMessage {
        EmailMessage {
            from: self.from.clone(),
            to: self.to.clone(),
            cc: self.cc.clone(),
            bcc: self.bcc.clone(),
            subject: format!("New release alert for project {}!", release.project_name),
            body: release.announcement(),
        }
    }
}

#[async_trait]
impl Announcer for EmailAnnouncer {
    fn name(&self) -> &str {
        "email"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn notify(&self, release: &Release) -> Result<()> {
        self.sender.send(&self.render(release)).await
    }
}

/// Build the email announcer for the configured provider.
#[cfg(feature = "aws")]
pub async fn from_config(config: &EmailConfig) -> Result<EmailAnnouncer> {
    let sender: Arc<dyn EmailSender> = match config.provider {
        EmailProvider::Ses => Arc::new(ses::SesSender::from_config(&config.ses).await),
    };
    Ok(EmailAnnouncer::new(sender, config))
}

#[cfg(not(feature = "aws"))]
pub async fn from_config(config: &EmailConfig) -> Result<EmailAnnouncer> {
    match config.provider {
        EmailProvider::Ses => Err(crate::error::AppError::config(
            "email provider 'ses' requires the `aws` feature",
        )),
    }
}

#[cfg(feature = "aws")]
pub mod ses {
    //! Amazon SES transport.

    use async_trait::async_trait;
    use aws_sdk_sesv2::Client;
    use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};

    use super::{EmailMessage, EmailSender};
    use crate::error::{AppError, Result};
    use crate::models::SesConfig;
    use crate::storage::s3::load_sdk_config;

    pub struct SesSender {
        client: Client,
    }

    impl SesSender {
        pub fn new(client: Client) -> Self {
            Self { client }
        }

        pub async fn from_config(config: &SesConfig) -> Self {
            let sdk_config =
                load_sdk_config(&config.region, &config.access_key, &config.secret_key, None)
                    .await;
            Self::new(Client::new(&sdk_config))
        }
    }

    fn utf8(data: &str) -> Result<Content> {
        Content::builder()
            .data(data)
            .charset("UTF-8")
            .build()
            .map_err(AppError::email)
    }

    #[async_trait]
    impl EmailSender for SesSender {
        async fn send(&self, message: &EmailMessage) -> Result<()> {
            let destination = Destination::builder()
                .set_to_addresses(Some(message.to.clone()))
                .set_cc_addresses(Some(message.cc.clone()))
                .set_bcc_addresses(Some(message.bcc.clone()))
                .build();

            let body = Body::builder().text(utf8(&message.body)?).build();
            let content = EmailContent::builder()
                .simple(
                    Message::builder()
                        .subject(utf8(&message.subject)?)
                        .body(body)
                        .build(),
                )
                .build();

            self.client
                .send_email()
                .from_email_address(&message.from)
                .destination(destination)
                .content(content)
                .send()
                .await
                .map_err(|err| AppError::email(err.into_service_error()))?;

            log::debug!("SES accepted email to {} recipient(s)", message.to.len());
            Ok(())
        }
    }
}
