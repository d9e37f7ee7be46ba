use crate::client::{Client, RawResult};
use crate::config::TransportOptions;
use crate::email::Mail;
use crate::errors::Result;
use crate::mailjet::api::{API_VERSION, SEND_METHOD};
use crate::mailjet::types::{Message, SendRequest};
use crate::mailjet::MailjetClient;
use crate::message::MessageBuilder;
use crate::response::{normalize_response, DeliveryReport};
use crate::OneOrMany;

pub const NAME: &str = "Mailjet";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Outcome of one submission
#[derive(Clone, Debug, PartialEq)]
pub struct SentMail {
    pub raw: RawResult,
    pub report: DeliveryReport,
}

/// Sends mails through the Mailjet Send API.
///
/// One submission is one call to the client. Nothing is sent when any mail
/// fails to translate.
pub struct Transport {
    client: Box<dyn Client>,
    builder: MessageBuilder,
    sandbox_mode: bool,
}

impl Transport {
    pub fn new(options: &TransportOptions) -> Result<Self> {
        let client = MailjetClient::from_options(options)?;
        Self::with_client(client, options.sandbox_mode)
    }

    pub fn with_client(client: impl Client + 'static, sandbox_mode: bool) -> Result<Self> {
        Ok(Self {
            client: Box::new(client),
            builder: MessageBuilder::new()?,
            sandbox_mode,
        })
    }

    pub fn with_builder(mut self, builder: MessageBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn name(&self) -> &'static str {
        NAME
    }

    pub fn version(&self) -> &'static str {
        VERSION
    }

    /// Translate mails into provider messages without sending them
    pub async fn parse(&self, mails: &OneOrMany<Mail>) -> Result<OneOrMany<Message>> {
        self.builder.translate(mails).await
    }

    pub async fn send(&self, mail: &Mail) -> Result<SentMail> {
        let messages = self.builder.build_all(std::slice::from_ref(mail)).await?;
        self.submit(messages).await
    }

    #[deprecated(note = "use `send` for each mail, or `parse` for translation only")]
    pub async fn send_batch(&self, mails: &[Mail]) -> Result<SentMail> {
        let messages = self.builder.build_all(mails).await?;
        self.submit(messages).await
    }

    async fn submit(&self, messages: Vec<Message>) -> Result<SentMail> {
        let request = SendRequest {
            messages,
            sandbox_mode: self.sandbox_mode,
        };

        log::info!(
            "Submitting {} message(s) to {} (sandbox mode: {})",
            request.messages.len(),
            NAME,
            request.sandbox_mode
        );

        let raw = match self.client.post(SEND_METHOD, API_VERSION, &request).await {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Send request failed: {}", e);
                return Err(e.into());
            }
        };

        // Request was accepted even if the body is unreadable
        let report = match raw.json() {
            Ok(resp) => normalize_response(&resp),
            Err(e) => {
                log::warn!("Could not decode {} response ({}): {}", NAME, raw.status, e);
                DeliveryReport::default()
            }
        };

        log::info!(
            "{} accepted, {} rejected",
            report.accepted.len(),
            report.rejected.len()
        );

        Ok(SentMail { raw, report })
    }
}
