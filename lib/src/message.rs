use futures::future::try_join_all;

use crate::address::{format_bulk, format_single, AddressInput, Address};
use crate::attachment::AttachmentEncoder;
use crate::email::Mail;
use crate::errors::Result;
use crate::mailjet::types::{Message, TrackLinks};
use crate::OneOrMany;

fn parse_field(input: &Option<AddressInput>) -> Vec<Address> {
    input.as_ref().map(AddressInput::parse).unwrap_or_default()
}

/// Translates generic mails into provider messages.
///
/// Building a message has no side effects apart from reading attachment
/// sources.
#[derive(Clone, Debug)]
pub struct MessageBuilder {
    encoder: AttachmentEncoder,
}

impl MessageBuilder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            encoder: AttachmentEncoder::new()?,
        })
    }

    pub fn with_encoder(encoder: AttachmentEncoder) -> Self {
        Self { encoder }
    }

    /// Build one provider message from one mail.
    ///
    /// Template fields win over literal content: with `template_id` or
    /// `template_alias` set, subject, html and text are left out.
    pub async fn build(&self, mail: &Mail) -> Result<Message> {
        let track_links = mail
            .track_links
            .as_deref()
            .map(str::parse::<TrackLinks>)
            .transpose()?;

        let attachments = self.encoder.encode_all(&mail.attachments).await?;

        let base = Message {
            from: format_single(&parse_field(&mail.from)),
            to: format_bulk(&parse_field(&mail.to)),
            cc: format_bulk(&parse_field(&mail.cc)),
            bcc: format_bulk(&parse_field(&mail.bcc)),
            reply_to: format_single(&parse_field(&mail.reply_to)),
            headers: mail.headers.to_headers(),
            attachments,
            tag: mail.tag.clone(),
            metadata: mail.metadata.clone(),
            track_opens: mail.track_opens.clone(),
            track_links,
            ..Default::default()
        };

        let message = if let Some(ref id) = mail.template_id {
            Message {
                template_id: Some(id.clone()),
                template_model: mail.template_model.clone(),
                inline_css: mail.inline_css,
                ..base
            }
        } else if let Some(ref alias) = mail.template_alias {
            Message {
                template_alias: Some(alias.clone()),
                template_model: mail.template_model.clone(),
                inline_css: mail.inline_css,
                ..base
            }
        } else {
            Message {
                subject: mail.subject.clone(),
                html_part: mail.html.clone(),
                text_part: mail.text.clone(),
                ..base
            }
        };

        Ok(message)
    }

    /// Build messages for a list of mails.
    ///
    /// Mails are translated concurrently but the output keeps the input
    /// order. The first failing mail fails the whole batch.
    pub async fn build_all(&self, mails: &[Mail]) -> Result<Vec<Message>> {
        log::debug!("Translating {} mail(s)", mails.len());
        try_join_all(mails.iter().map(|mail| self.build(mail))).await
    }

    /// Translate one mail or a list of mails, keeping the shape of the input
    pub async fn translate(&self, mails: &OneOrMany<Mail>) -> Result<OneOrMany<Message>> {
        let single = mails.is_one();
        let messages = self.build_all(mails.as_slice()).await?;

        Ok(OneOrMany::from_vec(messages, single))
    }
}
