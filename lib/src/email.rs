//! Generic mail descriptor, as handed to a transport by a mail composing
//! library. Every field is optional; the provider schema is only produced
//! by the message builder.
use serde::Deserialize;

use crate::address::AddressInput;
use crate::attachment::AttachmentSpec;
use crate::errors::{Error, Result};
use crate::headers::{HeaderEntry, HeaderValue, HeadersInput};
use crate::mailjet::types::TemplateId;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mail {
    pub from: Option<AddressInput>,
    pub to: Option<AddressInput>,
    pub cc: Option<AddressInput>,
    pub bcc: Option<AddressInput>,
    pub reply_to: Option<AddressInput>,

    pub subject: Option<String>,
    pub html: Option<String>,
    pub text: Option<String>,

    /// Takes precedence over `template_alias` and the literal content fields
    pub template_id: Option<TemplateId>,
    pub template_alias: Option<String>,
    pub template_model: Option<serde_json::Value>,
    pub inline_css: Option<bool>,

    #[serde(default)]
    pub headers: HeadersInput,
    #[serde(default)]
    pub attachments: Vec<AttachmentSpec>,

    pub tag: Option<String>,
    pub metadata: Option<serde_json::Value>,
    /// Carried through to the provider as given
    pub track_opens: Option<serde_json::Value>,
    /// Validated when the message is built
    pub track_links: Option<String>,
}

impl Mail {
    pub fn new() -> Self {
        Default::default()
    }

    /// Build a mail from its JSON form. Mail objects are sometimes wrapped
    /// as `{"data": {...}}`; the wrapper is removed.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let value = match value {
            serde_json::Value::Object(mut map) if map.get("data").map_or(false, |d| d.is_object()) => {
                map.remove("data").unwrap_or_default()
            }
            other => other,
        };

        serde_json::from_value(value).map_err(|e| Error::Validation(format!("Invalid mail: {}", e)))
    }

    pub fn with_from(mut self, from: impl Into<AddressInput>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_to(mut self, to: impl Into<AddressInput>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn with_cc(mut self, cc: impl Into<AddressInput>) -> Self {
        self.cc = Some(cc.into());
        self
    }

    pub fn with_bcc(mut self, bcc: impl Into<AddressInput>) -> Self {
        self.bcc = Some(bcc.into());
        self
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<AddressInput>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_template_id(mut self, id: impl Into<TemplateId>, model: serde_json::Value) -> Self {
        self.template_id = Some(id.into());
        self.template_model = Some(model);
        self
    }

    pub fn with_template_alias(mut self, alias: impl Into<String>, model: serde_json::Value) -> Self {
        self.template_alias = Some(alias.into());
        self.template_model = Some(model);
        self
    }

    /// Appends a header, keeping any existing ones with the same name
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        match self.headers {
            HeadersInput::List(ref mut entries) => entries.push(HeaderEntry::new(name, value)),
            HeadersInput::Map(ref mut map) => map.push((name.into(), HeaderValue::One(value.into()))),
        }
        self
    }

    pub fn with_attachment(mut self, attachment: AttachmentSpec) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_track_opens(mut self, track_opens: bool) -> Self {
        self.track_opens = Some(track_opens.into());
        self
    }

    pub fn with_track_links(mut self, track_links: impl Into<String>) -> Self {
        self.track_links = Some(track_links.into());
        self
    }
}
