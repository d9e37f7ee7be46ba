use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::address::Address;
use crate::headers::HeaderEntry;

/// `{"Email": ..., "Name": ...}` as used by the From and ReplyTo fields
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
}

impl From<&Address> for Recipient {
    fn from(addr: &Address) -> Self {
        Self {
            email: addr.email.clone(),
            name: addr.name.clone(),
        }
    }
}

/// Single encoded attachment, ready to be embedded in a message
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Attachment {
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "ContentType")]
    pub content_type: String,
    #[serde(rename = "Base64Content")]
    pub base64_content: String,
    /// Empty when the attachment was not given a cid
    #[serde(rename = "ContentID")]
    pub content_id: String,
}

/// Message headers, kept in insertion order.
///
/// Serializes as a JSON object of string values. A name that occurs more
/// than once maps to all of its values joined with `", "`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Headers(pub Vec<HeaderEntry>);

impl Headers {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All values for `name`, in order
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |h| h.name == name)
            .map(|h| h.value.as_str())
    }

    fn grouped(&self) -> Vec<(&str, Vec<&str>)> {
        let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();

        for entry in &self.0 {
            match groups.iter_mut().find(|(name, _)| *name == entry.name) {
                Some((_, values)) => values.push(entry.value.as_str()),
                None => groups.push((entry.name.as_str(), vec![entry.value.as_str()])),
            }
        }

        groups
    }
}

impl Serialize for Headers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let groups = self.grouped();
        let mut map = serializer.serialize_map(Some(groups.len()))?;

        for (name, values) in groups {
            map.serialize_entry(name, &values.join(", "))?;
        }

        map.end()
    }
}

/// Link tracking modes accepted by the provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackLinks {
    None,
    HtmlAndText,
    HtmlOnly,
    TextOnly,
}

impl TrackLinks {
    pub const ALL: [TrackLinks; 4] = [
        TrackLinks::None,
        TrackLinks::HtmlAndText,
        TrackLinks::HtmlOnly,
        TrackLinks::TextOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::None => "None",
            Self::HtmlAndText => "HtmlAndText",
            Self::HtmlOnly => "HtmlOnly",
            Self::TextOnly => "TextOnly",
        }
    }
}

impl fmt::Display for TrackLinks {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackLinks {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
                crate::Error::Validation(format!(
                    "\"{}\" is wrong value for link tracking. Valid values are: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

/// Stored template reference. The provider accepts numeric ids, callers
/// sometimes pass them as strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateId {
    Numeric(u64),
    Named(String),
}

impl From<u64> for TemplateId {
    fn from(id: u64) -> Self {
        TemplateId::Numeric(id)
    }
}

impl From<&str> for TemplateId {
    fn from(id: &str) -> Self {
        TemplateId::Named(id.to_string())
    }
}

/// One message in the provider's send schema.
///
/// Either the literal content fields (Subject, HtmlPart, TextPart) or the
/// template fields are set, never both.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Message {
    #[serde(rename = "From", skip_serializing_if = "Option::is_none")]
    pub from: Option<Recipient>,
    #[serde(rename = "To", skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(rename = "Cc", skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
    #[serde(rename = "Bcc", skip_serializing_if = "Option::is_none")]
    pub bcc: Option<String>,
    #[serde(rename = "ReplyTo", skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Recipient>,

    #[serde(rename = "Subject", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(rename = "HtmlPart", skip_serializing_if = "Option::is_none")]
    pub html_part: Option<String>,
    #[serde(rename = "TextPart", skip_serializing_if = "Option::is_none")]
    pub text_part: Option<String>,

    #[serde(rename = "TemplateId", skip_serializing_if = "Option::is_none")]
    pub template_id: Option<TemplateId>,
    #[serde(rename = "TemplateAlias", skip_serializing_if = "Option::is_none")]
    pub template_alias: Option<String>,
    #[serde(rename = "TemplateModel", skip_serializing_if = "Option::is_none")]
    pub template_model: Option<serde_json::Value>,
    #[serde(rename = "InlineCss", skip_serializing_if = "Option::is_none")]
    pub inline_css: Option<bool>,

    #[serde(rename = "Headers", skip_serializing_if = "Headers::is_empty")]
    pub headers: Headers,
    #[serde(rename = "Attachments", skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,

    #[serde(rename = "Tag", skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(rename = "Metadata", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(rename = "TrackOpens", skip_serializing_if = "Option::is_none")]
    pub track_opens: Option<serde_json::Value>,
    #[serde(rename = "TrackLinks", skip_serializing_if = "Option::is_none")]
    pub track_links: Option<TrackLinks>,
}

/// Request body of the send endpoint
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SendRequest {
    #[serde(rename = "Messages")]
    pub messages: Vec<Message>,
    #[serde(rename = "SandboxMode")]
    pub sandbox_mode: bool,
}

/// Response body of the send endpoint.
///
/// Returned with status 200 when every message was accepted, and with status
/// 400 when at least one message carries `Errors`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SendResponse {
    #[serde(rename = "Messages", default)]
    pub messages: Vec<MessageResult>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MessageResult {
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "CustomID", default)]
    pub custom_id: Option<String>,
    #[serde(rename = "To", default)]
    pub to: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(rename = "Cc", default)]
    pub cc: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(rename = "Bcc", default)]
    pub bcc: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(rename = "Errors", default)]
    pub errors: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl MessageResult {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}
