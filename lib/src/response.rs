use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::mailjet::types::{MessageResult, SendResponse};
use crate::OneOrMany;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Numeric(i64),
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Numeric(u64),
    Text(String),
}

/// Delivery result for one recipient (or one failed message).
/// Fields other than the error code and message id are kept as received.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    #[serde(rename = "ErrorCode", default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(rename = "MessageID", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProviderResult {
    /// Zero is the provider's success code; anything else, including a
    /// missing code, is a rejection
    pub fn is_accepted(&self) -> bool {
        self.error_code == Some(ErrorCode::Numeric(0))
    }
}

/// Uniform outcome of a send call
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DeliveryReport {
    pub message_id: Option<MessageId>,
    pub accepted: Vec<ProviderResult>,
    pub rejected: Vec<ProviderResult>,
}

/// Split results into accepted and rejected. The report's message id is
/// taken from the first result.
pub fn normalize(results: OneOrMany<ProviderResult>) -> DeliveryReport {
    let results = results.into_vec();
    let message_id = results.first().and_then(|r| r.message_id.clone());

    let (accepted, rejected): (Vec<_>, Vec<_>) =
        results.into_iter().partition(ProviderResult::is_accepted);

    for result in &rejected {
        log::warn!("Delivery rejected: {:?}", result);
    }

    DeliveryReport {
        message_id,
        accepted,
        rejected,
    }
}

/// Flatten a send response into per-recipient results and normalize them
pub fn normalize_response(resp: &SendResponse) -> DeliveryReport {
    normalize(OneOrMany::Many(flatten(resp)))
}

/// Every recipient of a successful message becomes an accepted result.
/// Every error of a failed message becomes a rejected result.
pub fn flatten(resp: &SendResponse) -> Vec<ProviderResult> {
    resp.messages.iter().flat_map(message_results).collect()
}

fn message_results(message: &MessageResult) -> Vec<ProviderResult> {
    if message.is_success() {
        return message
            .to
            .iter()
            .chain(message.cc.iter())
            .chain(message.bcc.iter())
            .filter_map(|recipient| {
                let mut fields = recipient.clone();
                fields.insert("ErrorCode".to_string(), Value::from(0));
                from_fields(fields)
            })
            .collect();
    }

    if message.errors.is_empty() {
        return vec![ProviderResult {
            error_code: Some(ErrorCode::Text(message.status.clone())),
            ..Default::default()
        }];
    }

    message
        .errors
        .iter()
        .filter_map(|error| from_fields(error.clone()))
        .collect()
}

fn from_fields(fields: Map<String, Value>) -> Option<ProviderResult> {
    match serde_json::from_value(Value::Object(fields)) {
        Ok(result) => Some(result),
        Err(e) => {
            log::warn!("Skipping malformed delivery result: {}", e);
            None
        }
    }
}
