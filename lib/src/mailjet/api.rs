use reqwest::StatusCode;

use crate::client::RawResult;
use crate::errors::TransportError;

pub const MAILJET_BASE_API: &str = "https://api.mailjet.com/";
pub const API_VERSION: &str = "v3.1";
pub const SEND_METHOD: &str = "send";

// Request timeout, in seconds
pub(crate) const MAILJET_REQUEST_TIMEOUT: u64 = 30;

/// `<base>/<version>/<method>`
pub fn build_endpoint_url(base: &str, version: &str, method: &str) -> Result<url::Url, TransportError> {
    let base = if base.ends_with('/') {
        url::Url::parse(base)?
    } else {
        url::Url::parse(&format!("{}/", base))?
    };

    Ok(base.join(&format!("{}/{}", version, method))?)
}

/// Map possible Mailjet API errors to a transport error.
///
/// A 400 whose body is a regular send response is not a request failure:
/// the provider uses it to report messages with invalid recipients, which
/// end up as rejections.
pub fn map_status(status: StatusCode, text: String) -> Result<RawResult, TransportError> {
    let raw = RawResult::new(status.as_u16(), text);

    if status.is_success() {
        return Ok(raw);
    }

    match status {
        StatusCode::BAD_REQUEST => match raw.json() {
            Ok(ref resp) if !resp.messages.is_empty() => Ok(raw),
            _ => Err(TransportError::BadRequest(raw.text)),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(TransportError::Unauthorized(raw.text)),
        StatusCode::TOO_MANY_REQUESTS => Err(TransportError::RateLimited(raw.text)),
        _ => Err(TransportError::Provider {
            status: raw.status,
            body: raw.text,
        }),
    }
}
