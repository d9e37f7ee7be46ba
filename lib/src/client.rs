use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::TransportError;
use crate::mailjet::types::{SendRequest, SendResponse};

// Definition of future types for async use
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Provider response, untouched
#[derive(Clone, Debug, PartialEq)]
pub struct RawResult {
    pub status: u16,
    pub text: String,
}

impl RawResult {
    pub fn new(status: u16, text: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
        }
    }

    /// Decode the response text as a send response
    pub fn json(&self) -> Result<SendResponse, TransportError> {
        serde_json::from_str(&self.text).map_err(|e| e.into())
    }
}

/// HTTP collaborator used by the transport.
///
/// Implementations issue one request per call and hand back the response
/// as-is. Retries and timeouts are up to the implementation.
pub trait Client: Send + Sync {
    fn post<'a>(
        &'a self,
        method: &'a str,
        version: &'a str,
        payload: &'a SendRequest,
    ) -> ClientFuture<'a, RawResult>;
}

impl<C: Client + ?Sized> Client for Arc<C> {
    fn post<'a>(
        &'a self,
        method: &'a str,
        version: &'a str,
        payload: &'a SendRequest,
    ) -> ClientFuture<'a, RawResult> {
        (**self).post(method, version, payload)
    }
}

impl<C: Client + ?Sized> Client for Box<C> {
    fn post<'a>(
        &'a self,
        method: &'a str,
        version: &'a str,
        payload: &'a SendRequest,
    ) -> ClientFuture<'a, RawResult> {
        (**self).post(method, version, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_result_json() {
        let raw = RawResult::new(200, r#"{"Messages":[{"Status":"success","To":[]}]}"#);
        let resp = raw.json().unwrap();

        assert_eq!(resp.messages.len(), 1);
        assert!(resp.messages[0].is_success());
    }

    #[test]
    fn raw_result_bad_json() {
        let raw = RawResult::new(200, "<html>oops</html>");

        assert!(match raw.json() {
            Err(TransportError::Decode(_)) => true,
            _ => false,
        });
    }
}
