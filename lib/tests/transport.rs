use std::sync::{Arc, Mutex};

use serde_json::json;

use mailjet_transport::attachment::AttachmentSpec;
use mailjet_transport::client::ClientFuture;
use mailjet_transport::mailjet::types::SendRequest;
use mailjet_transport::response::{ErrorCode, MessageId};
use mailjet_transport::transport::{NAME, VERSION};
use mailjet_transport::{Client, DeliveryReport, Error, Mail, OneOrMany, RawResult, Transport, TransportError};

const ACCEPTED: &str = r#"{"Messages":[{"Status":"success","CustomID":"","To":[{"Email":"jane@example.org","MessageUUID":"1ab23cd4","MessageID":456,"MessageHref":"https://api.mailjet.com/v3/REST/message/456"}],"Cc":[],"Bcc":[]}]}"#;

/// Records every request and answers with a canned result
struct MockClient {
    requests: Mutex<Vec<(String, String, SendRequest)>>,
    result: Result<RawResult, TransportError>,
}

impl MockClient {
    fn new(result: Result<RawResult, TransportError>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            result,
        })
    }

    fn ok(text: &str) -> Arc<Self> {
        Self::new(Ok(RawResult::new(200, text)))
    }

    fn requests(&self) -> Vec<(String, String, SendRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Client for MockClient {
    fn post<'a>(
        &'a self,
        method: &'a str,
        version: &'a str,
        payload: &'a SendRequest,
    ) -> ClientFuture<'a, RawResult> {
        self.requests
            .lock()
            .unwrap()
            .push((method.to_string(), version.to_string(), payload.clone()));

        let result = self.result.clone();
        Box::pin(async move { result })
    }
}

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn mail() -> Mail {
    Mail::new()
        .with_from("\"No Reply\" <noreply@example.org>")
        .with_to("jane@example.org")
        .with_subject("Hello Jane")
        .with_text("Hello Jane")
        .with_header("X-Campaign", "welcome")
        .with_attachment(AttachmentSpec::from_content("hello.txt", "hello world").with_cid("hello"))
}

#[tokio::test]
async fn send_single_mail() {
    init();

    let client = MockClient::ok(ACCEPTED);
    let transport = Transport::with_client(client.clone(), true).unwrap();

    let sent = transport.send(&mail()).await.unwrap();

    let requests = client.requests();
    assert_eq!(requests.len(), 1);

    let (method, version, request) = &requests[0];
    assert_eq!(method, "send");
    assert_eq!(version, "v3.1");

    let body = serde_json::to_value(request).unwrap();
    assert_eq!(
        body,
        json!({
            "Messages": [{
                "From": { "Email": "noreply@example.org", "Name": "No Reply" },
                "To": "jane@example.org",
                "Subject": "Hello Jane",
                "TextPart": "Hello Jane",
                "Headers": { "X-Campaign": "welcome" },
                "Attachments": [{
                    "Filename": "hello.txt",
                    "ContentType": "text/plain",
                    "Base64Content": "aGVsbG8gd29ybGQ=",
                    "ContentID": "hello"
                }]
            }],
            "SandboxMode": true
        })
    );

    assert_eq!(sent.raw, RawResult::new(200, ACCEPTED));
    assert_eq!(sent.report.message_id, Some(MessageId::Numeric(456)));
    assert_eq!(sent.report.accepted.len(), 1);
    assert_eq!(sent.report.accepted[0].extra["Email"], "jane@example.org");
    assert!(sent.report.rejected.is_empty());
}

#[tokio::test]
#[allow(deprecated)]
async fn send_batch_keeps_order() {
    init();

    let client = MockClient::ok(ACCEPTED);
    let transport = Transport::with_client(client.clone(), false).unwrap();

    let mails = vec![
        Mail::new().with_to("first@example.org"),
        Mail::new().with_to("second@example.org"),
        Mail::new().with_to("third@example.org"),
    ];
    transport.send_batch(&mails).await.unwrap();

    let requests = client.requests();
    assert_eq!(requests.len(), 1);

    let request = &requests[0].2;
    assert!(!request.sandbox_mode);

    let to: Vec<_> = request
        .messages
        .iter()
        .map(|m| m.to.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(to, vec!["first@example.org", "second@example.org", "third@example.org"]);
}

#[tokio::test]
async fn invalid_mail_sends_nothing() {
    init();

    let client = MockClient::ok(ACCEPTED);
    let transport = Transport::with_client(client.clone(), false).unwrap();

    let err = transport
        .send(&mail().with_track_links("Everywhere"))
        .await
        .unwrap_err();
    assert!(match err {
        Error::Validation(_) => true,
        _ => false,
    });

    let err = transport
        .send(&mail().with_attachment(AttachmentSpec::from_path("/no/such/report.pdf")))
        .await
        .unwrap_err();
    assert!(match err {
        Error::Attachment { .. } => true,
        _ => false,
    });

    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn client_error_is_passed_through() {
    init();

    let client = MockClient::new(Err(TransportError::RateLimited("slow down".to_string())));
    let transport = Transport::with_client(client.clone(), false).unwrap();

    let err = transport.send(&mail()).await.unwrap_err();

    assert!(match err {
        Error::Transport(TransportError::RateLimited(ref body)) => body == "slow down",
        _ => false,
    });
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn per_message_errors_are_rejections() {
    init();

    let body = json!({
        "Messages": [{
            "Status": "error",
            "Errors": [{
                "ErrorIdentifier": "88b5ca9f-5f1f-42e7-a45e-9ecbad0c285e",
                "ErrorCode": "send-0003",
                "StatusCode": 400,
                "ErrorMessage": "At least \"HTMLPart\", \"TextPart\" or \"TemplateID\" must be provided.",
                "ErrorRelatedTo": ["HTMLPart", "TextPart"]
            }]
        }]
    })
    .to_string();
    let client = MockClient::new(Ok(RawResult::new(400, body.clone())));
    let transport = Transport::with_client(client, false).unwrap();

    let sent = transport.send(&Mail::new().with_to("jane@example.org")).await.unwrap();

    assert_eq!(sent.raw.text, body);
    assert!(sent.report.accepted.is_empty());
    assert_eq!(sent.report.rejected.len(), 1);
    assert_eq!(
        sent.report.rejected[0].error_code,
        Some(ErrorCode::Text("send-0003".to_string()))
    );
    assert_eq!(sent.report.message_id, None);
}

#[tokio::test]
async fn undecodable_success_body_keeps_raw_result() {
    init();

    for text in &["", "<html>gateway</html>"] {
        let client = MockClient::ok(text);
        let transport = Transport::with_client(client.clone(), false).unwrap();

        let sent = transport.send(&mail()).await.unwrap();

        assert_eq!(sent.raw, RawResult::new(200, *text));
        assert_eq!(sent.report, DeliveryReport::default());
        assert_eq!(client.requests().len(), 1);
    }
}

#[tokio::test]
async fn parse_wrapped_mail() {
    init();

    let mail = Mail::from_value(json!({
        "data": {
            "from": { "name": "No Reply", "address": "noreply@example.org" },
            "to": ["jane@example.org", "\"John Doe\" <john@example.org>"],
            "subject": "Hello",
            "templateId": 1234,
            "templateModel": { "name": "Jane" },
            "headers": { "X-Campaign": ["welcome", "spring"] },
            "trackOpens": true,
            "trackLinks": "HtmlOnly"
        }
    }))
    .unwrap();

    let transport = Transport::with_client(MockClient::ok(ACCEPTED), false).unwrap();
    let parsed = transport.parse(&OneOrMany::One(mail)).await.unwrap();
    assert!(parsed.is_one());

    let value = serde_json::to_value(&parsed.as_slice()[0]).unwrap();
    assert_eq!(
        value,
        json!({
            "From": { "Email": "noreply@example.org", "Name": "No Reply" },
            "To": "jane@example.org,\"John Doe\" <john@example.org>",
            "TemplateId": 1234,
            "TemplateModel": { "name": "Jane" },
            "Headers": { "X-Campaign": "welcome, spring" },
            "TrackOpens": true,
            "TrackLinks": "HtmlOnly"
        })
    );
}

#[test]
fn name_and_version() {
    let transport = Transport::with_client(MockClient::ok(ACCEPTED), false).unwrap();

    assert_eq!(NAME, "Mailjet");
    assert_eq!(transport.name(), "Mailjet");
    assert_eq!(transport.version(), VERSION);
    assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
}
