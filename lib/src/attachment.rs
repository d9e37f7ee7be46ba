//! Attachment resolution and encoding.
//!
//! An attachment is given either as inline content or as a path. A path may
//! be a `data:` URI, a `file://` or `http(s)://` URL, or a plain filesystem
//! path. Whatever the source, the bytes end up base64 encoded in the message.
use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use futures::future::try_join_all;
use percent_encoding::percent_decode_str;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::errors::{Error, Result};
use crate::mailjet::types::Attachment;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// Timeout for fetching remote attachments, in seconds
const FETCH_TIMEOUT: u64 = 30;

/// Inline attachment content
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Bytes(Vec<u8>),
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Content {
    fn from(b: Vec<u8>) -> Self {
        Content::Bytes(b)
    }
}

/// Attachment as described by the caller
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentSpec {
    pub filename: Option<String>,
    pub content: Option<Content>,
    /// Filesystem path, `file://`/`http(s)://` URL or `data:` URI
    pub path: Option<String>,
    pub cid: Option<String>,
    /// Overrides the inferred content type
    pub content_type: Option<String>,
    /// How text `content` is encoded. Only `base64` is decoded, anything
    /// else is taken as UTF-8 text.
    pub encoding: Option<String>,
}

impl AttachmentSpec {
    pub fn from_content(filename: impl Into<String>, content: impl Into<Content>) -> Self {
        Self {
            filename: Some(filename.into()),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn with_cid(mut self, cid: impl Into<String>) -> Self {
        self.cid = Some(cid.into());
        self
    }
}

/// Attachment bytes along with whatever the source told us about them
#[derive(Debug)]
struct Resolved {
    data: Bytes,
    content_type: Option<String>,
    filename: Option<String>,
}

impl Resolved {
    fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            content_type: None,
            filename: None,
        }
    }
}

fn attachment_error(origin: &str, reason: impl ToString) -> Error {
    Error::Attachment {
        origin: origin.to_string(),
        reason: reason.to_string(),
    }
}

/// Resolves attachment sources and encodes them
#[derive(Clone, Debug)]
pub struct AttachmentEncoder {
    http: reqwest::Client,
}

impl AttachmentEncoder {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self { http })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Encode all attachments of a single mail, in input order.
    ///
    /// Sources are resolved concurrently. The first failure aborts the whole
    /// list.
    pub async fn encode_all(&self, specs: &[AttachmentSpec]) -> Result<Vec<Attachment>> {
        let resolved = try_join_all(specs.iter().map(|spec| self.resolve(spec))).await?;

        let mut unnamed = 0;
        let attachments = specs
            .iter()
            .zip(resolved)
            .map(|(spec, resolved)| {
                let content_type = spec
                    .content_type
                    .clone()
                    .or(resolved.content_type)
                    .or_else(|| {
                        spec.filename
                            .as_deref()
                            .or(resolved.filename.as_deref())
                            .and_then(|name| mime_guess::from_path(name).first_raw())
                            .map(String::from)
                    })
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

                let filename = match spec.filename.clone().or(resolved.filename) {
                    Some(name) => name,
                    None => {
                        unnamed += 1;
                        format!("attachment-{}.{}", unnamed, extension_for(&content_type))
                    }
                };

                log::debug!(
                    "Encoded attachment {} ({}, {} bytes)",
                    filename,
                    content_type,
                    resolved.data.len()
                );

                Attachment {
                    filename,
                    content_type,
                    base64_content: STANDARD.encode(&resolved.data),
                    content_id: spec.cid.clone().unwrap_or_default(),
                }
            })
            .collect();

        Ok(attachments)
    }

    async fn resolve(&self, spec: &AttachmentSpec) -> Result<Resolved> {
        if let Some(ref content) = spec.content {
            return decode_content(content, spec.encoding.as_deref()).map(Resolved::new);
        }

        let path = match spec.path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => path,
            _ => return Err(attachment_error("attachment", "neither content nor path given")),
        };

        if is_scheme(path, "data:") {
            return parse_data_uri(path);
        }

        if is_scheme(path, "http://") || is_scheme(path, "https://") {
            return self.fetch(path).await;
        }

        let file_path = if is_scheme(path, "file://") {
            url::Url::parse(path)
                .map_err(|e| attachment_error(path, e))?
                .to_file_path()
                .map_err(|_| attachment_error(path, "not a local file URL"))?
        } else {
            Path::new(path).to_path_buf()
        };

        let data = tokio::fs::read(&file_path)
            .await
            .map_err(|e| attachment_error(path, e))?;

        let mut resolved = Resolved::new(data);
        resolved.filename = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        Ok(resolved)
    }

    async fn fetch(&self, url: &str) -> Result<Resolved> {
        let parsed = url::Url::parse(url).map_err(|e| attachment_error(url, e))?;

        log::debug!("Fetching attachment from {}", parsed);

        let resp = self
            .http
            .get(parsed.clone())
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| attachment_error(url, e))?;

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty());

        let data = resp.bytes().await.map_err(|e| attachment_error(url, e))?;

        let mut resolved = Resolved::new(data);
        resolved.content_type = content_type;
        resolved.filename = parsed
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|name| !name.is_empty())
            .map(|name| percent_decode_str(name).decode_utf8_lossy().into_owned());

        Ok(resolved)
    }
}

fn is_scheme(path: &str, scheme: &str) -> bool {
    path.get(..scheme.len())
        .map(|prefix| prefix.eq_ignore_ascii_case(scheme))
        .unwrap_or(false)
}

fn decode_content(content: &Content, encoding: Option<&str>) -> Result<Bytes> {
    match *content {
        Content::Bytes(ref bytes) => Ok(Bytes::from(bytes.clone())),
        Content::Text(ref text) => match encoding {
            Some(enc) if enc.eq_ignore_ascii_case("base64") => {
                let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                STANDARD
                    .decode(compact)
                    .map(Bytes::from)
                    .map_err(|e| attachment_error("inline content", e))
            }
            _ => Ok(Bytes::from(text.clone())),
        },
    }
}

/// `data:[<mediatype>][;base64],<data>`
fn parse_data_uri(uri: &str) -> Result<Resolved> {
    let origin = "data URI";
    let rest = &uri["data:".len()..];

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| attachment_error(origin, "missing ',' separator"))?;

    let mut params = header.split(';').map(str::trim);
    let media_type = params.next().unwrap_or("").to_lowercase();
    let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

    let data = if is_base64 {
        let compact: String = percent_decode_str(payload)
            .decode_utf8_lossy()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        STANDARD
            .decode(compact)
            .map_err(|e| attachment_error(origin, e))?
    } else {
        percent_decode_str(payload).collect()
    };

    let mut resolved = Resolved::new(data);
    resolved.content_type = Some(if media_type.is_empty() {
        "text/plain".to_string()
    } else {
        media_type
    });

    Ok(resolved)
}

/// File extension used for generated attachment names
fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "text/plain" => "txt",
        "text/html" => "html",
        "text/csv" => "csv",
        "image/jpeg" => "jpg",
        "application/json" => "json",
        DEFAULT_CONTENT_TYPE => "bin",
        _ => mime_guess::get_mime_extensions_str(content_type)
            .and_then(|exts| exts.first())
            .copied()
            .unwrap_or("bin"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response on a local port
    async fn serve_once(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn encode_inline_content() {
        let encoder = AttachmentEncoder::new().unwrap();
        let specs = vec![AttachmentSpec::from_content("text.txt", "Lorem ipsum..")];

        let attachments = encoder.encode_all(&specs).await.unwrap();

        assert_eq!(
            attachments,
            vec![Attachment {
                filename: "text.txt".to_string(),
                content_type: "text/plain".to_string(),
                base64_content: "TG9yZW0gaXBzdW0uLg==".to_string(),
                content_id: "".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn encode_data_uris_with_generated_names() {
        let encoder = AttachmentEncoder::new().unwrap();
        let specs = vec![
            AttachmentSpec::from_content("text.txt", "Lorem ipsum.."),
            AttachmentSpec::from_path("data:text/plain;base64,aGVsbG8gd29ybGQ="),
            AttachmentSpec::from_path("data:text/plain;base64,Zm9vIGJheiBiYXI=").with_cid("cid:text-01.txt"),
        ];

        let attachments = encoder.encode_all(&specs).await.unwrap();

        let names: Vec<&str> = attachments.iter().map(|a| a.filename.as_str()).collect();
        let contents: Vec<&str> = attachments.iter().map(|a| a.base64_content.as_str()).collect();
        let cids: Vec<&str> = attachments.iter().map(|a| a.content_id.as_str()).collect();

        assert_eq!(names, vec!["text.txt", "attachment-1.txt", "attachment-2.txt"]);
        assert_eq!(
            contents,
            vec!["TG9yZW0gaXBzdW0uLg==", "aGVsbG8gd29ybGQ=", "Zm9vIGJheiBiYXI="]
        );
        assert_eq!(cids, vec!["", "", "cid:text-01.txt"]);
        assert!(attachments.iter().all(|a| a.content_type == "text/plain"));
    }

    #[tokio::test]
    async fn encode_percent_encoded_data_uri() {
        let encoder = AttachmentEncoder::new().unwrap();
        let specs = vec![AttachmentSpec::from_path("data:,Hello%2C%20World%21")];

        let attachments = encoder.encode_all(&specs).await.unwrap();

        assert_eq!(attachments[0].base64_content, "SGVsbG8sIFdvcmxkIQ==");
        assert_eq!(attachments[0].content_type, "text/plain");
    }

    #[tokio::test]
    async fn encode_base64_text_content() {
        let encoder = AttachmentEncoder::new().unwrap();
        let mut spec = AttachmentSpec::from_content("hello.bin", "aGVs\nbG8=");
        spec.encoding = Some("base64".to_string());
        spec.content_type = Some("application/x-custom".to_string());

        let attachments = encoder.encode_all(&[spec]).await.unwrap();

        assert_eq!(attachments[0].base64_content, "aGVsbG8=");
        assert_eq!(attachments[0].content_type, "application/x-custom");
    }

    #[tokio::test]
    async fn encode_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"a,b\n1,2\n").unwrap();

        let encoder = AttachmentEncoder::new().unwrap();
        let specs = vec![AttachmentSpec::from_path(path.to_string_lossy().into_owned())];

        let attachments = encoder.encode_all(&specs).await.unwrap();

        assert_eq!(attachments[0].filename, "report.csv");
        assert_eq!(attachments[0].content_type, "text/csv");
        assert_eq!(attachments[0].base64_content, STANDARD.encode(b"a,b\n1,2\n"));
    }

    #[tokio::test]
    async fn encode_file_url_keeps_explicit_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "notes").unwrap();
        let url = url::Url::from_file_path(&path).unwrap();

        let encoder = AttachmentEncoder::new().unwrap();
        let mut spec = AttachmentSpec::from_path(url.to_string());
        spec.filename = Some("renamed.txt".to_string());

        let attachments = encoder.encode_all(&[spec]).await.unwrap();

        assert_eq!(attachments[0].filename, "renamed.txt");
        assert_eq!(attachments[0].base64_content, "bm90ZXM=");
    }

    #[tokio::test]
    async fn explicit_name_drives_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload-1234");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let encoder = AttachmentEncoder::new().unwrap();
        let mut spec = AttachmentSpec::from_path(path.to_string_lossy().into_owned());
        spec.filename = Some("report.pdf".to_string());

        let attachments = encoder.encode_all(&[spec]).await.unwrap();

        assert_eq!(attachments[0].filename, "report.pdf");
        assert_eq!(attachments[0].content_type, "application/pdf");
    }

    #[tokio::test]
    async fn encoder_construction_reports_errors() {
        // Client setup failures surface as a config error, never a panic
        assert!(match AttachmentEncoder::new() {
            Ok(_) | Err(Error::Config(_)) => true,
            Err(_) => false,
        });
    }

    #[tokio::test]
    async fn missing_file_fails() {
        let encoder = AttachmentEncoder::new().unwrap();
        let specs = vec![
            AttachmentSpec::from_content("text.txt", "ok"),
            AttachmentSpec::from_path("/definitely/not/here.pdf"),
        ];

        let err = encoder.encode_all(&specs).await.unwrap_err();

        assert!(match err {
            Error::Attachment { ref origin, .. } => origin == "/definitely/not/here.pdf",
            _ => false,
        });
    }

    #[tokio::test]
    async fn invalid_data_uri_fails() {
        let encoder = AttachmentEncoder::new().unwrap();

        let no_comma = encoder
            .encode_all(&[AttachmentSpec::from_path("data:text/plain;base64")])
            .await;
        let bad_base64 = encoder
            .encode_all(&[AttachmentSpec::from_path("data:text/plain;base64,!!!")])
            .await;

        assert!(no_comma.is_err());
        assert!(bad_base64.is_err());
    }

    #[tokio::test]
    async fn empty_spec_fails() {
        let encoder = AttachmentEncoder::new().unwrap();
        assert!(encoder.encode_all(&[AttachmentSpec::default()]).await.is_err());
    }

    #[tokio::test]
    async fn encode_remote_url() {
        let base = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 4\r\nConnection: close\r\n\r\nPNG!",
        )
        .await;

        let encoder = AttachmentEncoder::new().unwrap();
        let specs = vec![AttachmentSpec::from_path(format!("{}/assets/logo.png", base))];

        let attachments = encoder.encode_all(&specs).await.unwrap();

        assert_eq!(attachments[0].filename, "logo.png");
        assert_eq!(attachments[0].content_type, "image/png");
        assert_eq!(attachments[0].base64_content, STANDARD.encode(b"PNG!"));
    }

    #[tokio::test]
    async fn remote_url_error_status_fails() {
        let base = serve_once(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let encoder = AttachmentEncoder::new().unwrap();
        let result = encoder
            .encode_all(&[AttachmentSpec::from_path(format!("{}/gone.pdf", base))])
            .await;

        assert!(result.is_err());
    }

    #[test]
    fn extensions_for_generated_names() {
        assert_eq!(extension_for("text/plain"), "txt");
        assert_eq!(extension_for(DEFAULT_CONTENT_TYPE), "bin");
        assert_eq!(extension_for("x-unknown/x-unknown"), "bin");
    }
}
