//! HTTP client for the conversion endpoint.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{ConversionKind, ConvertError, ConvertResult, ConvertedFile, MAX_UPLOAD_BYTES};

/// Upload payload of `POST {base}/convert`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConvertRequest<'a> {
    file_name: &'a str,
    file_data: String,
    #[serde(rename = "type")]
    kind: ConversionKind,
}

/// Error payload the service sends alongside 4xx/5xx statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// `attachment; filename="deck.pdf"` → `deck.pdf`
fn disposition_file_name(value: &str) -> Option<&str> {
    let raw = value[value.find("filename=")? + "filename=".len()..].trim();
    let raw = raw.split(';').next().unwrap_or(raw).trim();
    let name = raw.trim_matches('"');
    (!name.is_empty()).then_some(name)
}

/// Async client for the conversion service.
///
/// The service is idempotent per input, so a transport failure gets one
/// retry of the identical request; the last successful response wins.
/// Verdicts the service actually reached (4xx/5xx) are never retried.
pub struct ConvertClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ConvertClient {
    /// Default client-side deadline, mirroring the service's own
    /// conversion timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            timeout,
        }
    }

    /// Convert a document, returning the converted bytes and output name.
    ///
    /// The upload cap is checked before any bytes leave the process.
    pub async fn convert(
        &self,
        kind: ConversionKind,
        file_name: &str,
        data: &[u8],
    ) -> ConvertResult<ConvertedFile> {
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(ConvertError::InvalidInput(format!(
                "payload of {} bytes exceeds the {} MB cap",
                data.len(),
                MAX_UPLOAD_BYTES / (1024 * 1024)
            )));
        }
        let request = ConvertRequest {
            file_name,
            file_data: STANDARD.encode(data),
            kind,
        };

        match self.post(kind, file_name, &request).await {
            Err(e) if e.is_transient() => {
                warn!("conversion of {} failed ({}), retrying once", file_name, e);
                self.post(kind, file_name, &request).await
            }
            verdict => verdict,
        }
    }

    async fn post(
        &self,
        kind: ConversionKind,
        file_name: &str,
        request: &ConvertRequest<'_>,
    ) -> ConvertResult<ConvertedFile> {
        let response = self
            .http
            .post(format!("{}/convert", self.base_url))
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            let name = response
                .headers()
                .get(reqwest::header::CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok())
                .and_then(disposition_file_name)
                .map(str::to_string)
                .unwrap_or_else(|| kind.output_file_name(file_name));
            let data = response
                .bytes()
                .await
                .map_err(|e| self.transport_error(e))?;
            if data.is_empty() {
                return Err(ConvertError::InvalidResponse("empty body".to_string()));
            }
            debug!("converted {} -> {} ({} bytes)", file_name, name, data.len());
            return Ok(ConvertedFile {
                file_name: name,
                data,
            });
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("status {}", status),
        };
        if status.is_client_error() {
            Err(ConvertError::InvalidInput(message))
        } else {
            Err(ConvertError::Service(message))
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> ConvertError {
        if e.is_timeout() {
            ConvertError::Timeout(self.timeout.as_secs())
        } else {
            ConvertError::Network(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_parsing() {
        assert_eq!(
            disposition_file_name(r#"attachment; filename="deck.pdf""#),
            Some("deck.pdf")
        );
        assert_eq!(
            disposition_file_name("attachment; filename=deck.pdf; size=12"),
            Some("deck.pdf")
        );
        assert_eq!(disposition_file_name("attachment"), None);
        assert_eq!(disposition_file_name(r#"attachment; filename="""#), None);
    }

    #[tokio::test]
    async fn test_convert_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/convert")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "fileName": "deck.pptx",
                "fileData": STANDARD.encode(b"PPTXDATA"),
                "type": "pptx-to-pdf",
            })))
            .with_status(200)
            .with_header("content-type", "application/octet-stream")
            .with_header("content-disposition", r#"attachment; filename="deck.pdf""#)
            .with_body(b"%PDF-1.7 converted")
            .expect(1)
            .create_async()
            .await;

        let client = ConvertClient::new(server.url());
        let converted = client
            .convert(ConversionKind::PptxToPdf, "deck.pptx", b"PPTXDATA")
            .await
            .unwrap();

        assert_eq!(converted.file_name, "deck.pdf");
        assert_eq!(converted.data.as_ref(), b"%PDF-1.7 converted");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_disposition_derives_output_name() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/convert")
            .with_status(200)
            .with_body(b"DOCXDATA")
            .create_async()
            .await;

        let client = ConvertClient::new(server.url());
        let converted = client
            .convert(ConversionKind::PptxToWord, "Q3 deck.pptx", b"PPTXDATA")
            .await
            .unwrap();
        assert_eq!(converted.file_name, "Q3 deck.docx");
    }

    #[tokio::test]
    async fn test_server_error_maps_to_service_and_is_final() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/convert")
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"conversion failed"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = ConvertClient::new(server.url());
        let err = client
            .convert(ConversionKind::WordToPdf, "memo.docx", b"DOCX")
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertError::Service(ref m) if m == "conversion failed"));
        // service verdicts are not retried
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_maps_to_invalid_input() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/convert")
            .with_status(413)
            .with_body(r#"{"error":"payload too large"}"#)
            .create_async()
            .await;

        let client = ConvertClient::new(server.url());
        let err = client
            .convert(ConversionKind::PdfToPptx, "big.pdf", b"PDF")
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidInput(ref m) if m == "payload too large"));
    }

    #[tokio::test]
    async fn test_unparsable_error_body_reports_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/convert")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = ConvertClient::new(server.url());
        let err = client
            .convert(ConversionKind::PdfToWord, "a.pdf", b"PDF")
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Service(ref m) if m.contains("502")));
    }

    #[tokio::test]
    async fn test_oversized_payload_never_uploads() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/convert")
            .expect(0)
            .create_async()
            .await;

        let client = ConvertClient::new(server.url());
        let oversized = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let err = client
            .convert(ConversionKind::PptxToPdf, "huge.pptx", &oversized)
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertError::InvalidInput(ref m) if m.contains("200 MB")));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_timeout_retries_once_then_surfaces() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/convert")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_millis(1500));
                w.write_all(b"late")
            })
            .expect(2)
            .create_async()
            .await;

        let client = ConvertClient::with_timeout(server.url(), Duration::from_secs(1));
        let err = client
            .convert(ConversionKind::PptxToPdf, "slow.pptx", b"PPTX")
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertError::Timeout(1)));
        assert!(err.is_transient());
        mock.assert_async().await;
    }
}
