use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::CloudflareImagesError;

/// The standard Cloudflare v4 API response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudflareEnvelope<T> {
    /// Whether the call succeeded.
    #[serde(default)]
    pub success: bool,

    /// Errors reported by the API (present on failure).
    #[serde(default)]
    pub errors: Vec<ApiMessage>,

    /// The call's payload.
    pub result: Option<T>,
}

/// An entry of the envelope's `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl<T> CloudflareEnvelope<T> {
    /// Render the `errors` array as `code: message` pairs.
    pub fn error_summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| format!("{}: {}", e.code, e.message))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// `result` of an Images upload.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageResult {
    /// Image identifier.
    pub id: Option<String>,

    /// Original file name as stored by Cloudflare.
    pub filename: Option<String>,

    /// Full delivery URLs for every configured variant.
    #[serde(default)]
    pub variants: Vec<String>,
}

/// Decode a Cloudflare v4 response body into its `result`.
///
/// Non-2xx statuses and envelopes with `success: false` become
/// [`CloudflareImagesError::Api`]; an unparseable 2xx body or a missing
/// `result` becomes [`CloudflareImagesError::InvalidResponse`].
pub fn decode_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<T, CloudflareImagesError> {
    let envelope: CloudflareEnvelope<T> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(CloudflareImagesError::Api(format!("HTTP {status}: {body}")));
        }
        Err(e) => {
            return Err(CloudflareImagesError::InvalidResponse(format!(
                "malformed JSON: {e}"
            )));
        }
    };

    if !status.is_success() || !envelope.success {
        let summary = envelope
            .error_summary()
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Err(CloudflareImagesError::Api(summary));
    }

    envelope
        .result
        .ok_or_else(|| CloudflareImagesError::InvalidResponse("response has no result".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_envelope_returns_result() {
        let body = r#"{"success":true,"errors":[],"result":{"id":"abc","variants":[]}}"#;
        let result: ImageResult = decode_envelope(StatusCode::OK, body).unwrap();
        assert_eq!(result.id.as_deref(), Some("abc"));
    }

    #[test]
    fn decode_envelope_reports_api_errors() {
        let body = r#"{
            "success":false,
            "errors":[{"code":10000,"message":"Authentication error"}],
            "result":null
        }"#;
        let err = decode_envelope::<ImageResult>(StatusCode::FORBIDDEN, body).unwrap_err();
        assert!(
            matches!(err, CloudflareImagesError::Api(ref m) if m == "10000: Authentication error")
        );
    }

    #[test]
    fn decode_envelope_non_json_error_page() {
        let err =
            decode_envelope::<ImageResult>(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>")
                .unwrap_err();
        assert!(matches!(err, CloudflareImagesError::Api(ref m) if m.starts_with("HTTP 502")));
    }

    #[test]
    fn decode_envelope_malformed_success_body() {
        let err = decode_envelope::<ImageResult>(StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, CloudflareImagesError::InvalidResponse(_)));
    }

    #[test]
    fn decode_envelope_missing_result() {
        let err =
            decode_envelope::<ImageResult>(StatusCode::OK, r#"{"success":true,"result":null}"#)
                .unwrap_err();
        assert!(matches!(err, CloudflareImagesError::InvalidResponse(_)));
    }

    #[test]
    fn envelope_deserializes_success() {
        let json = r#"{
            "success": true,
            "errors": [],
            "messages": [],
            "result": {
                "id": "2cdc28f0-017a-49c4-9ed7-87056c83901",
                "filename": "image.png",
                "variants": ["https://imagedelivery.net/acc/2cdc28f0/public"]
            }
        }"#;
        let env: CloudflareEnvelope<ImageResult> = serde_json::from_str(json).unwrap();
        assert!(env.success);
        let result = env.result.unwrap();
        assert_eq!(
            result.id.as_deref(),
            Some("2cdc28f0-017a-49c4-9ed7-87056c83901")
        );
        assert_eq!(result.variants.len(), 1);
    }

    #[test]
    fn envelope_deserializes_error() {
        let json =
            r#"{"success":false,"errors":[{"code":5400,"message":"Bad request"}],"result":null}"#;
        let env: CloudflareEnvelope<ImageResult> = serde_json::from_str(json).unwrap();
        assert!(!env.success);
        assert!(env.result.is_none());
        assert_eq!(env.error_summary().as_deref(), Some("5400: Bad request"));
    }

    #[test]
    fn error_summary_empty_when_no_errors() {
        let env: CloudflareEnvelope<ImageResult> =
            serde_json::from_str(r#"{"success":true,"result":null}"#).unwrap();
        assert!(env.error_summary().is_none());
    }
}
