use serde::Deserialize;

/// Body returned by the storage API, on success and on failure.
///
/// Every field is optional: some edge nodes answer with an empty body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageResponse {
    #[serde(rename = "HttpCode")]
    pub http_code: Option<u16>,

    #[serde(rename = "Message")]
    pub message: Option<String>,
}

impl StorageResponse {
    /// Parse `body`, treating anything unparseable as an empty response.
    pub fn parse_lenient(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// `false` only when the body itself reports a non-2xx code.
    pub fn reports_success(&self) -> bool {
        self.http_code.is_none_or(|code| (200..300).contains(&code))
    }

    /// `HttpCode: Message`, or whatever part of it is present.
    pub fn describe(&self) -> Option<String> {
        match (self.http_code, self.message.as_deref()) {
            (Some(code), Some(message)) => Some(format!("{code}: {message}")),
            (None, Some(message)) => Some(message.to_owned()),
            (Some(code), None) => Some(code.to_string()),
            (None, None) => None,
        }
    }
}
