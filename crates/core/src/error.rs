use serde::{Deserialize, Serialize};

/// The closed taxonomy every upload-pipeline failure is mapped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Missing or invalid credentials, detected before any I/O.
    Config,
    /// The backend answered with a failure.
    Upload,
    /// Inserting the reference into the document failed.
    Editor,
    /// Transport failure, no usable response.
    Network,
    /// Anything else.
    Unexpected,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Upload => "upload",
            Self::Editor => "editor",
            Self::Network => "network",
            Self::Unexpected => "unexpected",
        }
    }

    /// Actionable hint appended to user-facing messages, if any.
    pub fn hint(self) -> Option<&'static str> {
        match self {
            Self::Config => Some("Check your provider settings."),
            Self::Network => Some("Check your network connection."),
            Self::Upload | Self::Editor | Self::Unexpected => None,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure, ready for logging and user notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredError {
    /// Taxonomy bucket.
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Rendering of the underlying error, when there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_error: Option<String>,
    /// Extra structured details (file name, provider, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Map<String, serde_json::Value>>,
}

impl StructuredError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            original_error: None,
            context: None,
        }
    }

    #[must_use]
    pub fn with_original(mut self, original: impl Into<String>) -> Self {
        self.original_error = Some(original.into());
        self
    }

    /// Attach a context entry, replacing any previous value for `key`.
    #[must_use]
    pub fn with_context(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.context
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// The message shown to the user: the base message plus the kind's hint.
    pub fn user_message(&self) -> String {
        match self.kind.hint() {
            Some(hint) => format!("{} {hint}", self.message),
            None => self.message.clone(),
        }
    }

    /// Only unexpected errors are eligible for external reporting.
    pub fn is_reportable(&self) -> bool {
        self.kind == ErrorKind::Unexpected
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

impl std::error::Error for StructuredError {}
