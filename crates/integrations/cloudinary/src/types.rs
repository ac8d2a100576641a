use serde::Deserialize;

/// Body of an upload response. On failure only `error` is set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UploadResponse {
    pub secure_url: Option<String>,
    pub public_id: Option<String>,
    pub version: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<String>,
    pub resource_type: Option<String>,
    pub bytes: Option<u64>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

/// Body of a destroy response: `{"result": "ok"}` or `{"result": "not found"}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DestroyResponse {
    pub result: Option<String>,
    pub error: Option<ApiErrorBody>,
}
