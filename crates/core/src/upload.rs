use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::media::{MediaFile, MediaKind};

/// Optional destination hints attached to an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadOptions {
    /// Explicit destination path / public id. Overrides generated names.
    pub path: Option<String>,
    /// Target folder inside the provider.
    pub folder: Option<String>,
    /// Named transformation or delivery variant.
    pub transformation: Option<String>,
    /// Tags to attach to the asset, where the provider supports them.
    pub tags: Vec<String>,
    /// Key/value metadata to attach to the asset.
    pub metadata: BTreeMap<String, String>,
    /// Vault path of the document the file was pasted into. Drives routing.
    pub source_path: Option<String>,
}

impl UploadOptions {
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    #[must_use]
    pub fn with_transformation(mut self, transformation: impl Into<String>) -> Self {
        self.transformation = Some(transformation.into());
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_source_path(mut self, source_path: impl Into<String>) -> Self {
        self.source_path = Some(source_path.into());
        self
    }
}

/// A single upload attempt: the file plus its destination hints.
///
/// Requests are immutable once built and are moved into the uploader, so
/// each one is consumed exactly once.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    file: MediaFile,
    options: UploadOptions,
}

impl UploadRequest {
    pub fn new(file: MediaFile) -> Self {
        Self {
            file,
            options: UploadOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn file(&self) -> &MediaFile {
        &self.file
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    pub fn kind(&self) -> Option<MediaKind> {
        self.file.kind()
    }

    pub fn into_parts(self) -> (MediaFile, UploadOptions) {
        (self.file, self.options)
    }
}

/// What a provider hands back after a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Externally resolvable address of the asset.
    pub url: String,
    /// Provider-internal identifier, used for deletion and URL regeneration.
    pub public_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Provider-specific extras (media kind, storage zone, playback URLs).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl UploadResult {
    pub fn new(url: impl Into<String>, public_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            public_id: public_id.into(),
            width: None,
            height: None,
            format: None,
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_dimensions(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    #[must_use]
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Look up a metadata entry.
    pub fn metadata_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_exposes_file_and_options() {
        let file = MediaFile::new("cat.png", "image/png", b"png".to_vec());
        let request = UploadRequest::new(file).with_options(
            UploadOptions::default()
                .with_folder("pets")
                .with_tag("cat")
                .with_metadata("alt", "a cat")
                .with_source_path("Blog/cats.md"),
        );

        assert_eq!(request.file().name, "cat.png");
        assert_eq!(request.kind(), Some(MediaKind::Image));
        assert_eq!(request.options().folder.as_deref(), Some("pets"));
        assert_eq!(request.options().tags, vec!["cat".to_owned()]);
        assert_eq!(request.options().metadata["alt"], "a cat");

        let (file, options) = request.into_parts();
        assert_eq!(file.content_type, "image/png");
        assert_eq!(options.source_path.as_deref(), Some("Blog/cats.md"));
    }

    #[test]
    fn result_serialization_skips_empty_fields() {
        let result = UploadResult::new("https://cdn.example/a.png", "a");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["url"], "https://cdn.example/a.png");
        assert_eq!(json["public_id"], "a");
        assert!(json.get("width").is_none());
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn result_metadata_accumulates() {
        let result = UploadResult::new("u", "id")
            .with_dimensions(Some(640), Some(480))
            .with_format("png")
            .with_metadata("media_kind", "image")
            .with_metadata("storage_zone", "blog");

        assert_eq!(result.width, Some(640));
        assert_eq!(result.format.as_deref(), Some("png"));
        assert_eq!(result.metadata_value("storage_zone").unwrap(), "blog");
        assert!(result.metadata_value("missing").is_none());
    }
}
