use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Prefix marking a public id that refers to a video asset.
///
/// Providers that keep images and videos in separate namespaces tag video ids
/// with this prefix so URL derivation and deletion can route without a
/// network call.
pub const VIDEO_ID_PREFIX: &str = "video:";

/// The kind of media carried by a [`MediaFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a declared content type. Returns `None` for anything that is
    /// neither `image/*` nor `video/*`.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let content_type = content_type.trim().to_ascii_lowercase();
        if content_type.starts_with("image/") {
            Some(Self::Image)
        } else if content_type.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }

    /// Returns the lowercase name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Encode a provider id so that its media kind survives a round trip
    /// through [`MediaKind::split_public_id`].
    pub fn tag_public_id(self, id: &str) -> String {
        match self {
            Self::Image => id.to_owned(),
            Self::Video => format!("{VIDEO_ID_PREFIX}{id}"),
        }
    }

    /// Split a public id produced by [`MediaKind::tag_public_id`] back into
    /// its kind and the raw provider id.
    pub fn split_public_id(public_id: &str) -> (Self, &str) {
        match public_id.strip_prefix(VIDEO_ID_PREFIX) {
            Some(id) => (Self::Video, id),
            None => (Self::Image, public_id),
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pasted or dropped file: raw bytes plus the declared content type and
/// original file name.
#[derive(Clone)]
pub struct MediaFile {
    /// Original file name, e.g. `"screenshot.png"`.
    pub name: String,
    /// Declared MIME type, e.g. `"image/png"`.
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}

impl std::fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

impl MediaFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// The media kind, or `None` when the declared type is not media.
    pub fn kind(&self) -> Option<MediaKind> {
        MediaKind::from_content_type(&self.content_type)
    }

    /// Whether the declared type begins with `image/` or `video/`.
    pub fn is_media(&self) -> bool {
        self.kind().is_some()
    }

    pub fn is_video(&self) -> bool {
        self.kind() == Some(MediaKind::Video)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
