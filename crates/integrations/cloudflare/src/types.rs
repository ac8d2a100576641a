use serde::Deserialize;

/// `result` of a Stream upload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamVideo {
    /// Video identifier.
    pub uid: Option<String>,

    /// Thumbnail image URL.
    pub thumbnail: Option<String>,

    /// Playback manifests, present once Stream has accepted the upload.
    pub playback: Option<Playback>,

    /// Dimensions of the source file. `-1` until processing finishes.
    pub input: Option<StreamInput>,

    #[serde(default)]
    pub ready_to_stream: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Playback {
    pub hls: Option<String>,
    pub dash: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamInput {
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl StreamInput {
    /// Width and height, with Stream's `-1` placeholder mapped to `None`.
    pub fn dimensions(&self) -> (Option<u32>, Option<u32>) {
        let known = |v: Option<i64>| v.and_then(|v| u32::try_from(v).ok()).filter(|v| *v > 0);
        (known(self.width), known(self.height))
    }
}
