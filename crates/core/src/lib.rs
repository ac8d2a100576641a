pub mod error;
pub mod media;
pub mod path;
pub mod provider_kind;
pub mod upload;

pub use error::{ErrorKind, StructuredError};
pub use media::{MediaFile, MediaKind, VIDEO_ID_PREFIX};
pub use path::{is_within_folder, normalize_path};
pub use provider_kind::{ProviderKind, UnsupportedProvider};
pub use upload::{UploadOptions, UploadRequest, UploadResult};
