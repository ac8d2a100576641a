pub mod classify;
pub mod error;
pub mod live;
pub mod uploader;

pub use classify::{ErrorClassifier, ReportHook};
pub use error::UploadError;
pub use live::LiveConfig;
pub use uploader::{DynUploader, Uploader};
