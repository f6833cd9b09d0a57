pub mod core;
pub mod error;
pub mod fs_paths;
pub mod models;
pub mod platforms;

pub use error::{DownloadError, ErrorDetail, ErrorKind};
pub use platforms::traits::{Capabilities, Capability, PlatformDownloader};
pub use platforms::Platform;
