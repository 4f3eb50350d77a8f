pub mod download;
pub mod types;
pub mod walker;

pub use download::{download_file, parse_last_modified};
pub use types::{DownloadOutcome, MirrorStats};
pub use walker::{local_child, Mirror};
