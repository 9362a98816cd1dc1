//! Document storage for member file uploads

pub mod drive;

pub use drive::{DriveClient, UploadedFile};
