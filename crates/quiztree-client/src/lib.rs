//! quiztree-client: Persistence and upload backends.
//!
//! Implements `TestRepository` and `FileUploader` against the LMS web API and
//! the local filesystem, and selects between them from configuration.

pub mod config;
pub mod error;
pub mod fs;
pub mod http;
pub mod mock;

pub use config::{create_repository, create_uploader, load_config, QuiztreeConfig};
pub use error::ClientError;
pub use fs::{FileTestRepository, LocalUploader};
pub use http::{HttpTestRepository, HttpUploader};
pub use mock::MockRepository;
