//! Content-addressed file storage for candidate photos.
use std::fmt::{Debug, Display};

use async_trait::async_trait;

use crate::ContentId;

/// A file picked by the user, held in memory until it is uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct PhotoFile {
    /// Original file name, used as the upload's display name.
    pub file_name: String,
    /// MIME type, if known.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl PhotoFile {
    /// Creates a file with an unknown content type.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    /// Sets the MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl Debug for PhotoFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Uploads files and resolves their content addresses to fetchable URLs.
#[async_trait]
pub trait ContentStorage: Send + Sync + 'static {
    /// The error type for fallible methods.
    type Error: Debug + Display + Send + Sync;

    /// Pins `file` and returns its content address.
    async fn upload(&self, file: &PhotoFile) -> Result<ContentId, Self::Error>;

    /// Resolves a content address to a URL the file can be fetched from.
    async fn resolve_url(&self, cid: &ContentId) -> Result<String, Self::Error>;
}
