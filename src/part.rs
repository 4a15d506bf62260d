//! File and binary attachments for multipart uploads.

use crate::{Param, Result};
use bytes::Bytes;
use reqwest::multipart;
use reqwest::Body;
use std::path::Path;

/// The data carried by an [`AttachmentPart`].
#[derive(Debug)]
pub enum PartContent {
    /// In-memory data with a known length.
    Bytes(Bytes),
    /// An opened stream, read once while the request is transmitted.
    Stream(Body),
}

/// A named attachment sent as one section of a `multipart/form-data` body.
///
/// Part names are not required to be unique.
///
/// # Examples
///
/// ```
/// use deviantart::AttachmentPart;
///
/// let part = AttachmentPart::from_value("file", "hello world").with_filename("hello.txt");
/// assert_eq!(part.name(), "file");
/// assert_eq!(part.filename(), Some("hello.txt"));
/// ```
#[derive(Debug)]
pub struct AttachmentPart {
    name: String,
    content: PartContent,
    filename: Option<String>,
}

impl AttachmentPart {
    /// Creates a part from an already opened stream.
    pub fn new(name: impl Into<String>, stream: impl Into<Body>) -> Self {
        Self {
            name: name.into(),
            content: PartContent::Stream(stream.into()),
            filename: None,
        }
    }

    /// Creates a part from a raw value, wrapping it in an in-memory buffer.
    pub fn from_value(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: PartContent::Bytes(content.into()),
            filename: None,
        }
    }

    /// Creates a text part from the wire form of a scalar parameter.
    ///
    /// Lists, maps and `Null` have no single wire value and produce an empty part.
    pub fn from_param(name: impl Into<String>, value: &Param) -> Self {
        Self::from_value(name, value.as_wire().unwrap_or_default())
    }

    /// Opens a file and attaches it as a stream, using its file name as `filename`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be opened.
    pub async fn from_file(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;

        let part = Self::new(name, file);
        Ok(match path.file_name().and_then(|n| n.to_str()) {
            Some(filename) => part.with_filename(filename),
            None => part,
        })
    }

    /// Sets the display filename.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Returns the form field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display filename, if set.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Returns the part content.
    pub fn content(&self) -> &PartContent {
        &self.content
    }

    /// Converts this attachment into a named multipart section.
    ///
    /// The `filename` attribute is only emitted for a non-empty filename.
    pub fn into_form_part(self) -> (String, multipart::Part) {
        let part = match self.content {
            PartContent::Bytes(bytes) => {
                let length = bytes.len() as u64;
                multipart::Part::stream_with_length(bytes, length)
            }
            PartContent::Stream(body) => multipart::Part::stream(body),
        };

        let part = match self.filename {
            Some(filename) if !filename.is_empty() => part.file_name(filename),
            _ => part,
        };

        (self.name, part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value_wraps_raw_content() {
        let part = AttachmentPart::from_value("aaa", "content");
        assert_eq!(part.name(), "aaa");
        assert_eq!(part.filename(), None);
        match part.content() {
            PartContent::Bytes(bytes) => assert_eq!(bytes.as_ref(), b"content"),
            other => panic!("Expected bytes, got {:?}", other),
        }
    }

    #[test]
    fn test_from_param_uses_wire_text() {
        let part = AttachmentPart::from_param("is_dirty", &Param::Bool(true));
        match part.content() {
            PartContent::Bytes(bytes) => assert_eq!(bytes.as_ref(), b"1"),
            other => panic!("Expected bytes, got {:?}", other),
        }
    }

    #[test]
    fn test_with_filename() {
        let part = AttachmentPart::new("aaa", "stream").with_filename("bbb");
        assert_eq!(part.filename(), Some("bbb"));
        assert!(matches!(part.content(), PartContent::Stream(_)));
    }

    #[tokio::test]
    async fn test_from_file_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.png");
        std::fs::write(&path, b"png bytes").unwrap();

        let part = AttachmentPart::from_file("image", &path).await.unwrap();
        assert_eq!(part.name(), "image");
        assert_eq!(part.filename(), Some("upload.png"));
    }

    #[tokio::test]
    async fn test_from_file_missing() {
        let result = AttachmentPart::from_file("image", "/nonexistent/upload.png").await;
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
