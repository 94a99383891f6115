//! Best-effort image encoding for request payloads.
//!
//! Backends accept images as base64 strings. Callers may hand us raw bytes, a
//! path to a local file, or a string that is already base64 (or an external
//! identifier); all three come out as a string suitable for the wire.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

/// An image input: raw bytes, or text that may name a local file.
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Raw image bytes.
    Bytes(Vec<u8>),
    /// A path candidate or an already-encoded payload.
    Text(String),
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> Self {
        ImageInput::Bytes(bytes)
    }
}

impl From<&[u8]> for ImageInput {
    fn from(bytes: &[u8]) -> Self {
        ImageInput::Bytes(bytes.to_vec())
    }
}

impl From<String> for ImageInput {
    fn from(text: String) -> Self {
        ImageInput::Text(text)
    }
}

impl From<&str> for ImageInput {
    fn from(text: &str) -> Self {
        ImageInput::Text(text.to_string())
    }
}

/// Encode an image input as a base64 string.
///
/// Raw bytes are encoded directly. Text is probed as a local file path: if it
/// names a readable file, the file's contents are encoded; otherwise (missing
/// path, unreadable file, any I/O failure) the text is returned unchanged on
/// the assumption it is already an encoded payload or a remote identifier.
/// This function never fails.
pub async fn encode_image(input: impl Into<ImageInput>) -> String {
    match input.into() {
        ImageInput::Bytes(bytes) => STANDARD.encode(bytes),
        ImageInput::Text(text) => {
            if file_exists(Path::new(&text)).await {
                match tokio::fs::read(&text).await {
                    Ok(bytes) => STANDARD.encode(bytes),
                    Err(_) => text,
                }
            } else {
                text
            }
        }
    }
}

/// Probe whether a path names an existing regular file.
///
/// Probe failures (permissions, dangling links) classify as "does not exist".
pub(crate) async fn file_exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_encode_raw_bytes() {
        let encoded = encode_image(b"hello".as_slice()).await;
        assert_eq!(encoded, "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_encode_existing_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();
        file.flush().unwrap();

        let encoded = encode_image(file.path().to_str().unwrap()).await;
        assert_eq!(encoded, "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_non_path_string_unchanged() {
        let payload = "aGVsbG8=";
        let encoded = encode_image(payload).await;
        assert_eq!(encoded, payload);
    }

    #[tokio::test]
    async fn test_missing_path_unchanged() {
        let missing = "/nonexistent/image.png";
        let encoded = encode_image(missing).await;
        assert_eq!(encoded, missing);
    }

    #[tokio::test]
    async fn test_directory_is_not_a_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let text = dir.path().to_str().unwrap().to_string();
        let encoded = encode_image(text.clone()).await;
        assert_eq!(encoded, text);
    }
}
