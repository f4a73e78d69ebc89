//! Request preparation: payload encoding and request construction.

use base64::Engine;
use std::path::Path;

/// File content encoded as standard base64 (no line breaks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage(String);

impl EncodedImage {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The service always receives the payload labelled as JPEG.
    pub fn data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationRequest {
    pub prompt: String,
    pub image: EncodedImage,
    pub temperature: f32,
}

/// Reads the whole file and encodes it for transport.
pub async fn encode_file(path: &Path) -> std::io::Result<EncodedImage> {
    let bytes = tokio::fs::read(path).await?;
    Ok(EncodedImage::from_bytes(&bytes))
}

pub fn build_request(prompt: &str, image: EncodedImage, temperature: f32) -> ClassificationRequest {
    ClassificationRequest {
        prompt: prompt.to_string(),
        image,
        temperature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_padding() {
        assert_eq!(EncodedImage::from_bytes(b"").as_str(), "");
        assert_eq!(EncodedImage::from_bytes(b"f").as_str(), "Zg==");
        assert_eq!(EncodedImage::from_bytes(b"fo").as_str(), "Zm8=");
        assert_eq!(EncodedImage::from_bytes(b"foo").as_str(), "Zm9v");
    }

    #[test]
    fn data_url_uses_jpeg_label() {
        let image = EncodedImage::from_bytes(b"foo");
        assert_eq!(image.data_url(), "data:image/jpeg;base64,Zm9v");
    }

    #[tokio::test]
    async fn encode_file_reads_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"foobar").unwrap();
        let image = encode_file(&path).await.unwrap();
        assert_eq!(image.as_str(), "Zm9vYmFy");
    }

    #[tokio::test]
    async fn encode_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = encode_file(&dir.path().join("missing.png")).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn build_request_keeps_fields() {
        let req = build_request("Does the image contain a cat?", EncodedImage::from_bytes(b"x"), 0.0);
        assert_eq!(req.prompt, "Does the image contain a cat?");
        assert_eq!(req.image.as_str(), "eA==");
        assert_eq!(req.temperature, 0.0);
    }
}
