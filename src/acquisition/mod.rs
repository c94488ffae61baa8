//! Image acquisition: turns picked, dropped or captured images into
//! prefix-free base64 payloads and hands them to whoever asked for one.

#[cfg_attr(not(feature = "v4l-camera"), allow(dead_code))]
pub mod camera;
#[cfg(feature = "v4l-camera")]
pub mod v4l_source;

use std::path::Path;

use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use tokio::sync::mpsc;
use tracing::debug;

use crate::llm::media::detect_mime_type;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub fn accepts_content_type(content_type: &str) -> bool {
    content_type.trim().to_ascii_lowercase().starts_with("image/")
}

pub fn encode_data_uri(bytes: &[u8], content_type: &str) -> String {
    format!(
        "data:{};base64,{}",
        content_type.trim(),
        general_purpose::STANDARD.encode(bytes)
    )
}

/// Base64 image text without any `data:...;base64,` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage(String);

impl EncodedImage {
    /// Drops everything up to and including the first comma. Text without a
    /// comma is taken as already bare.
    pub fn from_data_uri(value: &str) -> Self {
        let bare = match value.split_once(',') {
            Some((_, rest)) => rest,
            None => value,
        };
        EncodedImage(bare.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// Reads a local file. Paths carry no declared type, so it is sniffed
    /// from the bytes.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let content_type =
            detect_mime_type(&bytes).unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());
        Ok(Self::new(bytes, content_type))
    }

    pub fn is_image(&self) -> bool {
        accepts_content_type(&self.content_type)
    }

    /// `None` for anything that is not `image/*`.
    pub fn accept(self) -> Option<EncodedImage> {
        if !self.is_image() {
            debug!("Ignoring payload with content type '{}'", self.content_type);
            return None;
        }
        let data_uri = encode_data_uri(&self.bytes, &self.content_type);
        Some(EncodedImage::from_data_uri(&data_uri))
    }
}

/// Delivers each accepted image as one channel message.
#[derive(Debug, Clone)]
pub struct ImageSelector {
    sender: mpsc::Sender<EncodedImage>,
}

impl ImageSelector {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EncodedImage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Returns whether the image was handed off. Rejected payloads are
    /// dropped without error.
    pub async fn select(&self, payload: ImagePayload) -> bool {
        let Some(encoded) = payload.accept() else {
            return false;
        };
        self.deliver(encoded).await
    }

    pub async fn select_file(&self, path: &Path) -> Result<bool> {
        let payload = ImagePayload::from_file(path).await?;
        Ok(self.select(payload).await)
    }

    pub async fn deliver(&self, encoded: EncodedImage) -> bool {
        if self.sender.send(encoded).await.is_err() {
            debug!("Image receiver dropped before delivery");
            return false;
        }
        true
    }
}
