//! Image payload encoding
//!
//! The capture device already hands us compressed bytes; encoding is a
//! lossless pass-through plus MIME detection and base64 for transport.

use base64::Engine;

/// A transport-ready encoded image
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Detected MIME type
    pub mime_type: &'static str,
    /// The original compressed bytes, unmodified
    pub data: Vec<u8>,
}

impl ImagePayload {
    /// Wrap captured bytes, sniffing the MIME type from magic numbers
    #[must_use]
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            mime_type: sniff_mime_type(&data),
            data,
        }
    }

    /// Base64-encode the payload for inline transport
    #[must_use]
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// Detect an image MIME type from leading magic bytes
///
/// Unknown formats default to JPEG, which is what cameras produce.
fn sniff_mime_type(data: &[u8]) -> &'static str {
    if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if data.starts_with(b"GIF8") {
        "image/gif"
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}
