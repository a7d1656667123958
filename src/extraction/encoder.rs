//! Image Encoder

use base64::Engine;

use super::types::ImagePayload;

impl ImagePayload {
    /// Encode raw image bytes for transport, keeping the declared media type
    pub fn encode(image_data: &[u8], media_type: &str) -> Self {
        Self {
            media_type: media_type.to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(image_data),
        }
    }

    /// Size of the original image in bytes
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        (self.data.len() / 4) * 3 - padding
    }
}
