// Vision translation logic
// Author: kelexine (https://github.com/kelexine)

use super::models::{validate_payload_size, MediaType};
use crate::error::Result;
use crate::models::gemini::InlineData;
use base64::Engine;

/// Encode raw document bytes as Gemini InlineData
pub fn encode_inline_data(bytes: &[u8], media_type: MediaType) -> Result<InlineData> {
    validate_payload_size(bytes.len())?;

    // Gemini expects plain base64 (no "data:image/png;base64," prefix)
    Ok(InlineData {
        mime_type: media_type.mime_type().to_string(),
        data: base64::engine::general_purpose::STANDARD.encode(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;

    #[test]
    fn test_encode_png() {
        // 8-byte PNG signature is enough for the encoder
        let png = b"\x89PNG\r\n\x1a\n";
        let inline_data = encode_inline_data(png, MediaType::Png).unwrap();
        assert_eq!(inline_data.mime_type, "image/png");
        assert_eq!(inline_data.data, "iVBORw0KGgo=");
    }

    #[test]
    fn test_empty_payload_rejected() {
        let result = encode_inline_data(&[], MediaType::Pdf);
        assert!(matches!(result, Err(ExtractError::InvalidInput(_))));
    }
}
