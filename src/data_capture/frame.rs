//! Decoded video frames.

use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::RgbImage;

use crate::error_handling::types::DecodeError;

/// One decoded RGB frame.
#[derive(Clone, Debug)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn from_rgb(image: RgbImage) -> Self {
        Self { image }
    }

    /// Decodes an encoded image (JPEG or PNG).
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| DecodeError::Image(e.to_string()))?;
        Ok(Self {
            image: decoded.to_rgb8(),
        })
    }

    /// Decodes a base64 image payload. A `data:<mime>;base64,` prefix is accepted.
    pub fn decode_base64(payload: &str) -> Result<Self, DecodeError> {
        let payload = payload.trim();
        let payload = match payload.strip_prefix("data:") {
            Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
            None => payload,
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| DecodeError::Base64(e.to_string()))?;
        Self::decode(&bytes)
    }

    /// Resizes to the recording resolution; a no-op when already there.
    pub fn normalized(self, width: u32, height: u32) -> Self {
        if self.image.dimensions() == (width, height) {
            return self;
        }
        Self {
            image: image::imageops::resize(&self.image, width, height, FilterType::Triangle),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>, image::ImageError> {
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&self.image)?;
        Ok(buf)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn decodes_base64_jpeg() {
        let frame = Frame::decode_base64(&solid_base64(64, 48, 120)).unwrap();
        assert_eq!(frame.dimensions(), (64, 48));
    }

    #[test]
    fn accepts_data_url_prefix() {
        let payload = format!("data:image/jpeg;base64,{}", solid_base64(8, 8, 10));
        assert!(Frame::decode_base64(&payload).is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            Frame::decode_base64("@@not base64@@"),
            Err(DecodeError::Base64(_))
        ));
        let not_an_image = base64::engine::general_purpose::STANDARD.encode(b"hello");
        assert!(matches!(
            Frame::decode_base64(&not_an_image),
            Err(DecodeError::Image(_))
        ));
    }

    #[test]
    fn normalizes_to_fixed_resolution() {
        let frame = solid(64, 48, 0).normalized(32, 18);
        assert_eq!(frame.dimensions(), (32, 18));
    }
}
