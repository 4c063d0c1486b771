use crate::error::{RasterDecodeError, RasterEncodeError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, ImageEncoder, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// A complete, self-contained PNG encoding of one view's raster, stored as a
/// `data:` URL so it can be embedded directly in the chart document.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(String);

impl Snapshot {
    /// Encodes `raster`. The PNG settings are fixed, so identical pixels always
    /// produce identical bytes.
    pub fn encode(raster: &RgbaImage) -> Result<Self, RasterEncodeError> {
        let (width, height) = raster.dimensions();
        let mut png = Vec::new();
        PngEncoder::new_with_quality(&mut png, CompressionType::Default, FilterType::Adaptive)
            .write_image(raster.as_raw(), width, height, ColorType::Rgba8)?;
        let mut encoded = String::with_capacity(DATA_URL_PREFIX.len() + png.len() * 4 / 3 + 4);
        encoded.push_str(DATA_URL_PREFIX);
        STANDARD.encode_string(&png, &mut encoded);
        Ok(Self(encoded))
    }

    pub fn decode(&self) -> Result<RgbaImage, RasterDecodeError> {
        decode_str(&self.0)
    }

    /// Wraps stored text without validating it; decoding reports bad data.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn png_bytes(&self) -> Result<Vec<u8>, RasterDecodeError> {
        let payload = self.0.strip_prefix(DATA_URL_PREFIX).unwrap_or(&self.0);
        STANDARD
            .decode(payload.trim())
            .map_err(|err| RasterDecodeError::new(format!("invalid base64 payload: {err}")))
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("encoded_len", &self.0.len())
            .finish()
    }
}

fn decode_str(value: &str) -> Result<RgbaImage, RasterDecodeError> {
    if value.starts_with("data:") && !value.starts_with(DATA_URL_PREFIX) {
        return Err(RasterDecodeError::new("unsupported data URL media type"));
    }
    let bytes = Snapshot::from_stored(value).png_bytes()?;
    let image = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .map_err(|err| RasterDecodeError::new(err.to_string()))?;
    Ok(image.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::model::{Color, Point};
    use crate::diagram::render::{draw_disc, draw_trigger_mark};
    use image::Rgba;

    fn sample_raster() -> RgbaImage {
        let mut raster = RgbaImage::from_pixel(48, 32, Rgba([250, 250, 250, 255]));
        draw_disc(&mut raster, Point::new(12.0, 12.0), 5.0, Color::RED);
        draw_trigger_mark(&mut raster, Point::new(30.0, 18.0), 10.0, Color::BLUE);
        raster
    }

    #[test]
    fn encode_is_stable_for_identical_pixels() {
        let raster = sample_raster();
        assert_eq!(
            Snapshot::encode(&raster).unwrap(),
            Snapshot::encode(&raster.clone()).unwrap()
        );
    }

    #[test]
    fn decode_then_encode_is_byte_identical() {
        let first = Snapshot::encode(&sample_raster()).unwrap();
        let restored = first.decode().unwrap();
        assert_eq!(restored, sample_raster());
        let second = Snapshot::encode(&restored).unwrap();
        assert_eq!(first.as_str(), second.as_str());
    }

    #[test]
    fn snapshot_is_a_png_data_url() {
        let snapshot = Snapshot::encode(&sample_raster()).unwrap();
        assert!(snapshot.as_str().starts_with(DATA_URL_PREFIX));
        let png = snapshot.png_bytes().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn bare_base64_payload_is_accepted() {
        let snapshot = Snapshot::encode(&sample_raster()).unwrap();
        let bare = snapshot.as_str().trim_start_matches(DATA_URL_PREFIX);
        assert_eq!(
            Snapshot::from_stored(bare).decode().unwrap(),
            sample_raster()
        );
    }

    #[test]
    fn corrupt_payloads_report_decode_errors() {
        assert!(Snapshot::from_stored("data:image/png;base64,@@@").decode().is_err());
        assert!(Snapshot::from_stored("data:image/jpeg;base64,AAAA").decode().is_err());
        let not_png = STANDARD.encode(b"definitely not a png");
        assert!(Snapshot::from_stored(format!("{DATA_URL_PREFIX}{not_png}"))
            .decode()
            .is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let snapshot = Snapshot::from_stored("data:image/png;base64,AAAA");
        assert_eq!(
            serde_json::to_string(&snapshot).unwrap(),
            "\"data:image/png;base64,AAAA\""
        );
    }
}
