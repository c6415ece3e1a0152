use crate::diagnostics::Diagnostics;
use crate::error::FetchError;
use crate::model::{Attachment, RevisionEntry};
use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};
use std::io::{Cursor, Write};

/// Resource name the cover pages draw the logo under.
pub const LOGO_RESOURCE: &str = "Logo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    Dct,
    Flate,
}

impl ImageFilter {
    pub fn as_pdf_name(self) -> &'static str {
        match self {
            ImageFilter::Dct => "/DCTDecode",
            ImageFilter::Flate => "/FlateDecode",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlphaMask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// An image ready for embedding: JPEG bytes as-is, anything else as
/// deflated RGB with an optional deflated alpha channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub color_space: &'static str,
    pub filter: ImageFilter,
    pub data: Vec<u8>,
    pub alpha: Option<AlphaMask>,
}

impl ImageAsset {
    pub fn decode(name: impl Into<String>, bytes: &[u8]) -> Result<Self, FetchError> {
        let format = image::guess_format(bytes).ok();
        let decoded = image::load_from_memory(bytes)
            .map_err(|err| FetchError::Undecodable(err.to_string()))?;
        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(FetchError::Undecodable("image has no pixels".to_string()));
        }
        if format == Some(ImageFormat::Jpeg) {
            let color_space = match decoded.color() {
                image::ColorType::L8 | image::ColorType::La8 => "/DeviceGray",
                _ => "/DeviceRGB",
            };
            return Ok(Self {
                name: name.into(),
                width,
                height,
                color_space,
                filter: ImageFilter::Dct,
                data: bytes.to_vec(),
                alpha: None,
            });
        }
        Ok(Self::from_rgba(name, &decoded.to_rgba8()))
    }

    pub fn from_rgba(name: impl Into<String>, rgba: &RgbaImage) -> Self {
        let (width, height) = rgba.dimensions();
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        let mut has_alpha = false;
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            has_alpha |= a != 255;
            rgb.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }
        Self {
            name: name.into(),
            width,
            height,
            color_space: "/DeviceRGB",
            filter: ImageFilter::Flate,
            data: flate_compress(&rgb),
            alpha: has_alpha.then(|| AlphaMask {
                width,
                height,
                data: flate_compress(&alpha),
            }),
        }
    }

    /// Width over height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

pub(crate) fn flate_compress(data: &[u8]) -> Vec<u8> {
    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let _ = encoder.write_all(data);
    encoder.finish().unwrap_or_default()
}

/// Round badge used when an organisation has no usable logo of its own.
pub fn default_logo_image() -> RgbaImage {
    const SIZE: u32 = 96;
    let center = (SIZE as f32 - 1.0) / 2.0;
    let radius = SIZE as f32 / 2.0 - 2.0;
    RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance > radius + 1.0 {
            return Rgba([0, 0, 0, 0]);
        }
        let edge = ((radius + 1.0 - distance).clamp(0.0, 1.0) * 255.0) as u8;
        // Flame: a triangle narrowing towards the top of the badge.
        let rel_y = (y as f32 - SIZE as f32 * 0.2) / (SIZE as f32 * 0.6);
        let half_width = rel_y * SIZE as f32 * 0.22;
        if (0.0..=1.0).contains(&rel_y) && dx.abs() <= half_width {
            Rgba([246, 166, 35, edge])
        } else {
            Rgba([28, 51, 92, edge])
        }
    })
}

/// PNG encoding of [`default_logo_image`], as a bundled asset would be read.
pub fn default_logo_png() -> Result<Vec<u8>, FetchError> {
    let mut out = Cursor::new(Vec::new());
    default_logo_image()
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|err| FetchError::Undecodable(err.to_string()))?;
    Ok(out.into_inner())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoResolution {
    Organisation,
    BuiltInDefault,
    TextOnly,
}

/// Outcome of the fetch stage. `None` lists mean "use the records supplied
/// inline with the input".
#[derive(Debug, Clone)]
pub struct ResolvedAssets {
    pub logo: Option<ImageAsset>,
    pub logo_resolution: LogoResolution,
    pub attachments: Option<Vec<Attachment>>,
    pub revisions: Option<Vec<RevisionEntry>>,
    pub diagnostics: Diagnostics,
}

impl Default for ResolvedAssets {
    fn default() -> Self {
        Self::text_only()
    }
}

impl ResolvedAssets {
    pub fn text_only() -> Self {
        Self {
            logo: None,
            logo_resolution: LogoResolution::TextOnly,
            attachments: None,
            revisions: None,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_logo(logo: ImageAsset, resolution: LogoResolution) -> Self {
        Self {
            logo: Some(logo),
            logo_resolution: resolution,
            ..Self::text_only()
        }
    }

    /// Built-in badge, no network involved.
    pub fn with_default_logo() -> Self {
        let logo = ImageAsset::from_rgba(LOGO_RESOURCE, &default_logo_image());
        Self::with_logo(logo, LogoResolution::BuiltInDefault)
    }

    pub fn images(&self) -> Vec<&ImageAsset> {
        self.logo.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_with_alpha_gets_a_soft_mask() {
        let png = default_logo_png().expect("encode");
        let asset = ImageAsset::decode(LOGO_RESOURCE, &png).expect("decode");
        assert_eq!(asset.filter, ImageFilter::Flate);
        assert_eq!((asset.width, asset.height), (96, 96));
        assert!(asset.alpha.is_some());
        assert!((asset.aspect() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn jpeg_passes_through_unchanged() {
        let rgb = image::RgbImage::from_pixel(8, 4, image::Rgb([200, 10, 10]));
        let mut jpeg = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(rgb)
            .write_to(&mut jpeg, ImageFormat::Jpeg)
            .expect("encode jpeg");
        let bytes = jpeg.into_inner();
        let asset = ImageAsset::decode("photo", &bytes).expect("decode");
        assert_eq!(asset.filter, ImageFilter::Dct);
        assert_eq!(asset.data, bytes);
        assert!(asset.alpha.is_none());
    }

    #[test]
    fn garbage_is_undecodable() {
        let err = ImageAsset::decode("x", b"not an image").expect_err("garbage");
        assert!(matches!(err, FetchError::Undecodable(_)));
    }

    #[test]
    fn text_only_has_no_images() {
        assert!(ResolvedAssets::text_only().images().is_empty());
        assert_eq!(ResolvedAssets::with_default_logo().images().len(), 1);
    }
}
