use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
use pixatools_application::{ApplicationError, PassportCanvas, RasterEngine};
use pixatools_domain::{
    passport_placement, surface_fits, CropRect, EncodedImage, ImageInfo, OutputFormat, Quality,
    TransformSpec,
};

const RESAMPLE_FILTER: FilterType = FilterType::Triangle;
const BORDER_ALPHA: f32 = 0.05;

/// CPU raster engine built on the `image` crate.
#[derive(Debug, Default)]
pub struct ImageCrateRaster;

impl RasterEngine for ImageCrateRaster {
    fn probe(&self, image: &[u8]) -> Result<ImageInfo, ApplicationError> {
        let reader = reader_for(image)?;
        let format = reader.format().and_then(output_format);
        let (width, height) = reader
            .into_dimensions()
            .map_err(|error| ApplicationError::Decode(error.to_string()))?;
        Ok(ImageInfo {
            width,
            height,
            format,
        })
    }

    fn transform(
        &self,
        image: &[u8],
        spec: &TransformSpec,
    ) -> Result<EncodedImage, ApplicationError> {
        ensure_surface(spec.width, spec.height)?;
        let decoded = decode(image)?;
        let resized = decoded.resize_exact(spec.width, spec.height, RESAMPLE_FILTER);
        let encoded = encode(&resized, spec.format, spec.quality)?;
        tracing::debug!(
            from_width = decoded.width(),
            from_height = decoded.height(),
            width = spec.width,
            height = spec.height,
            format = %spec.format,
            bytes = encoded.bytes.len(),
            "raster transform"
        );
        Ok(encoded)
    }

    fn crop(
        &self,
        image: &[u8],
        rect: CropRect,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<EncodedImage, ApplicationError> {
        if rect.width == 0 || rect.height == 0 {
            return Err(ApplicationError::InvalidInput(
                "crop rectangle must not be empty".to_string(),
            ));
        }
        let decoded = decode(image)?;
        let cropped = decoded.crop_imm(rect.x, rect.y, rect.width, rect.height);
        encode(&cropped, format, quality)
    }

    fn compose_passport(
        &self,
        cutout: &[u8],
        canvas: &PassportCanvas,
    ) -> Result<EncodedImage, ApplicationError> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(ApplicationError::InvalidInput(
                "passport canvas must not be empty".to_string(),
            ));
        }
        ensure_surface(canvas.width, canvas.height)?;
        let subject = decode(cutout)?;
        let placement =
            passport_placement(canvas.width, canvas.height, subject.width(), subject.height());
        ensure_surface(placement.width, placement.height)?;

        let [red, green, blue] = canvas.background.0;
        let mut surface =
            RgbaImage::from_pixel(canvas.width, canvas.height, Rgba([red, green, blue, 255]));
        let scaled = subject
            .resize_exact(placement.width, placement.height, RESAMPLE_FILTER)
            .to_rgba8();
        imageops::overlay(&mut surface, &scaled, placement.x, placement.y);
        stroke_border(&mut surface);

        encode(
            &DynamicImage::ImageRgba8(surface),
            canvas.format,
            canvas.quality,
        )
    }
}

/// Refuses surfaces past the pixel budget before anything is allocated.
fn ensure_surface(width: u32, height: u32) -> Result<(), ApplicationError> {
    if surface_fits(width, height) {
        Ok(())
    } else {
        Err(ApplicationError::Encode(format!(
            "cannot allocate {width}x{height} surface"
        )))
    }
}

fn reader_for(image: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, ApplicationError> {
    ImageReader::new(Cursor::new(image))
        .with_guessed_format()
        .map_err(|error| ApplicationError::Decode(error.to_string()))
}

fn decode(image: &[u8]) -> Result<DynamicImage, ApplicationError> {
    reader_for(image)?
        .decode()
        .map_err(|error| ApplicationError::Decode(error.to_string()))
}

/// Quality only reaches the JPEG encoder; PNG and WebP are written lossless.
/// JPEG has no alpha channel, so it is dropped before encoding.
fn encode(
    image: &DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<EncodedImage, ApplicationError> {
    let mut bytes = Vec::new();
    let result = match format {
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality.percent())),
        OutputFormat::Png => image.write_with_encoder(PngEncoder::new(&mut bytes)),
        OutputFormat::Webp => DynamicImage::ImageRgba8(image.to_rgba8())
            .write_with_encoder(WebPEncoder::new_lossless(&mut bytes)),
    };
    result.map_err(|error| ApplicationError::Encode(error.to_string()))?;
    Ok(EncodedImage::new(bytes, format))
}

fn output_format(format: ImageFormat) -> Option<OutputFormat> {
    match format {
        ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
        ImageFormat::Png => Some(OutputFormat::Png),
        ImageFormat::WebP => Some(OutputFormat::Webp),
        _ => None,
    }
}

/// Faint one-pixel frame around the passport canvas.
fn stroke_border(surface: &mut RgbaImage) {
    let (width, height) = surface.dimensions();
    for (x, y, pixel) in surface.enumerate_pixels_mut() {
        if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
            for channel in pixel.0.iter_mut().take(3) {
                *channel = (f32::from(*channel) * (1.0 - BORDER_ALPHA)).round() as u8;
            }
        }
    }
}
