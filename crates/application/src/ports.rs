use pixatools_domain::{CropRect, EncodedImage, ImageInfo, OutputFormat, Quality, Rgb, TransformSpec};

use crate::ApplicationError;

/// What an update closure wants done with the key it was handed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    Put(String),
    Keep,
}

pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ApplicationError>;

    /// Reads `key`, hands the value to `apply` and writes its answer back as a
    /// single atomic step. No other `update` or `remove` on the same store can
    /// interleave between the read and the write.
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<StoreWrite, ApplicationError>,
    ) -> Result<(), ApplicationError>;

    /// Deletes `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> Result<(), ApplicationError>;
}

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassportCanvas {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub format: OutputFormat,
    pub quality: Quality,
}

pub trait RasterEngine: Send + Sync {
    fn probe(&self, image: &[u8]) -> Result<ImageInfo, ApplicationError>;

    /// Resamples to exactly `spec.width x spec.height` and re-encodes.
    fn transform(
        &self,
        image: &[u8],
        spec: &TransformSpec,
    ) -> Result<EncodedImage, ApplicationError>;

    fn crop(
        &self,
        image: &[u8],
        rect: CropRect,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<EncodedImage, ApplicationError>;

    fn compose_passport(
        &self,
        cutout: &[u8],
        canvas: &PassportCanvas,
    ) -> Result<EncodedImage, ApplicationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

pub trait ImageEditGateway: Send + Sync {
    /// Local checks that can fail without a network round trip.
    fn ensure_ready(&self) -> Result<(), ApplicationError> {
        Ok(())
    }

    fn edit(
        &self,
        image: &[u8],
        mime_type: &str,
        instruction: &str,
    ) -> Result<RemoteImage, ApplicationError>;
}
