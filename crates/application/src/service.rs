use std::sync::Arc;

use pixatools_domain::{
    center_crop, fit_height, DataUrl, EncodedImage, HistoryEntry, NewHistoryEntry, OutputFormat,
    Quality, QuotaPolicy, QuotaStatus, TransformSpec, LOSSLESS_QUALITY, MAX_PASSPORT_DPI,
};

use crate::{
    ApplicationError, ClearHistoryCommand, Clock, CompressCommand, ConvertCommand, CropCommand,
    EnhanceCommand, FallbackPolicy, FindHistoryQuery, HistoryLedger, ImageEditGateway,
    ListHistoryQuery, PassportCanvas, PassportCommand, RasterEngine, RateGate,
    RemoveBackgroundCommand, ResizeCommand, SourceImage, StateStore, UsageQuery,
};

pub const REMOVE_BACKGROUND_INSTRUCTION: &str = "Remove the background of this image. Keep only the main person/subject and make the background completely transparent. Return the result as a PNG image.";
pub const ENHANCE_INSTRUCTION: &str = "Enhance this photo: improve brightness, sharpness, and color balance subtly. Professional studio quality look.";
pub const REMOTE_FAILURE_MESSAGE: &str = "AI service could not process the image, try again later";

const UNKNOWN_MIME: &str = "application/octet-stream";
const PASSPORT_QUALITY: f32 = 0.95;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    Transformed(EncodedImage),
    /// The raster step failed and the caller asked for the original back.
    Unchanged(EncodedImage),
}

impl TransformOutcome {
    pub fn image(&self) -> &EncodedImage {
        match self {
            Self::Transformed(image) | Self::Unchanged(image) => image,
        }
    }

    pub fn into_image(self) -> EncodedImage {
        match self {
            Self::Transformed(image) | Self::Unchanged(image) => image,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged(_))
    }
}

#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub image: EncodedImage,
    pub data_url: String,
    pub entry: HistoryEntry,
    pub degraded: bool,
}

pub struct ApplicationService {
    gate: RateGate,
    ledger: HistoryLedger,
    raster: Box<dyn RasterEngine>,
    gateway: Box<dyn ImageEditGateway>,
}

impl ApplicationService {
    pub fn new(
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        raster: Box<dyn RasterEngine>,
        gateway: Box<dyn ImageEditGateway>,
        policy: QuotaPolicy,
    ) -> Self {
        Self {
            gate: RateGate::new(store.clone(), clock.clone(), policy),
            ledger: HistoryLedger::new(store, clock),
            raster,
            gateway,
        }
    }

    pub fn remove_background(
        &self,
        command: RemoveBackgroundCommand,
    ) -> Result<ToolOutput, ApplicationError> {
        let source = load_source(&command.source)?;
        let cutout = self.call_gateway(&source, REMOVE_BACKGROUND_INSTRUCTION)?;
        self.record(cutout, "Cutout", false)
    }

    pub fn enhance(&self, command: EnhanceCommand) -> Result<ToolOutput, ApplicationError> {
        let source = load_source(&command.source)?;
        let enhanced = self.call_gateway(&source, ENHANCE_INSTRUCTION)?;
        self.record(enhanced, "Enhanced Photo", false)
    }

    pub fn passport(&self, command: PassportCommand) -> Result<ToolOutput, ApplicationError> {
        if command.dpi == 0 || command.dpi > MAX_PASSPORT_DPI {
            return Err(ApplicationError::InvalidInput(format!(
                "dpi must be between 1 and {MAX_PASSPORT_DPI}, got {}",
                command.dpi
            )));
        }
        let source = load_source(&command.source)?;
        let cutout = if command.remove_background {
            self.call_gateway(&source, REMOVE_BACKGROUND_INSTRUCTION)?
        } else {
            source
        };

        let (width, height) = command.size.pixel_dimensions(command.dpi);
        let canvas = PassportCanvas {
            width,
            height,
            background: command.background,
            format: OutputFormat::Jpeg,
            quality: Quality::new(PASSPORT_QUALITY)?,
        };
        let composed = self.raster.compose_passport(&cutout.bytes, &canvas)?;
        tracing::info!(size = command.size.name, width, height, "passport composed");
        self.record(composed, "Passport Photo", false)
    }

    pub fn resize(&self, command: ResizeCommand) -> Result<ToolOutput, ApplicationError> {
        if command.width == 0 || command.height == Some(0) {
            return Err(ApplicationError::InvalidInput(
                "width and height must be at least 1".to_string(),
            ));
        }
        let source = load_source(&command.source)?;
        let outcome = self.with_fallback(&source, command.fallback, || {
            let height = match command.height {
                Some(height) => height,
                None => {
                    let info = self.raster.probe(&source.bytes)?;
                    fit_height(info.width, info.height, command.width)
                }
            };
            let spec = TransformSpec::new(command.width, height)?;
            self.raster.transform(&source.bytes, &spec)
        })?;
        self.record_outcome(outcome, "Resized Image")
    }

    pub fn compress(&self, command: CompressCommand) -> Result<ToolOutput, ApplicationError> {
        let source = load_source(&command.source)?;
        let outcome = self.with_fallback(&source, command.fallback, || {
            let info = self.raster.probe(&source.bytes)?;
            let spec = TransformSpec::with_encoding(
                info.width,
                info.height,
                OutputFormat::Jpeg,
                command.quality,
            )?;
            self.raster.transform(&source.bytes, &spec)
        })?;
        self.record_outcome(outcome, "Compressed Image")
    }

    pub fn convert(&self, command: ConvertCommand) -> Result<ToolOutput, ApplicationError> {
        let source = load_source(&command.source)?;
        let outcome = self.with_fallback(&source, command.fallback, || {
            let info = self.raster.probe(&source.bytes)?;
            let spec = TransformSpec::with_encoding(
                info.width,
                info.height,
                command.format,
                Quality::new(LOSSLESS_QUALITY)?,
            )?;
            self.raster.transform(&source.bytes, &spec)
        })?;
        self.record_outcome(outcome, &command.source.name)
    }

    pub fn crop(&self, command: CropCommand) -> Result<ToolOutput, ApplicationError> {
        let source = load_source(&command.source)?;
        let outcome = self.with_fallback(&source, command.fallback, || {
            let info = self.raster.probe(&source.bytes)?;
            let rect = center_crop(info.width, info.height, command.ratio);
            self.raster
                .crop(&source.bytes, rect, OutputFormat::Jpeg, Quality::default())
        })?;
        self.record_outcome(outcome, "Cropped Image")
    }

    /// Plain resample/encode with a caller-chosen failure policy. Does not
    /// touch the history.
    pub fn transform(
        &self,
        source: &EncodedImage,
        spec: &TransformSpec,
        fallback: FallbackPolicy,
    ) -> Result<TransformOutcome, ApplicationError> {
        self.with_fallback(source, fallback, || self.raster.transform(&source.bytes, spec))
    }

    pub fn list_history(
        &self,
        _query: ListHistoryQuery,
    ) -> Result<Vec<HistoryEntry>, ApplicationError> {
        self.ledger.list()
    }

    pub fn find_history(&self, query: FindHistoryQuery) -> Result<HistoryEntry, ApplicationError> {
        self.ledger
            .find(&query.id)?
            .ok_or_else(|| ApplicationError::NotFound(format!("history entry id={}", query.id)))
    }

    pub fn clear_history(&self, _command: ClearHistoryCommand) -> Result<(), ApplicationError> {
        self.ledger.clear()
    }

    pub fn usage(&self, _query: UsageQuery) -> Result<QuotaStatus, ApplicationError> {
        self.gate.status()
    }

    /// Quota is spent before the remote call, so a failed call still costs a
    /// unit. A gateway that is not ready is refused before the gate.
    fn call_gateway(
        &self,
        source: &EncodedImage,
        instruction: &str,
    ) -> Result<EncodedImage, ApplicationError> {
        self.gateway.ensure_ready()?;
        if !self.gate.try_consume()? {
            return Err(ApplicationError::QuotaExceeded {
                limit: self.gate.policy().limit,
            });
        }

        let remote = self
            .gateway
            .edit(&source.bytes, &source.mime_type, instruction)
            .map_err(|error| {
                tracing::warn!(%error, "image edit gateway failed");
                ApplicationError::RemoteProcessing(REMOTE_FAILURE_MESSAGE.to_string())
            })?;
        tracing::debug!(remote_mime = %remote.mime_type, bytes = remote.bytes.len(), "gateway returned image");
        Ok(EncodedImage::new(remote.bytes, OutputFormat::Png))
    }

    fn with_fallback(
        &self,
        source: &EncodedImage,
        fallback: FallbackPolicy,
        run: impl FnOnce() -> Result<EncodedImage, ApplicationError>,
    ) -> Result<TransformOutcome, ApplicationError> {
        match run() {
            Ok(image) => Ok(TransformOutcome::Transformed(image)),
            Err(error) if error.is_raster_failure() && fallback == FallbackPolicy::ReturnOriginal => {
                tracing::warn!(%error, "raster step failed, returning original image");
                Ok(TransformOutcome::Unchanged(source.clone()))
            }
            Err(error) => Err(error),
        }
    }

    fn record_outcome(
        &self,
        outcome: TransformOutcome,
        name: &str,
    ) -> Result<ToolOutput, ApplicationError> {
        let degraded = outcome.is_unchanged();
        self.record(outcome.into_image(), name, degraded)
    }

    fn record(
        &self,
        image: EncodedImage,
        name: &str,
        degraded: bool,
    ) -> Result<ToolOutput, ApplicationError> {
        let data_url = DataUrl::from_bytes(&image.mime_type, &image.bytes).to_string();
        let entry = self.ledger.append(NewHistoryEntry {
            data_url: data_url.clone(),
            name: name.to_string(),
            mime_type: image.mime_type.clone(),
        })?;
        Ok(ToolOutput {
            image,
            data_url,
            entry,
            degraded,
        })
    }
}

fn load_source(source: &SourceImage) -> Result<EncodedImage, ApplicationError> {
    let url = DataUrl::parse(&source.data_url)?;
    let bytes = url.decode()?;
    if bytes.is_empty() {
        return Err(ApplicationError::InvalidInput(format!(
            "image {} is empty",
            source.name
        )));
    }
    Ok(EncodedImage {
        bytes,
        mime_type: url.mime_type().unwrap_or(UNKNOWN_MIME).to_string(),
    })
}
